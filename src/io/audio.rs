//! Audible feedback worker
//!
//! Maps cues to sound files and plays each one with the configured player
//! command. Playback runs detached so a slow or missing player never
//! holds up the next cue; at most `MAX_PLAYBACKS` players run at once.

use crate::infra::config::Config;
use crate::io::outbound::Cue;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// Concurrent player processes
pub const MAX_PLAYBACKS: usize = 2;

/// Sound file for a cue, relative to the sounds directory
pub fn cue_file(cue: Cue) -> &'static str {
    match cue {
        Cue::Opening => "thx.wav",
        Cue::Closing => "shutdown.wav",
        Cue::Success => "success_ding.wav",
        Cue::Error => "error_buzz.wav",
        Cue::ClearingDebt => "cha_ching.wav",
        Cue::ChargingUser => "sad_trombone.wav",
    }
}

pub struct AudioWorker {
    enabled: bool,
    player: String,
    sounds_dir: PathBuf,
    playback: Arc<Semaphore>,
    cue_rx: mpsc::Receiver<Cue>,
}

impl AudioWorker {
    pub fn new(config: &Config, cue_rx: mpsc::Receiver<Cue>) -> Self {
        Self {
            enabled: config.audio_enabled(),
            player: config.audio_player().to_string(),
            sounds_dir: PathBuf::from(config.sounds_dir()),
            playback: Arc::new(Semaphore::new(MAX_PLAYBACKS)),
            cue_rx,
        }
    }

    pub fn sound_path(&self, cue: Cue) -> PathBuf {
        self.sounds_dir.join(cue_file(cue))
    }

    /// Run the worker until the channel closes
    pub async fn run(mut self) {
        info!(enabled = %self.enabled, player = %self.player, "audio_worker_started");

        while let Some(cue) = self.cue_rx.recv().await {
            if !self.enabled {
                debug!(cue = %cue.as_str(), "audio_cue_muted");
                continue;
            }
            // Cues back up in the channel while every player slot is busy
            let Ok(permit) = self.playback.clone().acquire_owned().await else {
                break;
            };
            let path = self.sound_path(cue);
            let player = self.player.clone();
            tokio::spawn(async move {
                play_file(&player, &path, cue).await;
                drop(permit);
            });
        }

        info!("audio_worker_stopped");
    }
}

async fn play_file(player: &str, path: &Path, cue: Cue) {
    let mut parts = player.split_whitespace();
    let Some(program) = parts.next() else {
        warn!("audio_player_not_configured");
        return;
    };

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!(cue = %cue.as_str(), "audio_cue_played"),
        Ok(status) => warn!(cue = %cue.as_str(), status = %status, "audio_cue_failed"),
        Err(e) => warn!(cue = %cue.as_str(), error = %e, "audio_player_spawn_failed"),
    }
}
