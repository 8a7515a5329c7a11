//! Departure notifications - writes sign-out notices to an outbox file
//!
//! Notices are written in JSONL format (one JSON object per departing user)
//! to the file specified in config, where the mail relay picks them up.
//! Failures are logged and never reach the controller.

use crate::domain::user::ShopUser;
use crate::io::outbound::Departure;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// One outbox record
#[derive(Debug, Serialize)]
pub struct DepartureNotice {
    pub id: String,
    pub ts: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
}

impl DepartureNotice {
    pub fn for_user(user: &ShopUser) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            ts: chrono::Utc::now().to_rfc3339(),
            user_id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Outbox writer for departure notices
pub struct Notifier {
    file_path: String,
}

impl Notifier {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "notifier_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a notice for every departing user, returning how many were written
    pub fn notify(&self, departure: &Departure) -> usize {
        let mut written = 0;
        for user in &departure.users {
            let notice = DepartureNotice::for_user(user);
            let line = match serde_json::to_string(&notice) {
                Ok(line) => line,
                Err(e) => {
                    error!(user = %user.id, error = %e, "departure_notice_serialize_failed");
                    continue;
                }
            };
            match self.append_line(&line) {
                Ok(()) => {
                    info!(user = %user.id, notice = %notice.id, "departure_notified");
                    written += 1;
                }
                Err(e) => error!(user = %user.id, error = %e, "departure_notify_failed"),
            }
        }
        written
    }

    /// Append a line to the outbox file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "outbox_written");

        Ok(())
    }

    /// Run as a worker, writing notices until the channel closes
    pub async fn run(self, mut departure_rx: mpsc::Receiver<Departure>) {
        info!("notifier_worker_started");
        while let Some(departure) = departure_rx.recv().await {
            self.notify(&departure);
        }
        info!("notifier_worker_stopped");
    }
}
