//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument
//! (default: config/shop.toml). Every section and key is optional.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    /// Number of physical card slots on the board
    #[serde(default = "default_slots")]
    pub slots: usize,
    /// Amount added to each occupant's debt when charged (cents)
    #[serde(default = "default_debt_increment_cents")]
    pub debt_increment_cents: u64,
    /// How long a passed safety test stays valid
    #[serde(default = "default_certification_valid_days")]
    pub certification_valid_days: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            debt_increment_cents: default_debt_increment_cents(),
            certification_valid_days: default_certification_valid_days(),
        }
    }
}

fn default_slots() -> usize {
    30
}

fn default_debt_increment_cents() -> u64 {
    500
}

fn default_certification_valid_days() -> u64 {
    365
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Characters per display line
    #[serde(default = "default_display_width")]
    pub width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { width: default_display_width() }
    }
}

fn default_display_width() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Command used to play a sound file (file path is appended)
    #[serde(default = "default_audio_player")]
    pub player: String,
    /// Directory holding the cue sound files
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true, player: default_audio_player(), sounds_dir: default_sounds_dir() }
    }
}

fn default_true() -> bool {
    true
}

fn default_audio_player() -> String {
    "aplay".to_string()
}

fn default_sounds_dir() -> String {
    "resources/sounds".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    /// Enable the TCP listener for the switch/button/slot bridge
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_panel_port")]
    pub listener_port: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { enabled: true, listener_port: default_panel_port() }
    }
}

fn default_panel_port() -> u16 {
    7070
}

#[derive(Debug, Clone, Deserialize)]
pub struct BadgeReaderConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_badge_device")]
    pub device: String,
    #[serde(default = "default_badge_baud")]
    pub baud: u32,
}

impl Default for BadgeReaderConfig {
    fn default() -> Self {
        Self { enabled: false, device: default_badge_device(), baud: default_badge_baud() }
    }
}

fn default_badge_device() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_badge_baud() -> u32 {
    9600
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// JSON file holding the user directory
    #[serde(default = "default_users_file")]
    pub file: String,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self { file: default_users_file() }
    }
}

fn default_users_file() -> String {
    "users.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// JSONL outbox for departure notifications
    #[serde(default = "default_outbox_file")]
    pub outbox_file: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { outbox_file: default_outbox_file() }
    }
}

fn default_outbox_file() -> String {
    "departures.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueuesConfig {
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

fn default_outbound_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub badge_reader: BadgeReaderConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub queues: QueuesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    slots: usize,
    debt_increment_cents: u64,
    certification_valid_days: u64,
    display_width: usize,
    audio_enabled: bool,
    audio_player: String,
    sounds_dir: String,
    panel_enabled: bool,
    panel_port: u16,
    badge_reader_enabled: bool,
    badge_reader_device: String,
    badge_reader_baud: u32,
    users_file: String,
    outbox_file: String,
    event_capacity: usize,
    outbound_capacity: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            slots: toml_config.shop.slots,
            debt_increment_cents: toml_config.shop.debt_increment_cents,
            certification_valid_days: toml_config.shop.certification_valid_days,
            display_width: toml_config.display.width,
            audio_enabled: toml_config.audio.enabled,
            audio_player: toml_config.audio.player,
            sounds_dir: toml_config.audio.sounds_dir,
            panel_enabled: toml_config.panel.enabled,
            panel_port: toml_config.panel.listener_port,
            badge_reader_enabled: toml_config.badge_reader.enabled,
            badge_reader_device: toml_config.badge_reader.device,
            badge_reader_baud: toml_config.badge_reader.baud,
            users_file: toml_config.users.file,
            outbox_file: toml_config.notifications.outbox_file,
            event_capacity: toml_config.queues.event_capacity,
            outbound_capacity: toml_config.queues.outbound_capacity,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        anyhow::ensure!(toml_config.shop.slots > 0, "shop.slots must be at least 1");
        anyhow::ensure!(toml_config.display.width > 0, "display.width must be at least 1");
        anyhow::ensure!(
            toml_config.queues.event_capacity > 0,
            "queues.event_capacity must be at least 1"
        );
        anyhow::ensure!(
            toml_config.queues.outbound_capacity > 0,
            "queues.outbound_capacity must be at least 1"
        );
        anyhow::ensure!(
            toml_config.metrics.interval_secs > 0,
            "metrics.interval_secs must be at least 1"
        );

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn debt_increment_cents(&self) -> u64 {
        self.debt_increment_cents
    }

    pub fn certification_valid_days(&self) -> u64 {
        self.certification_valid_days
    }

    pub fn display_width(&self) -> usize {
        self.display_width
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn audio_player(&self) -> &str {
        &self.audio_player
    }

    pub fn sounds_dir(&self) -> &str {
        &self.sounds_dir
    }

    pub fn panel_enabled(&self) -> bool {
        self.panel_enabled
    }

    pub fn panel_port(&self) -> u16 {
        self.panel_port
    }

    pub fn badge_reader_enabled(&self) -> bool {
        self.badge_reader_enabled
    }

    pub fn badge_reader_device(&self) -> &str {
        &self.badge_reader_device
    }

    pub fn badge_reader_baud(&self) -> u32 {
        self.badge_reader_baud
    }

    pub fn users_file(&self) -> &str {
        &self.users_file
    }

    pub fn outbox_file(&self) -> &str {
        &self.outbox_file
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to set the slot count
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }
}
