//! Integration tests for configuration loading

use shop_check_in::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let config_content = r#"
[shop]
slots = 12
debt_increment_cents = 250
certification_valid_days = 730

[display]
width = 20

[audio]
enabled = false
player = "paplay --volume 40000"
sounds_dir = "/opt/kiosk/sounds"

[panel]
enabled = true
listener_port = 7171

[badge_reader]
enabled = true
device = "/dev/ttyACM0"
baud = 19200

[users]
file = "/var/lib/kiosk/users.json"

[notifications]
outbox_file = "/var/lib/kiosk/departures.jsonl"

[queues]
event_capacity = 32
outbound_capacity = 8

[metrics]
interval_secs = 15
"#;
    let temp_file = write_config(config_content);

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.slots(), 12);
    assert_eq!(config.debt_increment_cents(), 250);
    assert_eq!(config.certification_valid_days(), 730);
    assert_eq!(config.display_width(), 20);
    assert!(!config.audio_enabled());
    assert_eq!(config.audio_player(), "paplay --volume 40000");
    assert_eq!(config.sounds_dir(), "/opt/kiosk/sounds");
    assert_eq!(config.panel_port(), 7171);
    assert!(config.badge_reader_enabled());
    assert_eq!(config.badge_reader_device(), "/dev/ttyACM0");
    assert_eq!(config.badge_reader_baud(), 19200);
    assert_eq!(config.users_file(), "/var/lib/kiosk/users.json");
    assert_eq!(config.outbox_file(), "/var/lib/kiosk/departures.jsonl");
    assert_eq!(config.event_capacity(), 32);
    assert_eq!(config.outbound_capacity(), 8);
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_zero_slots_rejected() {
    let temp_file = write_config("[shop]\nslots = 0\n");
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("shop.slots"));
}

#[test]
fn test_zero_queue_capacities_rejected() {
    let temp_file = write_config("[queues]\nevent_capacity = 0\n");
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("queues.event_capacity"));

    let temp_file = write_config("[queues]\noutbound_capacity = 0\n");
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("queues.outbound_capacity"));
}

#[test]
fn test_zero_metrics_interval_rejected() {
    let temp_file = write_config("[metrics]\ninterval_secs = 0\n");
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("metrics.interval_secs"));
}

#[test]
fn test_with_slots_overrides_loaded_value() {
    let temp_file = write_config("[shop]\nslots = 12\n");
    let config = Config::from_file(temp_file.path()).unwrap().with_slots(3);
    assert_eq!(config.slots(), 3);
}

#[test]
fn test_malformed_file_rejected() {
    let temp_file = write_config("[shop\nslots = ");
    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.slots(), 30);
    assert_eq!(config.display_width(), 16);
    assert_eq!(config.panel_port(), 7070);
    assert!(!config.badge_reader_enabled());
    assert_eq!(config.config_file(), "default");
}
