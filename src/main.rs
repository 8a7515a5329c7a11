//! Shop check-in kiosk
//!
//! Drives the badge reader, panel switch/buttons/slots, two-line display and
//! speaker of a makerspace check-in board.
//!
//! Module structure:
//! - `domain/` - Core business types (Event, ShopUser, Shop, failures)
//! - `io/` - External interfaces (panel, badge reader, display, audio, notifier, user directory)
//! - `services/` - Business logic (StateMachine, ErrorRecoveryController)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use shop_check_in::domain::types::Event;
use shop_check_in::infra::{Config, Metrics};
use shop_check_in::io::audio::AudioWorker;
use shop_check_in::io::badge_reader::BadgeReader;
use shop_check_in::io::display::DisplayWorker;
use shop_check_in::io::notifier::Notifier;
use shop_check_in::io::{
    create_event_channel, create_outbound_channels, start_panel_listener, JsonUserDirectory,
    OutboundReceivers, PanelListenerConfig, UserDirectory,
};
use shop_check_in::services::StateMachine;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Shop check-in kiosk controller
#[derive(Parser, Debug)]
#[command(name = "shop-check-in", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/shop.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var.
    // Logs go to stderr; stdout carries the display frames.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "shop-check-in starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        slots = %config.slots(),
        display_width = %config.display_width(),
        panel_enabled = %config.panel_enabled(),
        panel_port = %config.panel_port(),
        badge_reader_enabled = %config.badge_reader_enabled(),
        badge_reader_device = %config.badge_reader_device(),
        users_file = %config.users_file(),
        outbox_file = %config.outbox_file(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());

    // An unreadable user file leaves the board usable for nobody, but running
    let directory: Arc<dyn UserDirectory> = match JsonUserDirectory::load(config.users_file()) {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            error!(error = %format!("{e:#}"), "user_directory_load_failed");
            Arc::new(JsonUserDirectory::in_memory(Vec::new()))
        }
    };

    // Create event queue (bounded; producers wait when full)
    let (event_tx, event_queue) = create_event_channel(config.event_capacity());

    // Create outbound channels and their workers
    let (outbound, receivers) = create_outbound_channels(config.outbound_capacity(), metrics.clone());
    let OutboundReceivers { display_rx, audio_rx, departure_rx } = receivers;

    let display = DisplayWorker::new(tokio::io::stdout(), config.display_width(), display_rx);
    tokio::spawn(async move {
        display.run().await;
    });

    let audio = AudioWorker::new(&config, audio_rx);
    tokio::spawn(audio.run());

    let notifier = Notifier::new(config.outbox_file());
    tokio::spawn(notifier.run(departure_rx));

    // Start panel TCP listener
    let panel_config = PanelListenerConfig {
        port: config.panel_port(),
        enabled: config.panel_enabled(),
        slot_count: config.slots(),
    };
    let panel_tx = event_tx.clone();
    let panel_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_panel_listener(panel_config, panel_tx, panel_shutdown).await {
            error!(error = %e, "panel_listener_failed");
        }
    });

    // Start badge reader
    if config.badge_reader_enabled() {
        let reader = BadgeReader::new(&config, event_tx.clone());
        let reader_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            reader.run(reader_shutdown).await;
        });
    } else {
        info!("badge_reader_disabled");
    }

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C: flag it, then wake the controller
    let signal_shutdown = shutdown_tx.clone();
    let signal_tx = event_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = signal_shutdown.send(true);
        let _ = signal_tx.send(Event::terminate()).await;
    });

    let mut machine = StateMachine::new(&config, event_queue, outbound, directory, metrics.clone());

    // A terminate event ends one run; the board restarts in the state it was left in
    loop {
        let state = machine.run().await;

        if *shutdown_rx.borrow() || machine.input_closed() {
            info!(state = %state, "state_machine_stopped");
            break;
        }

        metrics.record_restart();
        warn!(state = %state, "state_machine_restarting");
    }

    let _ = shutdown_tx.send(true);
    metrics.report().log();

    info!("shop-check-in shutdown complete");
    Ok(())
}
