//! Panel TCP listener for the switch, buttons, and card slots
//!
//! The GPIO bridge connects and writes one command per line:
//! `SWIPE <id>`, `INSERT <slot>`, `REMOVE <slot>`, `SWITCH ON|OFF`,
//! `BUTTON CONFIRM|CANCEL|MONEY|POD|DISCHARGE`, `TERMINATE`.

use crate::domain::types::Event;
use crate::io::event_channel::EventSender;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Panel listener configuration
#[derive(Debug, Clone)]
pub struct PanelListenerConfig {
    pub port: u16,
    pub enabled: bool,
    /// Slot indices at or above this are rejected
    pub slot_count: usize,
}

/// Parse one panel line, rejecting slots the board doesn't have
pub fn parse_panel_line(line: &str, slot_count: usize) -> Option<Event> {
    let event = match line.parse::<Event>() {
        Ok(event) => event,
        Err(e) => {
            warn!(line = %line, error = %e, "panel_line_rejected");
            return None;
        }
    };

    if let Some(slot) = event.payload.slot() {
        if slot.0 >= slot_count {
            warn!(slot = %slot, slot_count = %slot_count, "panel_slot_out_of_range");
            return None;
        }
    }

    Some(event)
}

/// Start the panel TCP listener
pub async fn start_panel_listener(
    config: PanelListenerConfig,
    event_tx: EventSender,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !config.enabled {
        info!("panel_listener_disabled");
        return Ok(());
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(port = %config.port, "panel_listener_started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("panel_listener_shutdown");
                    return Ok(());
                }
            }
            result = listener.accept() => {
                match result {
                    Ok((socket, addr)) => {
                        let tx = event_tx.clone();
                        let slot_count = config.slot_count;
                        tokio::spawn(async move {
                            handle_panel_connection(socket, addr, tx, slot_count).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "panel_listener_accept_failed");
                    }
                }
            }
        }
    }
}

async fn handle_panel_connection(
    socket: tokio::net::TcpStream,
    addr: SocketAddr,
    event_tx: EventSender,
    slot_count: usize,
) {
    info!(peer = %addr, "panel_connected");

    let reader = BufReader::new(socket);
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(event) = parse_panel_line(line, slot_count) else {
            continue;
        };

        debug!(peer = %addr, kind = %event.kind, "panel_event");
        if event_tx.send(event).await.is_err() {
            warn!(peer = %addr, "panel_event_channel_closed");
            break;
        }
    }

    info!(peer = %addr, "panel_disconnected");
}
