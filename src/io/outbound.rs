//! Typed channels for outbound feedback
//!
//! Provides a non-blocking way for the controller to reach the display,
//! the speaker, and the departure notifier. Uses bounded mpsc channels to
//! prevent unbounded memory growth; a full channel drops the message.

use crate::domain::user::ShopUser;
use crate::infra::metrics::Metrics;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Audible feedback cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Opening,
    Closing,
    Success,
    Error,
    ClearingDebt,
    ChargingUser,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Opening => "opening",
            Cue::Closing => "closing",
            Cue::Success => "success",
            Cue::Error => "error",
            Cue::ClearingDebt => "clearing_debt",
            Cue::ChargingUser => "charging_user",
        }
    }
}

/// Users who left the shop without re-inserting their card
#[derive(Debug, Clone)]
pub struct Departure {
    pub users: Vec<ShopUser>,
}

/// Sender half handed to the controller
#[derive(Clone)]
pub struct OutboundSender {
    display_tx: mpsc::Sender<String>,
    audio_tx: mpsc::Sender<Cue>,
    departure_tx: mpsc::Sender<Departure>,
    metrics: Arc<Metrics>,
}

/// Receiver halves consumed by the workers
pub struct OutboundReceivers {
    pub display_rx: mpsc::Receiver<String>,
    pub audio_rx: mpsc::Receiver<Cue>,
    pub departure_rx: mpsc::Receiver<Departure>,
}

impl OutboundSender {
    /// Show a raw message (lines separated by `\n`) on the display
    pub fn show(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(message = %message.replace('\n', " | "), "display_message");
        self.try_send(&self.display_tx, message, "display");
    }

    /// Play an audible cue
    pub fn play(&self, cue: Cue) {
        self.try_send(&self.audio_tx, cue, "audio");
    }

    /// Notify users that they were signed out of the shop
    pub fn notify_departure(&self, users: Vec<ShopUser>) {
        if users.is_empty() {
            return;
        }
        self.try_send(&self.departure_tx, Departure { users }, "departure");
    }

    fn try_send<T>(&self, tx: &mpsc::Sender<T>, item: T, channel: &'static str) {
        match tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.metrics.record_outbound_dropped();
                warn!(channel = %channel, "outbound_dropped: channel full");
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_outbound_dropped();
                warn!(channel = %channel, "outbound_dropped: channel closed");
            }
        }
    }
}

/// Create the outbound channels
///
/// Returns the sender (for the controller) and the receivers (for the workers)
pub fn create_outbound_channels(
    capacity: usize,
    metrics: Arc<Metrics>,
) -> (OutboundSender, OutboundReceivers) {
    let (display_tx, display_rx) = mpsc::channel(capacity);
    let (audio_tx, audio_rx) = mpsc::channel(capacity);
    let (departure_tx, departure_rx) = mpsc::channel(capacity);
    (
        OutboundSender { display_tx, audio_tx, departure_tx, metrics },
        OutboundReceivers { display_rx, audio_rx, departure_rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_reach_receivers() {
        let (tx, mut rx) = create_outbound_channels(4, Arc::new(Metrics::new()));
        tx.show("Hello\nWorld");
        tx.play(Cue::Success);
        tx.notify_departure(vec![ShopUser::new("1", "Ada")]);

        assert_eq!(rx.display_rx.try_recv().unwrap(), "Hello\nWorld");
        assert_eq!(rx.audio_rx.try_recv().unwrap(), Cue::Success);
        assert_eq!(rx.departure_rx.try_recv().unwrap().users.len(), 1);
    }

    #[test]
    fn test_empty_departure_is_skipped() {
        let (tx, mut rx) = create_outbound_channels(4, Arc::new(Metrics::new()));
        tx.notify_departure(Vec::new());
        assert!(rx.departure_rx.try_recv().is_err());
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let metrics = Arc::new(Metrics::new());
        let (tx, _rx) = create_outbound_channels(1, metrics.clone());
        tx.play(Cue::Success);
        tx.play(Cue::Error);
        assert_eq!(metrics.outbound_dropped(), 1);
    }
}
