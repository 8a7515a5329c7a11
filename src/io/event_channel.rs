//! Shared event queue between hardware adapters and the controller
//!
//! Adapters hold `EventSender` clones; the controller owns the single
//! `EventQueue`. The queue keeps only a weak handle to its own channel for
//! re-posting a terminate event, so it still observes the channel closing
//! once every adapter is gone. A re-post that finds the channel full is held
//! in the queue itself and handed out before the next channel read; the
//! consumer never waits on its own channel.

use crate::domain::types::Event;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendError, TrySendError};
use tracing::{debug, warn};

/// Producer side of the event queue
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Enqueue an event, waiting for room. Hardware events are never dropped.
    pub async fn send(&self, event: Event) -> Result<(), SendError<Event>> {
        self.tx.send(event).await
    }
}

/// Consumer side of the event queue, owned by the state machine
pub struct EventQueue {
    rx: mpsc::Receiver<Event>,
    repost_tx: mpsc::WeakSender<Event>,
    pending: Option<Event>,
    closed: bool,
}

impl EventQueue {
    /// Block until the next event arrives. Returns `None` once every producer is gone.
    pub async fn next(&mut self) -> Option<Event> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        let event = self.rx.recv().await;
        if event.is_none() {
            self.closed = true;
        }
        event
    }

    /// Put an event back at the tail of the queue.
    ///
    /// When producers already hold every free permit the event is kept aside
    /// and returned by the next `next()` call instead.
    pub fn repost(&mut self, event: Event) {
        let Some(tx) = self.repost_tx.upgrade() else {
            warn!(kind = %event.kind, "event_repost_failed: queue closed");
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(kind = %event.kind, "event_repost_deferred: queue full");
                self.pending = Some(event);
            }
            Err(TrySendError::Closed(event)) => {
                warn!(kind = %event.kind, "event_repost_failed: queue closed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Create the event queue and its first producer handle
pub fn create_event_channel(capacity: usize) -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    let repost_tx = tx.downgrade();
    (EventSender { tx }, EventQueue { rx, repost_tx, pending: None, closed: false })
}
