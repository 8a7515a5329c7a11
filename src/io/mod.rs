//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `event_channel` - Shared event queue between adapters and the controller
//! - `outbound` - Typed channels for display text, audio cues, and departures
//! - `panel` - TCP listener for the switch/button/slot bridge
//! - `badge_reader` - Serial badge reader producing card swipes
//! - `display` - Message formatting and display output worker
//! - `audio` - Audible cue playback worker
//! - `notifier` - Departure notices written to an outbox file
//! - `user_directory` - User lookup and debt bookkeeping

pub mod audio;
pub mod badge_reader;
pub mod display;
pub mod event_channel;
pub mod notifier;
pub mod outbound;
pub mod panel;
pub mod user_directory;

// Re-export commonly used types
pub use event_channel::{create_event_channel, EventQueue, EventSender};
pub use outbound::{create_outbound_channels, Cue, OutboundReceivers, OutboundSender};
pub use panel::{start_panel_listener, PanelListenerConfig};
pub use user_directory::{JsonUserDirectory, UserDirectory};
