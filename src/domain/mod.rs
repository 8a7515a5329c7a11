//! Domain models - core business types for the shop kiosk
//!
//! This module contains the canonical data types used throughout the system:
//! - `Event` / `EventKind` - hardware events from the badge reader and panel
//! - `ShopUser` - a user record with derived capabilities
//! - `Shop` - the slot occupancy ledger and pod set
//! - `ValidationFailure` / `ErrorKind` - failures routed to error recovery

pub mod errors;
pub mod shop;
pub mod types;
pub mod user;

pub use errors::{ErrorKind, Failure, ValidationFailure};
pub use shop::Shop;
pub use types::{Event, EventKind, EventPayload, Slot, UserId};
pub use user::ShopUser;
