//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `state_machine` - Single event consumer driving the kiosk workflows
//! - `recovery` - Error display and operator-driven recovery

pub mod recovery;
pub mod state_machine;

// Re-export commonly used types
pub use recovery::ErrorRecoveryController;
pub use state_machine::{State, StateMachine};
