//! Failure taxonomy raised by state handlers and consumed by error recovery

use crate::domain::types::{EventKind, Slot};
use thiserror::Error;

/// Business-rule violation raised by a state handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ValidationFailure {
    #[error("user does not exist")]
    NonexistentUser,
    #[error("user record is not valid")]
    InvalidUser,
    #[error("user owes money")]
    MoneyOwed,
    #[error("user is not a proctor")]
    NonProctor,
    #[error("user is not a pod")]
    NonPod,
    #[error("safety test is out of date")]
    OutOfDateTest,
    #[error("shop requires at least one pod")]
    PodRequired,
    #[error("user is not authorized")]
    Unauthorized,
    #[error("shop is occupied")]
    ShopOccupied,
    #[error("shop is already open")]
    ShopAlreadyOpen,
}

impl ValidationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFailure::NonexistentUser => "nonexistent_user",
            ValidationFailure::InvalidUser => "invalid_user",
            ValidationFailure::MoneyOwed => "money_owed",
            ValidationFailure::NonProctor => "non_proctor",
            ValidationFailure::NonPod => "non_pod",
            ValidationFailure::OutOfDateTest => "out_of_date_test",
            ValidationFailure::PodRequired => "pod_required",
            ValidationFailure::Unauthorized => "unauthorized",
            ValidationFailure::ShopOccupied => "shop_occupied",
            ValidationFailure::ShopAlreadyOpen => "shop_already_open",
        }
    }
}

/// Error being recovered from: either a validation failure or an event
/// that has no handler in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation(ValidationFailure),
    Unrecognized(EventKind),
}

impl ErrorKind {
    pub fn is_validation(&self) -> bool {
        matches!(self, ErrorKind::Validation(_))
    }
}

impl From<ValidationFailure> for ErrorKind {
    fn from(failure: ValidationFailure) -> Self {
        ErrorKind::Validation(failure)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation(failure) => f.write_str(failure.as_str()),
            ErrorKind::Unrecognized(kind) => write!(f, "unrecognized_{}", kind.as_str()),
        }
    }
}

/// A handler failure routed to error recovery, with the slot it concerns (if any)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub failure: ValidationFailure,
    pub slot: Option<Slot>,
}

impl From<ValidationFailure> for Failure {
    fn from(failure: ValidationFailure) -> Self {
        Self { failure, slot: None }
    }
}
