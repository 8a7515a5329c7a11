//! Shared types for the shop check-in kiosk

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Newtype wrapper for user (card) identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Newtype wrapper for physical slot indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Slot(pub usize);

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of hardware event delivered to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CardSwipe,
    CardInsert,
    CardRemove,
    SwitchFlipOn,
    SwitchFlipOff,
    ButtonConfirm,
    ButtonCancel,
    ButtonMoney,
    ButtonChangePod,
    ButtonDischarge,
    Terminate,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::CardSwipe,
        EventKind::CardInsert,
        EventKind::CardRemove,
        EventKind::SwitchFlipOn,
        EventKind::SwitchFlipOff,
        EventKind::ButtonConfirm,
        EventKind::ButtonCancel,
        EventKind::ButtonMoney,
        EventKind::ButtonChangePod,
        EventKind::ButtonDischarge,
        EventKind::Terminate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CardSwipe => "card_swipe",
            EventKind::CardInsert => "card_insert",
            EventKind::CardRemove => "card_remove",
            EventKind::SwitchFlipOn => "switch_flip_on",
            EventKind::SwitchFlipOff => "switch_flip_off",
            EventKind::ButtonConfirm => "button_confirm",
            EventKind::ButtonCancel => "button_cancel",
            EventKind::ButtonMoney => "button_money",
            EventKind::ButtonChangePod => "button_change_pod",
            EventKind::ButtonDischarge => "button_discharge",
            EventKind::Terminate => "terminate",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventPayload {
    #[default]
    None,
    User(UserId),
    Slot(Slot),
}

impl EventPayload {
    pub fn slot(&self) -> Option<Slot> {
        match self {
            EventPayload::Slot(slot) => Some(*slot),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            EventPayload::User(id) => Some(id),
            _ => None,
        }
    }
}

/// A single hardware event, consumed exactly once by the controller loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub payload: EventPayload,
}

impl Event {
    #[inline]
    pub fn new(kind: EventKind) -> Self {
        Self { kind, payload: EventPayload::None }
    }

    pub fn card_swipe(id: impl Into<String>) -> Self {
        Self { kind: EventKind::CardSwipe, payload: EventPayload::User(UserId::new(id)) }
    }

    pub fn card_insert(slot: usize) -> Self {
        Self { kind: EventKind::CardInsert, payload: EventPayload::Slot(Slot(slot)) }
    }

    pub fn card_remove(slot: usize) -> Self {
        Self { kind: EventKind::CardRemove, payload: EventPayload::Slot(Slot(slot)) }
    }

    pub fn terminate() -> Self {
        Self::new(EventKind::Terminate)
    }
}

/// Failure to parse a panel protocol line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEventError {
    #[error("empty line")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("invalid slot: {0}")]
    InvalidSlot(String),
}

impl FromStr for Event {
    type Err = ParseEventError;

    /// Parse one line of the panel protocol, e.g. `SWIPE 1234`, `INSERT 3`,
    /// `SWITCH ON`, `BUTTON CONFIRM`, `TERMINATE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts.next().ok_or(ParseEventError::Empty)?.to_ascii_uppercase();
        let arg = parts.next();

        let parse_slot = |name: &'static str| -> Result<usize, ParseEventError> {
            let raw = arg.ok_or(ParseEventError::MissingArgument(name))?;
            raw.parse::<usize>().map_err(|_| ParseEventError::InvalidSlot(raw.to_string()))
        };

        Ok(match command.as_str() {
            "SWIPE" => Event::card_swipe(arg.ok_or(ParseEventError::MissingArgument("SWIPE"))?),
            "INSERT" => Event::card_insert(parse_slot("INSERT")?),
            "REMOVE" => Event::card_remove(parse_slot("REMOVE")?),
            "SWITCH" => match arg.map(str::to_ascii_uppercase).as_deref() {
                Some("ON") => Event::new(EventKind::SwitchFlipOn),
                Some("OFF") => Event::new(EventKind::SwitchFlipOff),
                Some(other) => return Err(ParseEventError::UnknownCommand(format!("SWITCH {other}"))),
                None => return Err(ParseEventError::MissingArgument("SWITCH")),
            },
            "BUTTON" => match arg.map(str::to_ascii_uppercase).as_deref() {
                Some("CONFIRM") => Event::new(EventKind::ButtonConfirm),
                Some("CANCEL") => Event::new(EventKind::ButtonCancel),
                Some("MONEY") => Event::new(EventKind::ButtonMoney),
                Some("POD") => Event::new(EventKind::ButtonChangePod),
                Some("DISCHARGE") => Event::new(EventKind::ButtonDischarge),
                Some(other) => return Err(ParseEventError::UnknownCommand(format!("BUTTON {other}"))),
                None => return Err(ParseEventError::MissingArgument("BUTTON")),
            },
            "TERMINATE" => Event::terminate(),
            _ => return Err(ParseEventError::UnknownCommand(command)),
        })
    }
}
