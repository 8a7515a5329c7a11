//! Error recovery controller
//!
//! Shows a diagnostic for a failure, then arbitrates operator input until the
//! failure is resolved. Contradictory input (a card going into a different
//! slot than it came out of) escalates into a nested error; the nesting is an
//! explicit frame stack and every frame unwinds to the original return state.

mod actions;

use crate::domain::errors::{ErrorKind, ValidationFailure};
use crate::domain::shop::Shop;
use crate::domain::types::{EventKind, EventPayload, Slot};
use crate::io::event_channel::EventQueue;
use crate::io::outbound::OutboundSender;
use crate::services::state_machine::State;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

pub use actions::error_message;

/// Outcome of a recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    NotResolved,
    /// Operator input contradicts the current error; recover from this one first
    Escalate(ErrorKind, Option<Slot>),
}

/// Everything a recovery action may touch
pub struct RecoveryContext<'a> {
    pub events: &'a mut EventQueue,
    pub shop: &'a mut Shop,
    pub outbound: &'a OutboundSender,
}

pub(crate) type RecoveryAction = fn(&mut RecoveryContext<'_>, &EventPayload, Option<Slot>) -> Resolution;

/// One error being recovered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFrame {
    pub error: ErrorKind,
    pub data: Option<Slot>,
}

/// Stack of active errors; never empty while recovery is running
#[derive(Debug)]
struct ErrorContext {
    current: ErrorFrame,
    outer: Vec<ErrorFrame>,
}

impl ErrorContext {
    fn new(frame: ErrorFrame) -> Self {
        Self { current: frame, outer: Vec::new() }
    }

    fn depth(&self) -> usize {
        self.outer.len() + 1
    }

    fn push(&mut self, frame: ErrorFrame) {
        self.outer.push(std::mem::replace(&mut self.current, frame));
    }

    /// Drop the current frame. Returns false when it was the outermost.
    fn pop(&mut self) -> bool {
        match self.outer.pop() {
            Some(frame) => {
                self.current = frame;
                true
            }
            None => false,
        }
    }
}

/// State/error combinations that clear without operator input
#[derive(Debug, Clone, Copy)]
enum NoConfirmRule {
    AnyValidation(State),
    Exact(State, ValidationFailure),
}

impl NoConfirmRule {
    fn matches(&self, state: State, error: ErrorKind) -> bool {
        match (*self, error) {
            (NoConfirmRule::AnyValidation(s), ErrorKind::Validation(_)) => s == state,
            (NoConfirmRule::Exact(s, f), ErrorKind::Validation(failure)) => s == state && f == failure,
            _ => false,
        }
    }
}

pub struct ErrorRecoveryController {
    specific: FxHashMap<ErrorKind, FxHashMap<EventKind, RecoveryAction>>,
    defaults: FxHashMap<EventKind, RecoveryAction>,
    no_confirm: Vec<NoConfirmRule>,
}

impl Default for ErrorRecoveryController {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorRecoveryController {
    pub fn new() -> Self {
        Self {
            specific: actions::specific_table(),
            defaults: actions::default_table(),
            no_confirm: vec![
                NoConfirmRule::AnyValidation(State::Closed),
                NoConfirmRule::Exact(State::Standby, ValidationFailure::Unauthorized),
            ],
        }
    }

    pub fn requires_no_confirmation(&self, state: State, error: ErrorKind) -> bool {
        self.no_confirm.iter().any(|rule| rule.matches(state, error))
    }

    /// Error-specific action, then the default table, then "stay in error"
    fn action_for(&self, error: ErrorKind, kind: EventKind) -> RecoveryAction {
        self.specific
            .get(&error)
            .and_then(|table| table.get(&kind))
            .or_else(|| self.defaults.get(&kind))
            .copied()
            .unwrap_or(actions::unrecognized)
    }

    /// Recover from `error`, returning the state the controller should resume in
    ///
    /// Blocks on the event queue until the error (and anything it escalated
    /// into) is resolved. A terminate event is re-posted once and unwinds
    /// every frame; a closed queue unwinds without re-posting.
    pub async fn handle_error(
        &self,
        cx: &mut RecoveryContext<'_>,
        return_state: State,
        error: ErrorKind,
        data: Option<Slot>,
    ) -> State {
        let mut context = ErrorContext::new(ErrorFrame { error, data });

        loop {
            let frame = context.current;
            cx.outbound.show(error_message(frame.error, frame.data));

            if context.depth() == 1 && self.requires_no_confirmation(return_state, frame.error) {
                debug!(state = %return_state, error = %frame.error, "error_auto_cleared");
                return return_state;
            }

            let Some(event) = cx.events.next().await else {
                warn!(state = %return_state, depth = %context.depth(), "event_channel_closed_in_recovery");
                return return_state;
            };

            if event.kind == EventKind::Terminate {
                info!(state = %return_state, depth = %context.depth(), "terminate_in_recovery");
                cx.events.repost(event);
                return return_state;
            }

            let action = self.action_for(frame.error, event.kind);
            match action(cx, &event.payload, frame.data) {
                Resolution::Resolved => {
                    if !context.pop() {
                        info!(state = %return_state, error = %frame.error, "error_resolved");
                        return return_state;
                    }
                    debug!(error = %frame.error, depth = %context.depth(), "nested_error_resolved");
                }
                Resolution::NotResolved => {
                    debug!(error = %frame.error, event = %event.kind, "error_not_resolved");
                }
                Resolution::Escalate(error, data) => {
                    info!(from = %frame.error, to = %error, "error_escalated");
                    context.push(ErrorFrame { error, data });
                }
            }
        }
    }
}
