//! Kiosk state machine and event orchestration
//!
//! The StateMachine is the single consumer of the event queue. It coordinates:
//! - Session state (the current named state plus workflow cargo)
//! - Per-state dispatch through the state table
//! - Shop occupancy and pod membership (through its handlers)
//! - Error recovery (unhandled events and validation failures)

mod handlers;
mod table;

use crate::domain::errors::ErrorKind;
use crate::domain::shop::Shop;
use crate::domain::types::{Event, EventKind, Slot};
use crate::domain::user::ShopUser;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::event_channel::EventQueue;
use crate::io::outbound::{Cue, OutboundSender};
use crate::io::user_directory::UserDirectory;
use crate::services::recovery::{ErrorRecoveryController, RecoveryContext};
use std::sync::Arc;
use table::StateTable;
use tracing::{debug, info, warn};

/// Operational states of the kiosk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Closed,
    Opening,
    Standby,
    Unlocked,
    AddingUser,
    AddingUsers,
    RemovingUser,
    ClearingDebt,
    ChangingPod,
}

impl State {
    pub const COUNT: usize = 9;

    pub const ALL: [State; State::COUNT] = [
        State::Closed,
        State::Opening,
        State::Standby,
        State::Unlocked,
        State::AddingUser,
        State::AddingUsers,
        State::RemovingUser,
        State::ClearingDebt,
        State::ChangingPod,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Opening => "opening",
            State::Standby => "standby",
            State::Unlocked => "unlocked",
            State::AddingUser => "adding_user",
            State::AddingUsers => "adding_users",
            State::RemovingUser => "removing_user",
            State::ClearingDebt => "clearing_debt",
            State::ChangingPod => "changing_pod",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried between consecutive handlers of one workflow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cargo {
    #[default]
    Empty,
    /// The proctor opening the shop, or the pod who unlocked the board
    User(ShopUser),
    /// Users waiting to be committed to a slot
    Users(Vec<ShopUser>),
    /// Slot a card was removed from
    Slot(Slot),
}

/// Event-driven controller for the shop board
pub struct StateMachine {
    pub(crate) state: State,
    pub(crate) cargo: Cargo,
    pub(crate) shop: Shop,
    table: StateTable,
    recovery: ErrorRecoveryController,
    pub(crate) events: EventQueue,
    pub(crate) outbound: OutboundSender,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) metrics: Arc<Metrics>,
    debt_increment_cents: u64,
    certification_valid_days: u64,
}

impl StateMachine {
    /// Create a closed, empty board
    pub fn new(
        config: &Config,
        events: EventQueue,
        outbound: OutboundSender,
        directory: Arc<dyn UserDirectory>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state: State::Closed,
            cargo: Cargo::Empty,
            shop: Shop::new(config.slots()),
            table: StateTable::build(),
            recovery: ErrorRecoveryController::new(),
            events,
            outbound,
            directory,
            metrics,
            debt_increment_cents: config.debt_increment_cents(),
            certification_valid_days: config.certification_valid_days(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    /// True once every event producer is gone; `run` can't make progress anymore
    pub fn input_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Consume events until a terminate event (or a closed queue), returning
    /// the state the board was left in. Workflow cargo starts empty.
    pub async fn run(&mut self) -> State {
        self.cargo = Cargo::Empty;
        info!(state = %self.state, "state_machine_running");

        loop {
            self.outbound.show(self.table.prompt(self.state));

            let Some(event) = self.events.next().await else {
                warn!(state = %self.state, "event_channel_closed");
                return self.state;
            };
            self.metrics.record_event_processed();

            if event.kind == EventKind::Terminate {
                info!(state = %self.state, "terminate_received");
                return self.state;
            }

            self.process_event(event).await;
        }
    }

    /// Dispatch a single event through the current state's handler table
    pub(crate) async fn process_event(&mut self, event: Event) {
        let state = self.state;

        let Some(handler) = self.table.handler(state, event.kind) else {
            self.metrics.record_unrecognized_event();
            info!(state = %state, event = %event.kind, "event_unrecognized");
            let data = event.payload.slot();
            self.state = self.recover(state, ErrorKind::Unrecognized(event.kind), data).await;
            self.cargo = Cargo::Empty;
            return;
        };

        let cargo = std::mem::take(&mut self.cargo);
        match handler(self, event.payload, &cargo) {
            Ok((next, next_cargo)) => {
                if next != state {
                    info!(from = %state, to = %next, event = %event.kind, "state_transition");
                } else {
                    debug!(state = %state, event = %event.kind, "state_unchanged");
                }
                self.state = next;
                self.cargo = next_cargo;
            }
            Err(failure) => {
                self.metrics.record_validation_failure();
                warn!(
                    state = %state,
                    event = %event.kind,
                    failure = %failure.failure,
                    "validation_failed"
                );
                self.cargo = cargo;
                self.state = self.recover(state, failure.failure.into(), failure.slot).await;
            }
        }
    }

    /// Hand control to error recovery and return the state it resolves to
    async fn recover(&mut self, state: State, error: ErrorKind, data: Option<Slot>) -> State {
        self.outbound.play(Cue::Error);

        let mut cx = RecoveryContext {
            events: &mut self.events,
            shop: &mut self.shop,
            outbound: &self.outbound,
        };
        let next = self.recovery.handle_error(&mut cx, state, error, data).await;

        self.metrics.record_recovery();
        next
    }
}
