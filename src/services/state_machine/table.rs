//! State table: display prompt and event handlers for every state
//!
//! Built once at startup. Indexed by `State` so every state always has a row;
//! an event kind missing from a row is routed to error recovery.

use super::{Cargo, State, StateMachine};
use crate::domain::errors::Failure;
use crate::domain::types::{EventKind, EventPayload};
use rustc_hash::FxHashMap;

pub(crate) type HandlerResult = Result<(State, Cargo), Failure>;

/// Handler for one (state, event kind) pair
pub(crate) type Handler = fn(&mut StateMachine, EventPayload, &Cargo) -> HandlerResult;

/// One row of the state table
pub(crate) struct StateEntry {
    pub prompt: &'static str,
    pub handlers: FxHashMap<EventKind, Handler>,
}

impl StateEntry {
    fn new(prompt: &'static str, handlers: &[(EventKind, Handler)]) -> Self {
        Self { prompt, handlers: handlers.iter().copied().collect() }
    }
}

pub(crate) struct StateTable {
    rows: [StateEntry; State::COUNT],
}

impl StateTable {
    pub fn build() -> Self {
        use EventKind::*;

        let rows = State::ALL.map(|state| match state {
            State::Closed => StateEntry::new(
                "Shop closed.\nProctor swipe",
                &[(CardSwipe, StateMachine::closed_card_swipe)],
            ),
            State::Opening => StateEntry::new(
                "Starting up!\nFlip switch",
                &[
                    (ButtonCancel, StateMachine::go_to_closed),
                    (SwitchFlipOff, StateMachine::opening_switch_flip),
                ],
            ),
            State::Standby => StateEntry::new(
                "Board locked.\nPOD swipe",
                &[(CardSwipe, StateMachine::standby_card_swipe)],
            ),
            State::Unlocked => StateEntry::new(
                "Board Unlocked.\nTake any action",
                &[
                    (ButtonCancel, StateMachine::go_to_standby),
                    (CardSwipe, StateMachine::unlocked_card_swipe),
                    (CardRemove, StateMachine::go_to_removing_user),
                    (ButtonMoney, StateMachine::go_to_clearing_debt),
                    (ButtonChangePod, StateMachine::go_to_changing_pod),
                    (SwitchFlipOn, StateMachine::unlocked_close_shop),
                ],
            ),
            State::AddingUser => StateEntry::new(
                "Adding user.\nSwipe/insert card",
                &[
                    (CardSwipe, StateMachine::adding_user_card_swipe),
                    (CardInsert, StateMachine::adding_users_card_insert),
                    (ButtonCancel, StateMachine::go_to_standby),
                ],
            ),
            State::AddingUsers => StateEntry::new(
                "Adding users.\nInsert cards",
                &[
                    (CardInsert, StateMachine::adding_users_card_insert),
                    (ButtonCancel, StateMachine::go_to_standby),
                ],
            ),
            State::RemovingUser => StateEntry::new(
                "Removing user(s)\n(R)nsrt/clr/chrg",
                &[
                    (CardInsert, StateMachine::removing_user_card_insert),
                    (ButtonDischarge, StateMachine::removing_user_discharge),
                    (ButtonMoney, StateMachine::removing_user_charge),
                ],
            ),
            State::ClearingDebt => StateEntry::new(
                "Clearing debt.\nSwipe card",
                &[
                    (CardSwipe, StateMachine::clearing_debt_card_swipe),
                    (ButtonCancel, StateMachine::go_to_standby),
                ],
            ),
            State::ChangingPod => StateEntry::new(
                "Changing POD.\nSwipe card",
                &[
                    (CardSwipe, StateMachine::changing_pod_card_swipe),
                    (ButtonCancel, StateMachine::go_to_standby),
                ],
            ),
        });

        Self { rows }
    }

    pub fn prompt(&self, state: State) -> &'static str {
        self.rows[state.index()].prompt
    }

    pub fn handler(&self, state: State, kind: EventKind) -> Option<Handler> {
        self.rows[state.index()].handlers.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_a_prompt() {
        let table = StateTable::build();
        for state in State::ALL {
            assert!(table.prompt(state).contains('\n'), "{state} prompt has two lines");
        }
    }

    #[test]
    fn test_terminate_and_confirm_are_never_handled() {
        let table = StateTable::build();
        for state in State::ALL {
            assert!(table.handler(state, EventKind::Terminate).is_none());
            assert!(table.handler(state, EventKind::ButtonConfirm).is_none());
        }
    }

    #[test]
    fn test_cancel_registration() {
        let table = StateTable::build();
        let cancellable: Vec<State> = State::ALL
            .into_iter()
            .filter(|s| table.handler(*s, EventKind::ButtonCancel).is_some())
            .collect();
        assert_eq!(
            cancellable,
            vec![
                State::Opening,
                State::Unlocked,
                State::AddingUser,
                State::AddingUsers,
                State::ClearingDebt,
                State::ChangingPod,
            ]
        );
    }
}
