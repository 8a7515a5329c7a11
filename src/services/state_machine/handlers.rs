//! State handlers for the kiosk workflows

use super::table::HandlerResult;
use super::{Cargo, State, StateMachine};
use crate::domain::errors::{Failure, ValidationFailure};
use crate::domain::types::{EventPayload, Slot};
use crate::domain::user::ShopUser;
use crate::io::outbound::Cue;
use chrono::NaiveDate;
use tracing::{info, warn};

impl StateMachine {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Resolve the swiped card to a user record
    fn swiped_user(&self, payload: &EventPayload) -> Result<ShopUser, ValidationFailure> {
        let id = payload.user_id().ok_or(ValidationFailure::NonexistentUser)?;
        self.directory.lookup(id)
    }

    fn inserted_slot(&self, payload: &EventPayload) -> Option<Slot> {
        let slot = payload.slot();
        if slot.is_none() {
            warn!(state = %self.state, "card_event_without_slot");
        }
        slot
    }

    /// Workflow cargo went missing (restart or unrecognized-event reset)
    fn missing_cargo(&self, fallback: State) -> HandlerResult {
        warn!(state = %self.state, fallback = %fallback, "workflow_cargo_missing");
        self.outbound.play(Cue::Error);
        Ok((fallback, Cargo::Empty))
    }

    // ------------------------------------------------------------------
    // Simple transitions
    // ------------------------------------------------------------------

    pub(crate) fn go_to_closed(&mut self, _: EventPayload, _: &Cargo) -> HandlerResult {
        self.outbound.play(Cue::Closing);
        Ok((State::Closed, Cargo::Empty))
    }

    pub(crate) fn go_to_standby(&mut self, _: EventPayload, _: &Cargo) -> HandlerResult {
        self.outbound.play(Cue::Success);
        Ok((State::Standby, Cargo::Empty))
    }

    pub(crate) fn go_to_removing_user(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let Some(slot) = self.inserted_slot(&payload) else {
            return self.missing_cargo(State::Standby);
        };
        self.outbound.play(Cue::Success);
        Ok((State::RemovingUser, Cargo::Slot(slot)))
    }

    pub(crate) fn go_to_clearing_debt(&mut self, _: EventPayload, _: &Cargo) -> HandlerResult {
        self.outbound.play(Cue::Success);
        Ok((State::ClearingDebt, Cargo::Empty))
    }

    pub(crate) fn go_to_changing_pod(&mut self, _: EventPayload, _: &Cargo) -> HandlerResult {
        self.outbound.play(Cue::Success);
        Ok((State::ChangingPod, Cargo::Empty))
    }

    // ------------------------------------------------------------------
    // Opening and closing the shop
    // ------------------------------------------------------------------

    pub(crate) fn closed_card_swipe(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let user = self.swiped_user(&payload)?;
        user.check_proctor(self.today(), self.certification_valid_days)?;

        info!(user = %user.id, "proctor_swiped");
        self.outbound.play(Cue::Success);
        Ok((State::Opening, Cargo::User(user)))
    }

    pub(crate) fn opening_switch_flip(&mut self, _: EventPayload, cargo: &Cargo) -> HandlerResult {
        let Cargo::User(proctor) = cargo else {
            return self.missing_cargo(State::Closed);
        };
        self.shop.open(proctor.clone())?;

        info!(proctor = %proctor.id, "shop_opened");
        self.outbound.play(Cue::Opening);
        Ok((State::Standby, Cargo::Empty))
    }

    pub(crate) fn unlocked_close_shop(&mut self, _: EventPayload, _: &Cargo) -> HandlerResult {
        if let Err(failure) = self.shop.close() {
            return Err(Failure { failure, slot: self.shop.first_occupied_slot() });
        }

        info!("shop_closed");
        self.outbound.play(Cue::Closing);
        Ok((State::Closed, Cargo::Empty))
    }

    // ------------------------------------------------------------------
    // Unlocking and adding users
    // ------------------------------------------------------------------

    pub(crate) fn standby_card_swipe(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let user = self.swiped_user(&payload)?;
        if !self.shop.is_pod(&user) {
            return Err(ValidationFailure::NonPod.into());
        }

        info!(pod = %user.id, "board_unlocked");
        self.outbound.play(Cue::Success);
        Ok((State::Unlocked, Cargo::User(user)))
    }

    pub(crate) fn unlocked_card_swipe(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let user = self.swiped_user(&payload)?;
        user.check_shop_certified(self.today(), self.certification_valid_days)?;

        self.outbound.play(Cue::Success);
        Ok((State::AddingUser, Cargo::Users(vec![user])))
    }

    pub(crate) fn adding_user_card_swipe(&mut self, payload: EventPayload, cargo: &Cargo) -> HandlerResult {
        let Cargo::Users(first) = cargo else {
            return self.missing_cargo(State::Standby);
        };
        let user = self.swiped_user(&payload)?;
        user.check_shop_certified(self.today(), self.certification_valid_days)?;

        let mut users = first.clone();
        users.push(user);
        self.outbound.play(Cue::Success);
        Ok((State::AddingUsers, Cargo::Users(users)))
    }

    pub(crate) fn adding_users_card_insert(&mut self, payload: EventPayload, cargo: &Cargo) -> HandlerResult {
        let (Some(slot), Cargo::Users(users)) = (self.inserted_slot(&payload), cargo) else {
            return self.missing_cargo(State::Standby);
        };
        self.shop.add_users_to_slot(users, slot);

        info!(slot = %slot, users = %users.len(), "users_seated");
        self.outbound.play(Cue::Success);
        Ok((State::Standby, Cargo::Empty))
    }

    // ------------------------------------------------------------------
    // Removing users
    // ------------------------------------------------------------------

    pub(crate) fn removing_user_card_insert(&mut self, payload: EventPayload, cargo: &Cargo) -> HandlerResult {
        let (Some(slot), Cargo::Slot(prev_slot)) = (self.inserted_slot(&payload), cargo) else {
            return self.missing_cargo(State::Standby);
        };
        self.shop.replace_or_transfer(slot, *prev_slot);

        self.outbound.play(Cue::Success);
        Ok((State::Standby, Cargo::Empty))
    }

    pub(crate) fn removing_user_discharge(&mut self, _: EventPayload, cargo: &Cargo) -> HandlerResult {
        let Cargo::Slot(slot) = cargo else {
            return self.missing_cargo(State::Standby);
        };
        let users = self.shop.discharge(*slot);

        info!(slot = %slot, users = %users.len(), "slot_discharged");
        self.outbound.notify_departure(users.into_vec());
        self.outbound.play(Cue::Success);
        Ok((State::Standby, Cargo::Empty))
    }

    pub(crate) fn removing_user_charge(&mut self, _: EventPayload, cargo: &Cargo) -> HandlerResult {
        let Cargo::Slot(slot) = cargo else {
            return self.missing_cargo(State::Standby);
        };
        let users = self.shop.discharge(*slot);
        for user in &users {
            self.directory.increase_debt(user, self.debt_increment_cents);
        }

        info!(slot = %slot, users = %users.len(), amount_cents = %self.debt_increment_cents, "slot_charged");
        self.outbound.play(Cue::ChargingUser);
        Ok((State::Standby, Cargo::Empty))
    }

    // ------------------------------------------------------------------
    // Debt and pod administration
    // ------------------------------------------------------------------

    pub(crate) fn clearing_debt_card_swipe(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let user = self.swiped_user(&payload)?;
        self.directory.clear_debt(&user)?;

        self.outbound.play(Cue::ClearingDebt);
        Ok((State::Standby, Cargo::Empty))
    }

    pub(crate) fn changing_pod_card_swipe(&mut self, payload: EventPayload, _: &Cargo) -> HandlerResult {
        let user = self.swiped_user(&payload)?;
        let today = self.today();
        self.shop.change_pod(&user, today, self.certification_valid_days)?;

        self.outbound.play(Cue::Success);
        Ok((State::Standby, Cargo::Empty))
    }
}
