//! Recovery actions, dispatch tables and diagnostic messages

use super::{RecoveryAction, RecoveryContext, Resolution};
use crate::domain::errors::{ErrorKind, ValidationFailure};
use crate::domain::types::{EventKind, EventPayload, Slot};
use rustc_hash::FxHashMap;
use tracing::{info, warn};

const DEFAULT_MESSAGE: &str = "ACTION NOT\nRECOGNIZED. CNFM";

/// Longest run of occupant names shown above "left the shop!"
const DEPARTED_NAMES_WIDTH: usize = 14;

/// Diagnostic text for an error, suffixed with its slot when there is one
pub fn error_message(error: ErrorKind, data: Option<Slot>) -> String {
    let template = match error {
        ErrorKind::Validation(failure) => match failure {
            ValidationFailure::NonexistentUser => "NONEXISTENT\nUSER",
            ValidationFailure::InvalidUser => "ERR - INVALID\nUSER - CONFIRM",
            ValidationFailure::MoneyOwed => "ERR - USER OWES\nMONEY - CONFIRM",
            ValidationFailure::NonProctor => "ERR - USER IS\nNOT A PROCTOR",
            ValidationFailure::NonPod => "ERR - USER IS\nNOT A POD",
            ValidationFailure::OutOfDateTest => "ERR - EXPIRED\nSAFETY TEST",
            ValidationFailure::PodRequired => "ERR - ONLY POD\nCANNOT SIGN OUT",
            ValidationFailure::Unauthorized => "ERR - LACK\nPERMISSIONS",
            ValidationFailure::ShopOccupied => "ERR - OCCUPIED\nSLOT: ",
            ValidationFailure::ShopAlreadyOpen => "ERR SHOP\nALREADY OPEN",
        },
        ErrorKind::Unrecognized(EventKind::CardSwipe) => "ERR - IGNORING\nSWIPE, CONFIRM",
        ErrorKind::Unrecognized(EventKind::CardRemove) => "ERR -REINSRT OR\nCNFRM, SLOT: ",
        ErrorKind::Unrecognized(EventKind::CardInsert) => "ERR - UNINSERT\nSLOT: ",
        ErrorKind::Unrecognized(EventKind::SwitchFlipOff) => "ERR - TURN\nSHOP BACK ON",
        ErrorKind::Unrecognized(_) => DEFAULT_MESSAGE,
    };

    match data {
        Some(slot) => format!("{template}{slot}"),
        None => template.to_string(),
    }
}

pub(super) fn specific_table() -> FxHashMap<ErrorKind, FxHashMap<EventKind, RecoveryAction>> {
    let switch_back_on: &[(EventKind, RecoveryAction)] = &[
        (EventKind::SwitchFlipOn, resolved),
        (EventKind::ButtonConfirm, unrecognized),
    ];

    let rows: [(ErrorKind, &[(EventKind, RecoveryAction)]); 4] = [
        (
            ErrorKind::Unrecognized(EventKind::CardRemove),
            &[(EventKind::CardInsert, reinsert), (EventKind::ButtonConfirm, removed_not_reinserted)],
        ),
        (
            ErrorKind::Unrecognized(EventKind::CardInsert),
            &[(EventKind::CardRemove, uninsert), (EventKind::ButtonConfirm, unrecognized)],
        ),
        (ErrorKind::Validation(ValidationFailure::ShopOccupied), switch_back_on),
        (ErrorKind::Unrecognized(EventKind::SwitchFlipOff), switch_back_on),
    ];

    rows.into_iter()
        .map(|(error, actions)| (error, actions.iter().copied().collect()))
        .collect()
}

pub(super) fn default_table() -> FxHashMap<EventKind, RecoveryAction> {
    let rows: [(EventKind, RecoveryAction); 3] = [
        (EventKind::CardInsert, insert_during_error),
        (EventKind::CardRemove, remove_during_error),
        (EventKind::ButtonConfirm, resolved),
    ];
    rows.into_iter().collect()
}

pub(super) fn unrecognized(_: &mut RecoveryContext<'_>, _: &EventPayload, _: Option<Slot>) -> Resolution {
    Resolution::NotResolved
}

fn resolved(_: &mut RecoveryContext<'_>, _: &EventPayload, _: Option<Slot>) -> Resolution {
    Resolution::Resolved
}

/// Card put back after an unexpected removal
fn reinsert(_: &mut RecoveryContext<'_>, payload: &EventPayload, removed_from: Option<Slot>) -> Resolution {
    let slot = payload.slot();
    if slot == removed_from {
        Resolution::Resolved
    } else {
        Resolution::Escalate(ErrorKind::Unrecognized(EventKind::CardInsert), slot)
    }
}

/// Card pulled after an unexpected insertion
fn uninsert(_: &mut RecoveryContext<'_>, payload: &EventPayload, inserted_into: Option<Slot>) -> Resolution {
    let slot = payload.slot();
    if slot == inserted_into {
        Resolution::Resolved
    } else {
        Resolution::Escalate(ErrorKind::Unrecognized(EventKind::CardRemove), slot)
    }
}

/// Operator confirmed a removed card won't come back: sign its occupants out
fn removed_not_reinserted(
    cx: &mut RecoveryContext<'_>,
    _: &EventPayload,
    removed_from: Option<Slot>,
) -> Resolution {
    let Some(slot) = removed_from else {
        warn!("removed_card_without_slot");
        return Resolution::Resolved;
    };

    let names: String = cx.shop.occupant_names(slot).join(", ").chars().take(DEPARTED_NAMES_WIDTH).collect();
    if !names.is_empty() {
        cx.outbound.show(format!("{names}\nleft the shop!"));
    }

    let users = cx.shop.discharge(slot);
    info!(slot = %slot, users = %users.len(), "occupants_left_without_card");
    cx.outbound.notify_departure(users.into_vec());
    Resolution::Resolved
}

fn insert_during_error(_: &mut RecoveryContext<'_>, payload: &EventPayload, _: Option<Slot>) -> Resolution {
    Resolution::Escalate(ErrorKind::Unrecognized(EventKind::CardInsert), payload.slot())
}

fn remove_during_error(_: &mut RecoveryContext<'_>, payload: &EventPayload, _: Option<Slot>) -> Resolution {
    Resolution::Escalate(ErrorKind::Unrecognized(EventKind::CardRemove), payload.slot())
}
