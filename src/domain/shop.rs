//! Shop occupancy ledger
//!
//! Holds which users occupy which physical slot, whether the shop is open,
//! and the set of pods supervising it. Mutated only by the state machine.

use crate::domain::errors::ValidationFailure;
use crate::domain::types::{Slot, UserId};
use crate::domain::user::ShopUser;
use chrono::NaiveDate;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

/// Occupants of a single slot (usually one card, occasionally a pair)
pub type Occupants = SmallVec<[ShopUser; 2]>;

pub struct Shop {
    open: bool,
    slots: Vec<Occupants>,
    pods: Vec<ShopUser>,
}

impl Shop {
    /// Create a closed, empty shop. Every slot gets its own container.
    pub fn new(slot_count: usize) -> Self {
        Self {
            open: false,
            slots: (0..slot_count).map(|_| Occupants::new()).collect(),
            pods: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Open the shop with `proctor` as the only pod
    pub fn open(&mut self, proctor: ShopUser) -> Result<(), ValidationFailure> {
        if self.open {
            return Err(ValidationFailure::ShopAlreadyOpen);
        }
        info!(proctor = %proctor.id, "shop_opened");
        self.open = true;
        self.pods.clear();
        self.pods.push(proctor);
        Ok(())
    }

    /// Close the shop. Fails without changing anything while any slot is occupied.
    pub fn close(&mut self) -> Result<(), ValidationFailure> {
        if !self.is_empty() {
            return Err(ValidationFailure::ShopOccupied);
        }
        info!(pods = %self.pods.len(), "shop_closed");
        self.open = false;
        self.pods.clear();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_empty())
    }

    pub fn first_occupied_slot(&self) -> Option<Slot> {
        self.slots.iter().position(|slot| !slot.is_empty()).map(Slot)
    }

    pub fn is_pod(&self, user: &ShopUser) -> bool {
        self.is_pod_id(&user.id)
    }

    pub fn is_pod_id(&self, id: &UserId) -> bool {
        self.pods.iter().any(|pod| &pod.id == id)
    }

    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    pub fn occupants(&self, slot: Slot) -> &[ShopUser] {
        self.slots.get(slot.0).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// Names of the occupants of a slot, for display
    pub fn occupant_names(&self, slot: Slot) -> Vec<&str> {
        self.occupants(slot).iter().map(|u| u.name.as_str()).collect()
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut Occupants> {
        let count = self.slots.len();
        let occupants = self.slots.get_mut(slot.0);
        if occupants.is_none() {
            warn!(slot = %slot, slot_count = %count, "slot_out_of_range");
        }
        occupants
    }

    /// Add users to a slot, ignoring users already seated there
    pub fn add_users_to_slot(&mut self, users: &[ShopUser], slot: Slot) {
        let Some(occupants) = self.slot_mut(slot) else {
            return;
        };
        for user in users {
            if occupants.iter().any(|o| o.id == user.id) {
                continue;
            }
            occupants.push(user.clone());
        }
        debug!(slot = %slot, occupants = %occupants.len(), "slot_filled");
    }

    /// A card removed from `prev_slot` went into `slot`: no-op if they match,
    /// otherwise the occupants move over.
    pub fn replace_or_transfer(&mut self, slot: Slot, prev_slot: Slot) {
        if slot == prev_slot {
            return;
        }
        if slot.0 >= self.slots.len() {
            warn!(slot = %slot, "slot_out_of_range");
            return;
        }
        let moved = self.discharge(prev_slot);
        self.add_users_to_slot(&moved, slot);
        info!(from = %prev_slot, to = %slot, users = %moved.len(), "occupants_transferred");
    }

    /// Empty a slot, returning who was in it
    pub fn discharge(&mut self, slot: Slot) -> Occupants {
        self.slot_mut(slot).map(std::mem::take).unwrap_or_default()
    }

    /// Toggle pod membership for `user`
    ///
    /// A proctor who is not a pod joins; a pod leaves as long as another pod
    /// remains. The last pod can't leave, and anyone else is unauthorized.
    pub fn change_pod(
        &mut self,
        user: &ShopUser,
        today: NaiveDate,
        validity_days: u64,
    ) -> Result<(), ValidationFailure> {
        let is_pod = self.is_pod(user);
        if !is_pod && user.is_proctor(today, validity_days) {
            info!(user = %user.id, "pod_added");
            self.pods.push(user.clone());
            Ok(())
        } else if is_pod && self.pods.len() > 1 {
            info!(user = %user.id, "pod_removed");
            self.pods.retain(|pod| pod.id != user.id);
            Ok(())
        } else if is_pod {
            Err(ValidationFailure::PodRequired)
        } else {
            Err(ValidationFailure::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    const VALIDITY: u64 = 365;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn user(id: &str) -> ShopUser {
        ShopUser::new(id, format!("User {id}"))
            .with_safety_test(today().checked_sub_days(Days::new(10)).unwrap())
    }

    fn proctor(id: &str) -> ShopUser {
        user(id).as_proctor()
    }

    fn open_shop() -> Shop {
        let mut shop = Shop::new(30);
        shop.open(proctor("p1")).unwrap();
        shop
    }

    #[test]
    fn test_new_shop_is_closed_and_empty() {
        let shop = Shop::new(30);
        assert!(!shop.is_open());
        assert!(shop.is_empty());
        assert_eq!(shop.slot_count(), 30);
        assert_eq!(shop.pod_count(), 0);
    }

    #[test]
    fn test_open_records_proctor_as_pod() {
        let shop = open_shop();
        assert!(shop.is_open());
        assert!(shop.is_pod(&proctor("p1")));
        assert_eq!(shop.pod_count(), 1);
    }

    #[test]
    fn test_open_twice_fails() {
        let mut shop = open_shop();
        assert_eq!(shop.open(proctor("p2")), Err(ValidationFailure::ShopAlreadyOpen));
        assert!(!shop.is_pod(&proctor("p2")));
    }

    #[test]
    fn test_close_requires_empty_shop() {
        let mut shop = open_shop();
        shop.add_users_to_slot(&[user("u1")], Slot(3));

        assert_eq!(shop.close(), Err(ValidationFailure::ShopOccupied));
        assert!(shop.is_open());
        assert_eq!(shop.pod_count(), 1);
        assert_eq!(shop.first_occupied_slot(), Some(Slot(3)));

        shop.discharge(Slot(3));
        assert_eq!(shop.close(), Ok(()));
        assert!(!shop.is_open());
        assert_eq!(shop.pod_count(), 0);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut shop = open_shop();
        shop.add_users_to_slot(&[user("u1")], Slot(0));

        assert_eq!(shop.occupants(Slot(0)).len(), 1);
        assert!(shop.occupants(Slot(1)).is_empty());

        let other = Shop::new(30);
        assert!(other.is_empty());
    }

    #[test]
    fn test_add_users_deduplicates() {
        let mut shop = open_shop();
        shop.add_users_to_slot(&[user("u1"), user("u2")], Slot(5));
        shop.add_users_to_slot(&[user("u1")], Slot(5));
        assert_eq!(shop.occupant_names(Slot(5)), vec!["User u1", "User u2"]);
    }

    #[test]
    fn test_replace_same_slot_is_noop() {
        let mut shop = open_shop();
        shop.add_users_to_slot(&[user("u1")], Slot(4));
        shop.replace_or_transfer(Slot(4), Slot(4));
        assert_eq!(shop.occupants(Slot(4)).len(), 1);
    }

    #[test]
    fn test_transfer_moves_occupants() {
        let mut shop = open_shop();
        shop.add_users_to_slot(&[user("u1"), user("u2")], Slot(4));
        shop.add_users_to_slot(&[user("u3")], Slot(6));

        shop.replace_or_transfer(Slot(6), Slot(4));

        assert!(shop.occupants(Slot(4)).is_empty());
        assert_eq!(shop.occupants(Slot(6)).len(), 3);
    }

    #[test]
    fn test_out_of_range_slot_is_ignored() {
        let mut shop = Shop::new(2);
        shop.add_users_to_slot(&[user("u1")], Slot(9));
        assert!(shop.is_empty());
        assert!(shop.discharge(Slot(9)).is_empty());
        assert!(shop.occupants(Slot(9)).is_empty());
    }

    #[test]
    fn test_change_pod_adds_proctor() {
        let mut shop = open_shop();
        assert_eq!(shop.change_pod(&proctor("p2"), today(), VALIDITY), Ok(()));
        assert_eq!(shop.pod_count(), 2);
    }

    #[test]
    fn test_change_pod_removes_pod_when_another_remains() {
        let mut shop = open_shop();
        shop.change_pod(&proctor("p2"), today(), VALIDITY).unwrap();
        assert_eq!(shop.change_pod(&proctor("p1"), today(), VALIDITY), Ok(()));
        assert!(!shop.is_pod(&proctor("p1")));
        assert_eq!(shop.pod_count(), 1);
    }

    #[test]
    fn test_change_pod_keeps_last_pod() {
        let mut shop = open_shop();
        assert_eq!(
            shop.change_pod(&proctor("p1"), today(), VALIDITY),
            Err(ValidationFailure::PodRequired)
        );
        assert_eq!(shop.pod_count(), 1);
    }

    #[test]
    fn test_change_pod_rejects_non_proctor() {
        let mut shop = open_shop();
        assert_eq!(
            shop.change_pod(&user("u1"), today(), VALIDITY),
            Err(ValidationFailure::Unauthorized)
        );
        assert_eq!(shop.pod_count(), 1);
    }
}
