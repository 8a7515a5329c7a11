//! Shop users and their derived capabilities
//!
//! Capabilities are never stored as booleans: certification and proctor
//! status are recomputed from the underlying record against a date.

use crate::domain::errors::ValidationFailure;
use crate::domain::types::UserId;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A user record as held by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopUser {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Outstanding debt in cents
    #[serde(default)]
    pub debt_cents: u64,
    /// Date the safety test was last passed (None = never)
    #[serde(default)]
    pub safety_test_date: Option<NaiveDate>,
    #[serde(default)]
    pub proctor: bool,
    /// Revoked records are kept for history but may not use the shop
    #[serde(default)]
    pub revoked: bool,
}

impl ShopUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: String::new(),
            debt_cents: 0,
            safety_test_date: None,
            proctor: false,
            revoked: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_safety_test(mut self, date: NaiveDate) -> Self {
        self.safety_test_date = Some(date);
        self
    }

    pub fn with_debt(mut self, debt_cents: u64) -> Self {
        self.debt_cents = debt_cents;
        self
    }

    pub fn as_proctor(mut self) -> Self {
        self.proctor = true;
        self
    }

    pub fn revoked(mut self) -> Self {
        self.revoked = true;
        self
    }

    /// Safety test is valid until `validity_days` after it was taken (exclusive)
    pub fn has_valid_safety_test(&self, today: NaiveDate, validity_days: u64) -> bool {
        self.safety_test_date
            .and_then(|taken| taken.checked_add_days(Days::new(validity_days)))
            .is_some_and(|expires| today < expires)
    }

    /// Check whether the user may work in the shop
    pub fn check_shop_certified(
        &self,
        today: NaiveDate,
        validity_days: u64,
    ) -> Result<(), ValidationFailure> {
        if self.revoked {
            return Err(ValidationFailure::InvalidUser);
        }
        if self.debt_cents > 0 {
            return Err(ValidationFailure::MoneyOwed);
        }
        if !self.has_valid_safety_test(today, validity_days) {
            return Err(ValidationFailure::OutOfDateTest);
        }
        Ok(())
    }

    /// Check whether the user may open and supervise the shop
    pub fn check_proctor(&self, today: NaiveDate, validity_days: u64) -> Result<(), ValidationFailure> {
        self.check_shop_certified(today, validity_days)?;
        if !self.proctor {
            return Err(ValidationFailure::NonProctor);
        }
        Ok(())
    }

    pub fn is_shop_certified(&self, today: NaiveDate, validity_days: u64) -> bool {
        self.check_shop_certified(today, validity_days).is_ok()
    }

    pub fn is_proctor(&self, today: NaiveDate, validity_days: u64) -> bool {
        self.check_proctor(today, validity_days).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALIDITY: u64 = 365;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn days_ago(days: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(days)).unwrap()
    }

    fn certified() -> ShopUser {
        ShopUser::new("100", "Joe Schmoe").with_safety_test(days_ago(30))
    }

    #[test]
    fn test_certified_user() {
        assert!(certified().is_shop_certified(today(), VALIDITY));
        assert_eq!(certified().check_shop_certified(today(), VALIDITY), Ok(()));
    }

    #[test]
    fn test_revoked_user_is_invalid() {
        let user = certified().revoked();
        assert_eq!(
            user.check_shop_certified(today(), VALIDITY),
            Err(ValidationFailure::InvalidUser)
        );
    }

    #[test]
    fn test_debt_blocks_certification() {
        let user = certified().with_debt(500);
        assert_eq!(user.check_shop_certified(today(), VALIDITY), Err(ValidationFailure::MoneyOwed));
    }

    #[test]
    fn test_never_tested_user_is_out_of_date() {
        let user = ShopUser::new("1", "New Person");
        assert!(!user.has_valid_safety_test(today(), VALIDITY));
        assert_eq!(
            user.check_shop_certified(today(), VALIDITY),
            Err(ValidationFailure::OutOfDateTest)
        );
    }

    #[test]
    fn test_safety_test_boundaries() {
        let just_in = certified().with_safety_test(days_ago(VALIDITY - 1));
        let just_out = certified().with_safety_test(days_ago(VALIDITY));
        let way_out = certified().with_safety_test(days_ago(VALIDITY * 4));

        assert!(just_in.has_valid_safety_test(today(), VALIDITY));
        assert!(!just_out.has_valid_safety_test(today(), VALIDITY));
        assert!(!way_out.has_valid_safety_test(today(), VALIDITY));
    }

    #[test]
    fn test_proctor_requires_flag_and_certification() {
        assert!(certified().as_proctor().is_proctor(today(), VALIDITY));
        assert_eq!(certified().check_proctor(today(), VALIDITY), Err(ValidationFailure::NonProctor));

        let out_of_date = certified().as_proctor().with_safety_test(days_ago(VALIDITY * 2));
        assert!(!out_of_date.is_proctor(today(), VALIDITY));
        assert_eq!(
            out_of_date.check_proctor(today(), VALIDITY),
            Err(ValidationFailure::OutOfDateTest)
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let user: ShopUser =
            serde_json::from_str(r#"{"id":"42","name":"Ada","safety_test_date":"2024-01-15"}"#)
                .unwrap();
        assert_eq!(user.id, UserId::new("42"));
        assert_eq!(user.debt_cents, 0);
        assert!(!user.proctor);
        assert_eq!(user.safety_test_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}
