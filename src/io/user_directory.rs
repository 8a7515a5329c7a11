//! User directory - lookup and debt bookkeeping for shop users
//!
//! The file-backed directory loads a JSON array of users at startup and
//! rewrites the whole file after every debt change. Write failures are
//! logged; the in-memory record stays authoritative for this run.

use crate::domain::errors::ValidationFailure;
use crate::domain::types::UserId;
use crate::domain::user::ShopUser;
use anyhow::Context;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Capability the controller uses to resolve card swipes and adjust debt
pub trait UserDirectory: Send + Sync {
    fn lookup(&self, id: &UserId) -> Result<ShopUser, ValidationFailure>;

    fn increase_debt(&self, user: &ShopUser, amount_cents: u64);

    fn clear_debt(&self, user: &ShopUser) -> Result<(), ValidationFailure>;
}

pub struct JsonUserDirectory {
    users: Mutex<FxHashMap<UserId, ShopUser>>,
    path: Option<PathBuf>,
}

impl JsonUserDirectory {
    /// Load users from a JSON file (an array of user records)
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read user file {}", path.display()))?;
        let users: Vec<ShopUser> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse user file {}", path.display()))?;

        info!(file = %path.display(), users = %users.len(), "user_directory_loaded");

        let mut directory = Self::in_memory(users);
        directory.path = Some(path.to_path_buf());
        Ok(directory)
    }

    /// Directory that never touches disk
    pub fn in_memory(users: impl IntoIterator<Item = ShopUser>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self { users: Mutex::new(users), path: None }
    }

    fn persist(&self, users: &FxHashMap<UserId, ShopUser>) {
        let Some(ref path) = self.path else {
            return;
        };
        let mut records: Vec<&ShopUser> = users.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let result = serde_json::to_string_pretty(&records)
            .map_err(std::io::Error::from)
            .and_then(|json| fs::write(path, json));
        if let Err(e) = result {
            error!(file = %path.display(), error = %e, "user_directory_persist_failed");
        }
    }
}

impl UserDirectory for JsonUserDirectory {
    fn lookup(&self, id: &UserId) -> Result<ShopUser, ValidationFailure> {
        self.users.lock().get(id).cloned().ok_or(ValidationFailure::NonexistentUser)
    }

    fn increase_debt(&self, user: &ShopUser, amount_cents: u64) {
        let mut users = self.users.lock();
        let Some(record) = users.get_mut(&user.id) else {
            warn!(user = %user.id, "debt_increase_unknown_user");
            return;
        };
        record.debt_cents = record.debt_cents.saturating_add(amount_cents);
        info!(user = %user.id, debt_cents = %record.debt_cents, "debt_increased");
        self.persist(&users);
    }

    fn clear_debt(&self, user: &ShopUser) -> Result<(), ValidationFailure> {
        let mut users = self.users.lock();
        let record = users.get_mut(&user.id).ok_or(ValidationFailure::NonexistentUser)?;
        let cleared = std::mem::take(&mut record.debt_cents);
        info!(user = %user.id, cleared_cents = %cleared, "debt_cleared");
        self.persist(&users);
        Ok(())
    }
}
