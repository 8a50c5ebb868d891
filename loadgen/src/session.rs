//! Per-actor session state
//!
//! Everything here is owned by a single actor; nothing is shared across
//! actors. `IdCache` reads go through `Option` so that chained actions can
//! skip cleanly when nothing has been observed yet.

use rand::Rng;
use thiserror::Error;

use crate::config::Account;

/// An authenticated user on the target platform
#[derive(Debug, Clone)]
pub struct UserSession {
    pub username: String,
    /// UUID string as issued by the platform
    pub user_id: String,
    /// Bearer token for `/api/v3` calls
    pub token: String,
}

/// Raised when a scenario needs more accounts than are configured
#[derive(Debug, Clone, Error)]
#[error("no account configured for role {role} ({available} available)")]
pub struct MissingAccount {
    pub role: usize,
    pub available: usize,
}

/// The configured test accounts, addressed by role position
#[derive(Debug, Clone)]
pub struct Roster {
    accounts: Vec<Account>,
}

impl Roster {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn role(&self, role: usize) -> Result<&Account, MissingAccount> {
        self.accounts.get(role).ok_or(MissingAccount {
            role,
            available: self.accounts.len(),
        })
    }

    pub fn first(&self) -> Result<&Account, MissingAccount> {
        self.role(0)
    }

    pub fn second(&self) -> Result<&Account, MissingAccount> {
        self.role(1)
    }

    pub fn third(&self) -> Result<&Account, MissingAccount> {
        self.role(2)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// IDs observed during the run, readable only once populated
#[derive(Debug, Clone)]
pub struct IdCache<T> {
    ids: Vec<T>,
}

impl<T: Clone + PartialEq> IdCache<T> {
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add one ID, ignoring duplicates
    pub fn remember(&mut self, id: T) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Replace the whole cache with a freshly observed list
    pub fn refresh<I: IntoIterator<Item = T>>(&mut self, ids: I) {
        self.ids.clear();
        for id in ids {
            self.remember(id);
        }
    }

    /// Drop an ID that no longer exists on the server
    pub fn forget(&mut self, id: &T) {
        self.ids.retain(|known| known != id);
    }

    /// A uniformly random cached ID, or `None` when nothing is cached yet
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<T> {
        if self.ids.is_empty() {
            return None;
        }
        self.ids.get(rng.random_range(0..self.ids.len())).cloned()
    }
}

impl<T: Clone + PartialEq> Default for IdCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
