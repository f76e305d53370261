//! Typed CRUD over accounts.

use crate::{decode, encode};
use forge_api::state::StateStore;
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::{Account, Address};

/// A short-lived view over the state tree for account access.
pub struct AccountKeeper<'a> {
    state: &'a mut dyn StateStore,
}

impl<'a> AccountKeeper<'a> {
    pub fn new(state: &'a mut dyn StateStore) -> Self {
        AccountKeeper { state }
    }

    /// Loads the account at `addr`, or a bare account when none exists.
    /// Accounts are created lazily on first credit.
    pub fn get(&self, addr: &Address) -> Result<Account, StateError> {
        match self.state.get(&keys::account_key(addr.as_str()))? {
            Some(bytes) => decode(&bytes),
            None => Ok(Account::bare()),
        }
    }

    /// Persists `acct` under `addr`.
    pub fn update(&mut self, addr: &Address, acct: &Account) -> Result<(), StateError> {
        self.state
            .insert(&keys::account_key(addr.as_str()), &encode(acct)?)
    }
}
