//! The push-key entity: an on-chain key authorized to pay for pushes.

use crate::address::{Address, PublicKey};
use crate::token::Amount;
use serde::{Deserialize, Serialize};

/// A registered push key, stored under its bech32 push-key ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKey {
    pub pub_key: PublicKey,
    /// The owning account address.
    pub address: Address,
    /// Repo or namespace scopes the key is restricted to; empty = unscoped.
    pub scopes: Vec<String>,
    /// Maximum total fee this key may spend on push operations.
    pub fee_cap: Amount,
}

impl PushKey {
    /// Removes scopes at the given indices. Indices are applied from high to
    /// low so earlier removals do not shift later ones.
    pub fn remove_scopes(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for idx in indices.into_iter().rev() {
            if idx < self.scopes.len() {
                self.scopes.remove(idx);
            }
        }
    }
}
