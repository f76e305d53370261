//! The account entity, its stake ledger and the `BalanceAccount`
//! capability shared with repositories.

use crate::token::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of a bonded stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeKind {
    Validator,
    Host,
}

impl StakeKind {
    /// Single-letter stake-ID prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            StakeKind::Validator => "v",
            StakeKind::Host => "h",
        }
    }
}

/// A single bonded stake entry.
///
/// A stake is active while `unbond_height == 0` (bonded indefinitely, the
/// host case) or while the chain height is below `unbond_height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeInfo {
    pub kind: StakeKind,
    pub value: Amount,
    pub unbond_height: u64,
}

impl StakeInfo {
    pub fn is_active(&self, height: u64) -> bool {
        self.unbond_height == 0 || height < self.unbond_height
    }
}

/// The ordered stake ledger of an account, keyed by `<kind-prefix><index>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountStakes(pub BTreeMap<String, StakeInfo>);

impl AccountStakes {
    /// Adds a stake entry, returning the assigned stake ID.
    pub fn add(&mut self, kind: StakeKind, value: Amount, unbond_height: u64) -> String {
        let idx = self.0.keys().filter(|k| k.starts_with(kind.prefix())).count();
        let id = format!("{}{}", kind.prefix(), idx);
        self.0.insert(
            id.clone(),
            StakeInfo {
                kind,
                value,
                unbond_height,
            },
        );
        id
    }

    /// Total value of stakes still active at `height`.
    pub fn total_active(&self, height: u64) -> Amount {
        self.0
            .values()
            .filter(|s| s.is_active(height))
            .map(|s| s.value)
            .sum()
    }

    /// Finds the first bonded host stake of the given value, used to locate
    /// the ledger entry backing an unbonding ticket.
    pub fn first_bonded_host(&mut self, value: &Amount) -> Option<&mut StakeInfo> {
        self.0
            .values_mut()
            .find(|s| s.kind == StakeKind::Host && s.unbond_height == 0 && s.value == *value)
    }

    /// Drops every stake whose unbond height has passed.
    pub fn drop_matured(&mut self, height: u64) {
        self.0.retain(|_, s| s.is_active(height));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A user account, created lazily on first credit and never deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Amount,
    pub nonce: u64,
    pub stakes: AccountStakes,
    /// Commission percentage (0.0–100.0) taken from delegators.
    pub delegator_commission: f64,
}

impl Account {
    /// A bare account with zero balance and nonce.
    pub fn bare() -> Self {
        Account::default()
    }

    /// The balance spendable at `height`: the full balance minus the value
    /// held by still-active stakes.
    pub fn spendable(&self, height: u64) -> Amount {
        self.balance - self.stakes.total_active(height)
    }
}

/// Capability satisfied by both `Account` and `Repository`: anything the
/// coin-transfer path can credit.
pub trait BalanceAccount {
    fn balance(&self) -> Amount;
    fn set_balance(&mut self, amount: Amount);
    /// Drops matured unbonded stakes / compacts the entity at `height`.
    fn clean(&mut self, height: u64);
}

impl BalanceAccount for Account {
    fn balance(&self) -> Amount {
        self.balance
    }

    fn set_balance(&mut self, amount: Amount) {
        self.balance = amount;
    }

    fn clean(&mut self, height: u64) {
        self.stakes.drop_matured(height);
    }
}
