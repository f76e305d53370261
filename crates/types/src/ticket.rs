//! Ticket data surfaced by the external ticket manager.

use crate::account::StakeKind;
use crate::address::{Address, PublicKey};
use crate::token::Amount;
use serde::{Deserialize, Serialize};

/// A purchased validator or host ticket, as reported by the ticket manager.
/// Ticket scoring and validity windows are computed externally; the engine
/// only reads the resulting fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Hex hash of the ticket-purchase transaction.
    pub hash: String,
    pub kind: Option<StakeKind>,
    /// The key that proposed (purchased) the ticket.
    pub proposer_pub_key: PublicKey,
    /// The delegator's address; empty when the ticket is not delegated.
    pub delegator: Address,
    /// Height at which the ticket was purchased.
    pub height: u64,
    pub value: Amount,
    /// Height at which the ticket matures.
    pub mature_by: u64,
    /// Height at which the ticket decays.
    pub decay_by: u64,
}

impl Ticket {
    /// True when someone other than the proposer funded the ticket.
    pub fn is_delegated(&self) -> bool {
        !self.delegator.is_empty() && self.delegator != self.proposer_pub_key.to_address()
    }
}
