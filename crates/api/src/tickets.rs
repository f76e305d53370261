//! The read-only seam to the external ticket manager.

use forge_types::error::StateError;
use forge_types::ticket::Ticket;
use forge_types::PublicKey;

/// Read-only access to purchased tickets. Ticket scoring, maturity windows
/// and decay are computed by the external ticket module; the engine only
/// consumes the results when tallying stake-weighted proposals and when
/// unbonding.
pub trait TicketManager {
    /// Looks up a ticket by the hex hash of its purchase transaction.
    fn get_by_hash(&self, hash: &str) -> Option<Ticket>;

    /// Total value of all tickets matured by `max_height`; 0 = no cap.
    fn value_of_all_tickets(&self, max_height: u64) -> Result<f64, StateError>;

    /// All non-decayed tickets `pk` participates in as of `height`, either
    /// as proposer or as delegator.
    fn get_non_decayed_tickets(&self, pk: &PublicKey, height: u64)
        -> Result<Vec<Ticket>, StateError>;

    /// Total value of `pk`'s own (non-delegated) tickets as of `height`.
    fn value_of_non_delegated_tickets(
        &self,
        pk: &PublicKey,
        height: u64,
    ) -> Result<f64, StateError>;

    /// Total value of tickets delegated to `pk` as of `height`.
    fn value_of_delegated_tickets(&self, pk: &PublicKey, height: u64) -> Result<f64, StateError>;
}
