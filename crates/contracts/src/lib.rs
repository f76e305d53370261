//! System contracts for the forge engine.
//!
//! One contract per transaction type, registered in a fixed order. Each is
//! a stateless singleton; the executor asks `can_exec` and invokes `exec`
//! on the first match. The proposal sub-engine in [`proposal::engine`] is
//! shared by the proposal contracts, the push contract (merge requests) and
//! the end-of-block sweep.

use forge_api::SystemContract;

/// Shared debit/spendability helpers.
pub mod common;
/// Namespace acquisition and domain updates.
pub mod namespace;
/// Proposal creation, voting, fee deposits and the proposal sub-engine.
pub mod proposal;
/// The push-note contract.
pub mod push;
/// Push-key registration and update/delete.
pub mod pushkey;
/// Repository creation.
pub mod repo;
/// Ticket purchase, unbond and delegator commission.
pub mod ticket;
/// Coin transfer and recipient resolution.
pub mod transfer;

#[cfg(test)]
mod harness;

/// The full contract registry in dispatch order.
pub fn system_contracts() -> Vec<Box<dyn SystemContract>> {
    vec![
        Box::new(transfer::CoinTransferContract),
        Box::new(ticket::TicketPurchaseContract),
        Box::new(ticket::TicketUnbondContract),
        Box::new(ticket::SetDelegatorCommissionContract),
        Box::new(repo::RepoCreateContract),
        Box::new(push::PushContract),
        Box::new(namespace::AcquireNamespaceContract),
        Box::new(namespace::UpdateNamespaceDomainsContract),
        Box::new(pushkey::RegisterPushKeyContract),
        Box::new(pushkey::UpDelPushKeyContract),
        Box::new(proposal::ProposalUpsertOwnerContract),
        Box::new(proposal::ProposalRepoUpdateContract),
        Box::new(proposal::ProposalRegisterPushKeysContract),
        Box::new(proposal::ProposalMergeRequestContract),
        Box::new(proposal::vote::ProposalVoteContract),
        Box::new(proposal::ProposalFeeDepositContract),
    ]
}
