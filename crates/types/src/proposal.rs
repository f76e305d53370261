//! Repository proposals: actions, tallies, outcomes and votes.

use crate::repo::{ContributorPolicy, FeeMode, Governance, RepoConfigUpdate};
use crate::token::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The action a proposal applies when accepted, with its payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalAction {
    /// Add or update repository owners.
    UpsertOwner { addresses: Vec<String>, veto: bool },
    /// Deep-merge a config patch onto the repository config.
    RepoUpdate { config: RepoConfigUpdate },
    /// Register push keys as contributors on the repo and/or a namespace.
    RegisterPushKey {
        ids: Vec<String>,
        policies: Vec<ContributorPolicy>,
        fee_mode: FeeMode,
        fee_cap: Amount,
        /// Also register the contributors on this namespace.
        namespace: Option<String>,
        /// Register only on this namespace, not the repo.
        namespace_only: Option<String>,
    },
    /// A merge request; carries no on-chain action on acceptance.
    MergeRequest {
        base_branch: String,
        base_branch_hash: String,
        target_branch: String,
        target_branch_hash: String,
    },
}

/// Terminal result of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalOutcome {
    /// Fewer votes were received than the quorum requires.
    QuorumNotMet,
    /// Neither side reached the threshold.
    BelowThreshold,
    Accepted,
    Rejected,
    /// The `NoWithVeto` tally reached the veto quorum.
    RejectedWithVeto,
    /// Veto owners rejected under `netStakersAndVetoOwner` voting.
    RejectedWithVetoByOwners,
    /// The fee-deposit phase ended without reaching the proposal fee.
    InsufficientDeposit,
}

/// A governance proposal attached to a repository.
///
/// Settled exactly once at `end_at + 1`; once `outcome` is set the proposal
/// is terminal and later sweeps are no-ops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoProposal {
    pub action: ProposalAction,
    /// Address of the proposal creator.
    pub creator: String,
    /// Snapshot of the repo's governance parameters at creation.
    pub config: Governance,
    /// Max `joined_at` height for eligible owner voters; 0 = no cap.
    pub power_age: u64,
    /// Absolute height at which voting closes.
    pub end_at: u64,
    /// Absolute height before which fee deposits are accepted; 0 disables
    /// the deposit phase.
    pub fee_deposit_end_at: u64,
    /// Proposal-fee deposits by depositor address.
    pub fees: BTreeMap<String, Amount>,
    pub yes: f64,
    pub no: f64,
    pub no_with_veto: f64,
    pub abstain: f64,
    pub no_with_veto_by_owners: f64,
    pub outcome: Option<ProposalOutcome>,
}

impl RepoProposal {
    pub fn new(action: ProposalAction, creator: String, config: Governance) -> Self {
        RepoProposal {
            action,
            creator,
            config,
            power_age: 0,
            end_at: 0,
            fee_deposit_end_at: 0,
            fees: BTreeMap::new(),
            yes: 0.0,
            no: 0.0,
            no_with_veto: 0.0,
            abstain: 0.0,
            no_with_veto_by_owners: 0.0,
            outcome: None,
        }
    }

    /// True once the outcome has been decided.
    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }

    /// True while additional fee deposits are accepted at `height`.
    pub fn is_deposit_period(&self, height: u64) -> bool {
        self.fee_deposit_end_at != 0 && height < self.fee_deposit_end_at
    }

    /// Sum of all deposited proposal fees.
    pub fn total_fees(&self) -> Amount {
        self.fees.values().copied().sum()
    }

    /// Adds a deposit, accumulating per depositor.
    pub fn add_fee(&mut self, depositor: &str, amount: Amount) {
        let entry = self.fees.entry(depositor.to_string()).or_default();
        *entry += amount;
    }
}

/// A vote cast on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteChoice {
    Yes,
    No,
    NoWithVeto,
    Abstain,
    /// Veto-owner rejection, valid only under `netStakersAndVetoOwner`.
    NoWithVetoByOwners,
}

/// The record kept in the index DB for every cast vote. The stored weight
/// supports the retroactive `netStake` correction between a ticket's
/// proposer and delegator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalVoteRecord {
    pub choice: VoteChoice,
    pub weight: f64,
}
