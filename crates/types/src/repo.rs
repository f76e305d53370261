//! The repository entity and its governance configuration.

use crate::account::BalanceAccount;
use crate::proposal::RepoProposal;
use crate::token::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The population eligible to vote on a repository's proposals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoterType {
    /// Repository owners; one owner = one vote.
    Owner,
    /// All mature-ticket stakeholders, weighted by ticket value.
    NetStakers,
    /// Network stakeholders, with veto owners additionally able to cast
    /// `NoWithVetoByOwners`.
    NetStakersAndVetoOwner,
}

/// The rule converting a vote into a numeric weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TallyMethod {
    /// +1 per vote.
    Identity,
    /// The voter's account balance at vote height.
    CoinWeighted,
    /// Total non-delegated ticket value of the voter.
    NetStakeOfProposer,
    /// Total ticket value delegated to the voter.
    NetStakeOfDelegators,
    /// Full non-decayed ticket value, with last-voter-wins correction
    /// between a ticket's proposer and delegator.
    NetStake,
}

/// Controls whether deposited proposal fees are returned to depositors or
/// distributed to the helm and target repositories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeRefundType {
    /// Never refund; always distribute.
    No,
    OnAccept,
    OnAcceptReject,
    OnAcceptAllReject,
    OnBelowThreshold,
    OnBelowThresholdAccept,
    OnBelowThresholdAcceptReject,
    OnBelowThresholdAcceptAllReject,
}

/// Governance parameters of a repository. A snapshot of this config is
/// frozen onto every proposal at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Governance {
    pub voter: VoterType,
    /// Percentage of the total voting power that must vote at all.
    pub quorum: f64,
    /// Percentage of received votes a side needs to win.
    pub threshold: f64,
    /// Percentage of received votes at which `NoWithVeto` rejects outright.
    pub veto_quorum: f64,
    /// Percentage of all owners at which `NoWithVetoByOwners` rejects.
    pub veto_owners_quorum: f64,
    pub tally_method: TallyMethod,
    /// Number of blocks a proposal stays open for voting.
    pub proposal_duration: u64,
    /// Number of blocks of the fee-deposit phase; 0 disables the phase.
    pub fee_deposit_duration: u64,
    /// Minimum total fee that must be deposited on a proposal.
    pub proposal_fee: Amount,
    pub fee_refund_type: FeeRefundType,
}

impl Default for Governance {
    fn default() -> Self {
        Governance {
            voter: VoterType::Owner,
            quorum: 40.0,
            threshold: 51.0,
            veto_quorum: 33.0,
            veto_owners_quorum: 0.0,
            tally_method: TallyMethod::Identity,
            proposal_duration: 100,
            fee_deposit_duration: 0,
            proposal_fee: Amount::zero(),
            fee_refund_type: FeeRefundType::No,
        }
    }
}

/// A reference push policy carried by the repository config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPolicy {
    /// The subject the policy applies to (an address, push-key ID or group).
    pub subject: String,
    /// The reference pattern the policy covers.
    pub object: String,
    /// The permitted action, e.g. `write`, `delete`, `merge-write`.
    pub action: String,
}

/// The full repository configuration: governance plus push policies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub governance: Governance,
    pub policies: Vec<PushPolicy>,
}

/// A sparse governance patch; only set fields overwrite.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceUpdate {
    pub voter: Option<VoterType>,
    pub quorum: Option<f64>,
    pub threshold: Option<f64>,
    pub veto_quorum: Option<f64>,
    pub veto_owners_quorum: Option<f64>,
    pub tally_method: Option<TallyMethod>,
    pub proposal_duration: Option<u64>,
    pub fee_deposit_duration: Option<u64>,
    pub proposal_fee: Option<Amount>,
    pub fee_refund_type: Option<FeeRefundType>,
}

/// A sparse repository-config patch, deep-merged onto the target config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoConfigUpdate {
    pub governance: GovernanceUpdate,
    pub policies: Option<Vec<PushPolicy>>,
}

impl RepoConfigUpdate {
    /// Deep-merges this patch onto `cfg`; unset fields leave `cfg` untouched.
    pub fn apply_to(&self, cfg: &mut RepoConfig) {
        let g = &self.governance;
        if let Some(v) = g.voter {
            cfg.governance.voter = v;
        }
        if let Some(v) = g.quorum {
            cfg.governance.quorum = v;
        }
        if let Some(v) = g.threshold {
            cfg.governance.threshold = v;
        }
        if let Some(v) = g.veto_quorum {
            cfg.governance.veto_quorum = v;
        }
        if let Some(v) = g.veto_owners_quorum {
            cfg.governance.veto_owners_quorum = v;
        }
        if let Some(v) = g.tally_method {
            cfg.governance.tally_method = v;
        }
        if let Some(v) = g.proposal_duration {
            cfg.governance.proposal_duration = v;
        }
        if let Some(v) = g.fee_deposit_duration {
            cfg.governance.fee_deposit_duration = v;
        }
        if let Some(v) = g.proposal_fee {
            cfg.governance.proposal_fee = v;
        }
        if let Some(v) = g.fee_refund_type {
            cfg.governance.fee_refund_type = v;
        }
        if let Some(p) = &self.policies {
            cfg.policies = p.clone();
        }
    }
}

/// A repository owner record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
    /// True when the owner can cast the special owners' veto vote.
    pub veto: bool,
    /// Height at which the owner joined.
    pub joined_at: u64,
    /// True for the repository creator.
    pub creator: bool,
}

/// Auxiliary data tracked on an issue reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefData {
    pub closed: bool,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

/// A tracked repository reference (branch, issue or merge request).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Push-key ID of the reference creator.
    pub creator: String,
    /// Strictly increases on every successful push that updates the ref.
    pub nonce: u64,
    /// Hex of the 20-byte object hash the reference points at.
    pub hash: String,
    pub data: RefData,
}

/// How a contributor's push fees are paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeMode {
    /// The pusher pays their own fees.
    PusherPays,
    /// The repository pays, uncapped.
    RepoPays,
    /// The repository pays up to `fee_cap`.
    RepoPaysCapped,
}

impl Default for FeeMode {
    fn default() -> Self {
        FeeMode::PusherPays
    }
}

/// A contributor policy scoped to a reference pattern and action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorPolicy {
    pub object: String,
    pub action: String,
}

/// A registered repository or namespace contributor, keyed by push-key ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub policies: Vec<ContributorPolicy>,
    pub fee_mode: FeeMode,
    /// Maximum total fee the repo will pay for this contributor
    /// (`RepoPaysCapped` only).
    pub fee_cap: Amount,
    /// Total fee already paid by the repo for this contributor.
    pub fee_used: Amount,
}

/// A hosted repository. Created by `repoCreate` and never deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub balance: Amount,
    pub owners: BTreeMap<String, RepoOwner>,
    pub references: BTreeMap<String, Reference>,
    pub proposals: BTreeMap<String, RepoProposal>,
    pub contributors: BTreeMap<String, Contributor>,
    pub config: RepoConfig,
    /// Block height of the last mutation.
    pub updated_at: u64,
}

impl Repository {
    /// A bare repository that has never been written.
    pub fn bare() -> Self {
        Repository::default()
    }

    /// True when the repository has never been created on chain.
    pub fn is_bare(&self) -> bool {
        self.updated_at == 0 && self.owners.is_empty() && self.proposals.is_empty()
    }

    /// Adds an owner, preserving `joined_at` when the address already exists.
    pub fn upsert_owner(&mut self, address: &str, veto: bool, height: u64, creator: bool) {
        match self.owners.get_mut(address) {
            Some(existing) => existing.veto = veto,
            None => {
                self.owners.insert(
                    address.to_string(),
                    RepoOwner {
                        veto,
                        joined_at: height,
                        creator,
                    },
                );
            }
        }
    }
}

impl BalanceAccount for Repository {
    fn balance(&self) -> Amount {
        self.balance
    }

    fn set_balance(&mut self, amount: Amount) {
        self.balance = amount;
    }

    fn clean(&mut self, _height: u64) {}
}
