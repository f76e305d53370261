//! The global, immutable parameter set.
//!
//! A single `Params` value is constructed at engine start (defaults, or
//! deserialized from TOML) and injected everywhere; nothing in the engine
//! reads process-wide mutable configuration.

use crate::address::Address;
use crate::repo::{Governance, PushPolicy, RepoConfig};
use serde::{Deserialize, Serialize};

/// Network-wide protocol parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Blocks before a purchased ticket matures.
    pub min_ticket_mat_dur: u64,
    /// Blocks a matured validator ticket stays active.
    pub max_ticket_active_dur: u64,
    /// Thaw period appended to a validator ticket's active window.
    pub num_blocks_in_thaw_period: u64,
    /// Thaw period applied when a host ticket is explicitly unbonded.
    pub num_blocks_in_host_thaw_period: u64,
    /// Blocks a namespace stays owned after acquisition.
    pub namespace_ttl: u64,
    /// Grace window appended after namespace expiry.
    pub namespace_grace_dur: u64,
    /// Fraction of distributed proposal fees credited to the helm repo.
    pub helm_proposal_fee_split: f64,
    /// Fraction of distributed proposal fees credited to the target repo.
    pub target_repo_proposal_fee_split: f64,
    /// The protocol treasury account.
    pub treasury_address: Address,
    /// Name of the network helm repository.
    pub helm_repo: String,
    /// Governance defaults applied to newly created repositories.
    pub default_governance: Governance,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            min_ticket_mat_dur: 60,
            max_ticket_active_dur: 40_320,
            num_blocks_in_thaw_period: 60,
            num_blocks_in_host_thaw_period: 60,
            namespace_ttl: 1_036_800,
            namespace_grace_dur: 40_320,
            helm_proposal_fee_split: 0.4,
            target_repo_proposal_fee_split: 0.6,
            treasury_address: Address::new("fg1treasury"),
            helm_repo: "helm".to_string(),
            default_governance: Governance::default(),
        }
    }
}

impl Params {
    /// Parses a TOML document into a parameter set; absent keys keep their
    /// defaults.
    pub fn from_toml(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }

    /// The default configuration of a newly created repository: the default
    /// governance plus the standard push policies.
    pub fn default_repo_config(&self) -> RepoConfig {
        RepoConfig {
            governance: self.default_governance.clone(),
            policies: default_push_policies(),
        }
    }

    /// The unbond height assigned to a validator stake purchased at `height`.
    pub fn validator_unbond_height(&self, height: u64) -> u64 {
        height + 1 + self.min_ticket_mat_dur + self.max_ticket_active_dur
            + self.num_blocks_in_thaw_period
    }

    /// The unbond height assigned when a host stake unbonds at `height`.
    pub fn host_unbond_height(&self, height: u64) -> u64 {
        height + 1 + self.num_blocks_in_host_thaw_period
    }
}

/// The push policies appended to every new repository's config.
pub fn default_push_policies() -> Vec<PushPolicy> {
    vec![
        PushPolicy {
            subject: "all".to_string(),
            object: "refs/heads".to_string(),
            action: "write".to_string(),
        },
        PushPolicy {
            subject: "creator".to_string(),
            object: "refs/heads".to_string(),
            action: "delete".to_string(),
        },
        PushPolicy {
            subject: "creator".to_string(),
            object: "refs/heads".to_string(),
            action: "merge-write".to_string(),
        },
    ]
}
