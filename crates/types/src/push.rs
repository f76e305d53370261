//! Push notes: the transient payload of a push transaction.

use crate::address::{Address, PublicKey};
use crate::token::Amount;
use serde::{Deserialize, Serialize};

/// Reference-name prefix of issue references.
pub const ISSUE_REF_PREFIX: &str = "refs/heads/issues/";
/// Reference-name prefix of merge-request references.
pub const MERGE_REQUEST_REF_PREFIX: &str = "refs/heads/merges/";

/// The all-zero object hash marking a reference deletion.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000";

/// Returns the last path segment of a reference name, used as the on-chain
/// identifier of issues and merge requests.
pub fn reference_short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// True for references under the issue prefix.
pub fn is_issue_reference(name: &str) -> bool {
    name.starts_with(ISSUE_REF_PREFIX)
}

/// True for references under the merge-request prefix.
pub fn is_merge_request_reference(name: &str) -> bool {
    name.starts_with(MERGE_REQUEST_REF_PREFIX)
}

/// Free-form data carried alongside a pushed reference. Label and assignee
/// entries prefixed with `-` remove; bare entries add idempotently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedRefData {
    pub close: Option<bool>,
    pub labels: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
    /// Merge-request fields.
    pub base_branch: Option<String>,
    pub base_branch_hash: Option<String>,
    pub target_branch: Option<String>,
    pub target_branch_hash: Option<String>,
}

/// A single reference update inside a push note.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PushedReference {
    pub name: String,
    /// Hex hash the reference pointed at before the push.
    pub old_hash: String,
    /// Hex hash the reference points at after the push; all zeros deletes.
    pub new_hash: String,
    /// The pusher's view of the next reference nonce.
    pub nonce: u64,
    /// Hashes of the git objects the update introduces.
    pub objects: Vec<String>,
    /// Deletion was explicitly requested.
    pub delete: bool,
    /// ID of the merge proposal the reference belongs to, if any.
    pub merge_proposal_id: String,
    /// Push fee for this reference.
    pub fee: Amount,
    /// Secondary value stream; funds the merge proposal when one is created.
    pub value: Amount,
    pub data: PushedRefData,
}

impl PushedReference {
    /// True when the update deletes the reference.
    pub fn is_deletable(&self) -> bool {
        self.new_hash == ZERO_HASH
    }
}

/// A batch of reference updates to one repository, with fees and pusher
/// identity. Transaction payload only; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PushNote {
    pub repo_name: String,
    /// Push-key ID of the pusher.
    pub pusher_key_id: String,
    pub pusher_address: Address,
    /// The pusher's account nonce for this push.
    pub account_nonce: u64,
    pub timestamp: u64,
    /// Total size in bytes of the pushed objects.
    pub total_size: u64,
    /// Total push fee; must equal the sum of the per-reference fees.
    pub fee: Amount,
    pub references: Vec<PushedReference>,
    /// Signature of the sending node over the note.
    pub node_sig: Vec<u8>,
    pub node_pub_key: PublicKey,
}

impl PushNote {
    /// Sum of the per-reference push fees.
    pub fn total_reference_fees(&self) -> Amount {
        self.references.iter().map(|r| r.fee).sum()
    }
}
