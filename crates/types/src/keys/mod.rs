//! Defines constants for well-known state keys.
//!
//! These constants provide a single source of truth for the keys used to
//! store entities in the state tree and records in the auxiliary index
//! database. Using these builders prevents typos and keeps the hierarchical
//! layout consistent across keepers.

/// State-tree key prefix for accounts, keyed by bech32 address.
pub const ACCOUNT_PREFIX: &[u8] = b"a/";
/// State-tree key prefix for repositories, keyed by name.
pub const REPO_PREFIX: &[u8] = b"r/";
/// State-tree key prefix for namespaces, keyed by hashed name.
pub const NAMESPACE_PREFIX: &[u8] = b"n/";
/// State-tree key prefix for push keys, keyed by push-key ID.
pub const PUSH_KEY_PREFIX: &[u8] = b"pk/";

/// The state-tree key holding the name of the network helm repository.
pub const HELM_REPO_KEY: &[u8] = b"sys/helm";
/// The state-tree key holding the network-maturity height.
pub const NET_MATURITY_KEY: &[u8] = b"sys/maturity";

/// Index-DB key for the most recently committed block info.
pub const LAST_BLOCK_INFO_KEY: &[u8] = b"sys/lastblk";
/// Index-DB key prefix for validator sets per height (`blkv/<height>`).
pub const VALIDATOR_SET_PREFIX: &[u8] = b"blkv/";
/// Index-DB key prefix for the proposal ending-height index
/// (`propEndAt/<height>/<repo>/<propID>`).
pub const PROPOSAL_END_PREFIX: &[u8] = b"propEndAt/";
/// Index-DB key prefix for recorded proposal votes
/// (`propVote/<repo>/<propID>/<voter>`).
pub const PROPOSAL_VOTE_PREFIX: &[u8] = b"propVote/";

/// Builds the state-tree key for an account.
pub fn account_key(addr: &str) -> Vec<u8> {
    [ACCOUNT_PREFIX, addr.as_bytes()].concat()
}

/// Builds the state-tree key for a repository.
pub fn repo_key(name: &str) -> Vec<u8> {
    [REPO_PREFIX, name.as_bytes()].concat()
}

/// Builds the state-tree key for a namespace from its hashed name.
pub fn namespace_key(hashed_name: &str) -> Vec<u8> {
    [NAMESPACE_PREFIX, hashed_name.as_bytes()].concat()
}

/// Builds the state-tree key for a push key.
pub fn push_key_key(id: &str) -> Vec<u8> {
    [PUSH_KEY_PREFIX, id.as_bytes()].concat()
}

/// Builds the index-DB key for the validator set at a height.
pub fn validator_set_key(height: u64) -> Vec<u8> {
    [VALIDATOR_SET_PREFIX, height.to_string().as_bytes()].concat()
}

/// Builds the index-DB key recording that a proposal's voting period ends at
/// `height`.
pub fn proposal_end_key(height: u64, repo: &str, proposal_id: &str) -> Vec<u8> {
    [
        PROPOSAL_END_PREFIX,
        height.to_string().as_bytes(),
        b"/",
        repo.as_bytes(),
        b"/",
        proposal_id.as_bytes(),
    ]
    .concat()
}

/// Scan prefix covering every proposal ending at `height`.
pub fn proposal_end_height_prefix(height: u64) -> Vec<u8> {
    [PROPOSAL_END_PREFIX, height.to_string().as_bytes(), b"/"].concat()
}

/// Builds the index-DB key for a recorded vote.
pub fn proposal_vote_key(repo: &str, proposal_id: &str, voter: &str) -> Vec<u8> {
    [
        PROPOSAL_VOTE_PREFIX,
        repo.as_bytes(),
        b"/",
        proposal_id.as_bytes(),
        b"/",
        voter.as_bytes(),
    ]
    .concat()
}
