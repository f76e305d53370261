//! The namespace entity: a human-readable name mapping domains to targets.

use crate::repo::Contributor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A registered namespace, stored under the hash of its name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    /// The owning address or repository name.
    pub owner: String,
    /// Height at which the namespace expires.
    pub expires_at: u64,
    /// End of the post-expiry grace period.
    pub grace_end_at: u64,
    /// Domain → target mapping. Targets are `a/<addr>`, `r/<repo>` or a raw
    /// address.
    pub domains: BTreeMap<String, String>,
    pub contributors: BTreeMap<String, Contributor>,
}

impl Namespace {
    pub fn bare() -> Self {
        Namespace::default()
    }

    /// True when the namespace has never been acquired.
    pub fn is_bare(&self) -> bool {
        self.owner.is_empty() && self.expires_at == 0
    }

    /// The storage identifier of a namespace name.
    pub fn hash_name(name: &str) -> String {
        hex::encode(Sha256::digest(name.as_bytes()))
    }
}
