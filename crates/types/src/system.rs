//! System metadata: committed block info and validator snapshots.

use crate::address::PublicKey;
use serde::{Deserialize, Serialize};

/// Metadata about the most recently committed block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    /// Root commitment of the state tree after the block.
    pub app_hash: Vec<u8>,
    pub time: u64,
}

/// One validator in a per-height snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub pub_key: PublicKey,
    pub power: u64,
}
