//! Per-height validator-set snapshots in the index DB.

use crate::{decode, encode};
use forge_api::state::IndexStore;
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::system::ValidatorInfo;

pub struct ValidatorKeeper<'a> {
    index: &'a mut dyn IndexStore,
}

impl<'a> ValidatorKeeper<'a> {
    pub fn new(index: &'a mut dyn IndexStore) -> Self {
        ValidatorKeeper { index }
    }

    /// The validator set effective at `height`; empty when none recorded.
    pub fn get_by_height(&self, height: u64) -> Result<Vec<ValidatorInfo>, StateError> {
        match self.index.get(&keys::validator_set_key(height))? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Records the validator set effective at `height`.
    pub fn set_for_height(
        &mut self,
        height: u64,
        validators: &[ValidatorInfo],
    ) -> Result<(), StateError> {
        self.index
            .insert(&keys::validator_set_key(height), &encode(&validators)?)
    }
}
