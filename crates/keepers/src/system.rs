//! System metadata: last committed block, the helm repository and the
//! network-maturity height.
//!
//! The helm repo name and maturity height are consensus state (tree); the
//! last-block record is node-local bookkeeping (index DB).

use crate::{decode, encode};
use forge_api::state::{IndexStore, StateStore};
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::system::BlockInfo;

pub struct SystemKeeper<'a> {
    state: &'a mut dyn StateStore,
    index: &'a mut dyn IndexStore,
}

impl<'a> SystemKeeper<'a> {
    pub fn new(state: &'a mut dyn StateStore, index: &'a mut dyn IndexStore) -> Self {
        SystemKeeper { state, index }
    }

    /// The most recently committed block, or `None` before genesis.
    pub fn get_last_block_info(&self) -> Result<Option<BlockInfo>, StateError> {
        match self.index.get(keys::LAST_BLOCK_INFO_KEY)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_last_block_info(&mut self, info: &BlockInfo) -> Result<(), StateError> {
        self.index.insert(keys::LAST_BLOCK_INFO_KEY, &encode(info)?)
    }

    /// Name of the repository that accrues the helm share of distributed
    /// proposal fees, or `None` when the network has not configured one.
    pub fn get_helm_repo(&self) -> Result<Option<String>, StateError> {
        match self.state.get(keys::HELM_REPO_KEY)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_helm_repo(&mut self, name: &str) -> Result<(), StateError> {
        self.state.insert(keys::HELM_REPO_KEY, &encode(&name)?)
    }

    /// Height at which the network is considered mature; 0 until set.
    pub fn get_net_maturity_height(&self) -> Result<u64, StateError> {
        match self.state.get(keys::NET_MATURITY_KEY)? {
            Some(bytes) => decode(&bytes),
            None => Ok(0),
        }
    }

    pub fn set_net_maturity_height(&mut self, height: u64) -> Result<(), StateError> {
        self.state.insert(keys::NET_MATURITY_KEY, &encode(&height)?)
    }
}
