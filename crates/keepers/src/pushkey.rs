//! Typed CRUD over registered push keys.

use crate::{decode, encode};
use forge_api::state::StateStore;
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::pushkey::PushKey;
use forge_types::Address;

pub struct PushKeyKeeper<'a> {
    state: &'a mut dyn StateStore,
}

impl<'a> PushKeyKeeper<'a> {
    pub fn new(state: &'a mut dyn StateStore) -> Self {
        PushKeyKeeper { state }
    }

    /// Loads the push key `id`, or `None` when unregistered.
    pub fn get(&self, id: &str) -> Result<Option<PushKey>, StateError> {
        match self.state.get(&keys::push_key_key(id))? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Persists `key` under `id`.
    pub fn update(&mut self, id: &str, key: &PushKey) -> Result<(), StateError> {
        self.state.insert(&keys::push_key_key(id), &encode(key)?)
    }

    /// Removes the push key `id`.
    pub fn remove(&mut self, id: &str) -> Result<(), StateError> {
        self.state.delete(&keys::push_key_key(id))
    }

    /// IDs of every push key owned by `addr`, in key order.
    pub fn get_by_address(&self, addr: &Address) -> Result<Vec<String>, StateError> {
        let mut out = Vec::new();
        for (key, bytes) in self.state.prefix_scan(keys::PUSH_KEY_PREFIX)? {
            let pk: PushKey = decode(&bytes)?;
            if &pk.address == addr {
                let id = std::str::from_utf8(&key[keys::PUSH_KEY_PREFIX.len()..])
                    .map_err(|e| StateError::Decode(format!("push key id: {}", e)))?;
                out.push(id.to_string());
            }
        }
        Ok(out)
    }
}
