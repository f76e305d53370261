//! Typed CRUD over namespaces. Names are hashed before hitting the tree;
//! callers always pass the human-readable name.

use crate::{decode, encode};
use forge_api::state::StateStore;
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::namespace::Namespace;

pub struct NamespaceKeeper<'a> {
    state: &'a mut dyn StateStore,
}

impl<'a> NamespaceKeeper<'a> {
    pub fn new(state: &'a mut dyn StateStore) -> Self {
        NamespaceKeeper { state }
    }

    /// Loads the namespace `name`, or a bare namespace when unregistered.
    pub fn get(&self, name: &str) -> Result<Namespace, StateError> {
        let key = keys::namespace_key(&Namespace::hash_name(name));
        match self.state.get(&key)? {
            Some(bytes) => decode(&bytes),
            None => Ok(Namespace::bare()),
        }
    }

    /// Loads the namespace `name`, or `None` when unregistered.
    pub fn find(&self, name: &str) -> Result<Option<Namespace>, StateError> {
        let key = keys::namespace_key(&Namespace::hash_name(name));
        match self.state.get(&key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Persists `ns` under the hash of `name`.
    pub fn update(&mut self, name: &str, ns: &Namespace) -> Result<(), StateError> {
        let key = keys::namespace_key(&Namespace::hash_name(name));
        self.state.insert(&key, &encode(ns)?)
    }
}
