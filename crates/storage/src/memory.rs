//! In-memory implementations of the state tree and the index store.
//!
//! Writes land in a block-scoped staging map layered over the committed
//! map. `tx_begin` snapshots the staging map so a failing transaction can
//! be rolled back without touching the writes of earlier transactions in
//! the same block. `commit_block` folds the staging map into committed
//! state and, for the tree, recomputes the root commitment.

use forge_api::state::{IndexStore, KeyValueStore, StateStore};
use forge_types::error::StateError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Staged writes: `None` marks a deletion of a committed key.
type Staged = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

#[derive(Default, Debug)]
struct Store {
    committed: BTreeMap<Vec<u8>, Vec<u8>>,
    staged: Staged,
    savepoint: Option<Staged>,
}

impl Store {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.staged.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.committed.get(key).cloned(),
        }
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .committed
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        for (k, v) in self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            merged.insert(k.clone(), v.clone());
        }
        merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    fn tx_begin(&mut self) {
        self.savepoint = Some(self.staged.clone());
    }

    fn tx_commit(&mut self) {
        self.savepoint = None;
    }

    fn tx_rollback(&mut self) {
        if let Some(snap) = self.savepoint.take() {
            self.staged = snap;
        }
    }

    fn fold_staged(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        for (k, v) in staged {
            match v {
                Some(v) => {
                    self.committed.insert(k, v);
                }
                None => {
                    self.committed.remove(&k);
                }
            }
        }
        self.savepoint = None;
    }
}

/// An in-memory versioned state tree with a deterministic root commitment.
#[derive(Default, Debug)]
pub struct MemoryTree {
    store: Store,
    version: u64,
    root: Vec<u8>,
}

impl MemoryTree {
    pub fn new() -> Self {
        MemoryTree::default()
    }

    fn compute_root(version: u64, committed: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(version.to_be_bytes());
        for (k, v) in committed {
            hasher.update((k.len() as u64).to_be_bytes());
            hasher.update(k);
            hasher.update((v.len() as u64).to_be_bytes());
            hasher.update(v);
        }
        hasher.finalize().to_vec()
    }
}

impl KeyValueStore for MemoryTree {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.store.get(key))
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.store.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.store.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        Ok(self.store.prefix_scan(prefix))
    }

    fn tx_begin(&mut self) {
        self.store.tx_begin();
    }

    fn tx_commit(&mut self) {
        self.store.tx_commit();
    }

    fn tx_rollback(&mut self) {
        self.store.tx_rollback();
    }

    fn commit_block(&mut self, height: u64) -> Result<(), StateError> {
        self.store.fold_staged();
        self.version = height;
        self.root = Self::compute_root(height, &self.store.committed);
        Ok(())
    }
}

impl StateStore for MemoryTree {
    fn root_hash(&self) -> Vec<u8> {
        self.root.clone()
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// An in-memory auxiliary index store.
#[derive(Default, Debug)]
pub struct MemoryIndex {
    store: Store,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }
}

impl KeyValueStore for MemoryIndex {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.store.get(key))
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.store.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.store.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        Ok(self.store.prefix_scan(prefix))
    }

    fn tx_begin(&mut self) {
        self.store.tx_begin();
    }

    fn tx_commit(&mut self) {
        self.store.tx_commit();
    }

    fn tx_rollback(&mut self) {
        self.store.tx_rollback();
    }

    fn commit_block(&mut self, _height: u64) -> Result<(), StateError> {
        self.store.fold_staged();
        Ok(())
    }
}

impl IndexStore for MemoryIndex {}
