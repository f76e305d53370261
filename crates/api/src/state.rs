//! Core traits for state management.
//!
//! Two stores back the engine: a versioned state tree holding canonical,
//! consensus-critical entities, and an auxiliary index database holding
//! node-local indices (proposal ending heights, recorded votes, validator
//! sets per height). Both expose the same transactional surface: writes are
//! staged, bracketed per transaction by `tx_begin`/`tx_commit`/`tx_rollback`,
//! and flushed atomically by `commit_block`.

use forge_types::error::StateError;

/// Basic transactional key-value access shared by both stores.
pub trait KeyValueStore {
    /// Retrieves a value, consulting staged writes before committed state.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Stages a key-value pair.
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;

    /// Stages a deletion.
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError>;

    /// Returns all pairs whose key starts with `prefix`, in key order.
    ///
    /// Returns a vector rather than an iterator to stay object-safe; scans
    /// in the engine are small (one height's proposals, one repo's votes).
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError>;

    /// Opens a savepoint covering one transaction's writes.
    fn tx_begin(&mut self);

    /// Keeps the writes staged since the last `tx_begin`.
    fn tx_commit(&mut self);

    /// Discards the writes staged since the last `tx_begin`.
    fn tx_rollback(&mut self);

    /// Atomically persists every staged write as the state of `height`.
    fn commit_block(&mut self, height: u64) -> Result<(), StateError>;
}

/// The versioned state tree holding canonical entities.
pub trait StateStore: KeyValueStore {
    /// The root commitment over the latest committed version.
    fn root_hash(&self) -> Vec<u8>;

    /// The height of the latest committed version.
    fn version(&self) -> u64;
}

/// The auxiliary index database.
pub trait IndexStore: KeyValueStore {}
