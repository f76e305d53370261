//! Storage backends for the forge engine.
//!
//! The canonical state lives in a versioned tree with a deterministic root
//! commitment; auxiliary indices live in a plain key-value store. Both are
//! defined by the traits in `forge-api`; this crate ships an in-memory
//! implementation of each (used by tests and light tooling) and a
//! `redb`-backed persistent index store.

/// In-memory versioned tree and index store.
pub mod memory;
/// Persistent index store backed by `redb`.
pub mod redb_index;

pub use memory::{MemoryIndex, MemoryTree};
pub use redb_index::RedbIndex;
