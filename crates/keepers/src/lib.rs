//! Typed entity keepers.
//!
//! Keepers are the only components that touch raw state keys. Each is a
//! thin, short-lived view constructed over a borrowed store, decoding and
//! encoding entities through the canonical codec. Contracts follow a
//! read–mutate–write-back pattern: load an entity, change the local value,
//! persist it through the same keeper.

/// Account keeper.
pub mod account;
/// Namespace keeper.
pub mod namespace;
/// Push-key keeper.
pub mod pushkey;
/// Repository keeper, including the proposal indices.
pub mod repo;
/// System-metadata keeper.
pub mod system;
/// Validator-set keeper.
pub mod validator;

pub use account::AccountKeeper;
pub use namespace::NamespaceKeeper;
pub use pushkey::PushKeyKeeper;
pub use repo::RepoKeeper;
pub use system::SystemKeeper;
pub use validator::ValidatorKeeper;

use forge_types::codec;
use forge_types::error::StateError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn encode<T: Serialize>(v: &T) -> Result<Vec<u8>, StateError> {
    codec::to_bytes_canonical(v).map_err(StateError::Encode)
}

pub(crate) fn decode<T: DeserializeOwned>(b: &[u8]) -> Result<T, StateError> {
    codec::from_bytes_canonical(b).map_err(StateError::Decode)
}
