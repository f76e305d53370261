//! Core data structures for the forge application-logic engine.
//!
//! Everything that is persisted to the state tree or carried inside a
//! transaction lives here, together with the canonical codec, the
//! well-known state keys and the error types shared by the rest of the
//! workspace.

/// Account entity, stakes and the `BalanceAccount` capability.
pub mod account;
/// Addresses, public keys and on-chain identifiers.
pub mod address;
/// Canonical MsgPack codec for all persisted state.
pub mod codec;
/// Core error types and consensus response codes.
pub mod error;
/// Well-known state-key prefixes and key builders.
pub mod keys;
/// Namespace entity.
pub mod namespace;
/// The global, immutable parameter set.
pub mod params;
/// Repository proposals, actions, outcomes and votes.
pub mod proposal;
/// Push note and pushed reference payloads.
pub mod push;
/// Push-key entity.
pub mod pushkey;
/// Repository entity and governance configuration.
pub mod repo;
/// System metadata entities (block info, validator snapshots).
pub mod system;
/// Ticket data returned by the ticket manager.
pub mod ticket;
/// Decimal token amounts.
pub mod token;
/// The transaction model.
pub mod tx;

pub use account::{Account, AccountStakes, BalanceAccount, StakeInfo, StakeKind};
pub use address::{Address, PublicKey};
pub use token::Amount;
