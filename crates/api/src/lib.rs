//! # Forge Engine API
//!
//! Core traits and interfaces for the forge application-logic engine. This
//! crate defines the stable contract between the executor, the system
//! contracts and the external collaborators (storage backends, the ticket
//! manager, the repository synchronizer and the transaction validator).
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

/// The `SystemContract` trait and per-call execution context.
pub mod contract;
/// Storage traits: the versioned state tree and the auxiliary index DB.
pub mod state;
/// The repository-synchronizer seam.
pub mod sync;
/// The read-only ticket-manager seam.
pub mod tickets;
/// The injected transaction validator.
pub mod validator;

pub use contract::{ExecCtx, SystemContract};
pub use state::{IndexStore, KeyValueStore, StateStore};
pub use sync::RepoSyncer;
pub use tickets::TicketManager;
pub use validator::{TxValidator, APPLY_TIME};
