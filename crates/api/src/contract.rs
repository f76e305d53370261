//! The system-contract interface and per-call execution context.

use crate::state::{IndexStore, StateStore};
use crate::sync::RepoSyncer;
use crate::tickets::TicketManager;
use forge_types::error::ContractError;
use forge_types::params::Params;
use forge_types::tx::{Tx, TxType};

/// Everything a contract may touch while executing one transaction.
///
/// The engine is single-threaded within a block; the context borrows the
/// stores mutably for the duration of one `exec` call and nothing else runs
/// concurrently.
pub struct ExecCtx<'a> {
    /// The canonical state tree.
    pub tree: &'a mut dyn StateStore,
    /// The auxiliary index database.
    pub index: &'a mut dyn IndexStore,
    /// Read-only ticket data.
    pub tickets: &'a dyn TicketManager,
    /// The physical repository store.
    pub syncer: &'a dyn RepoSyncer,
    /// The immutable network parameters.
    pub params: &'a Params,
}

/// A system contract handling exactly one transaction type.
///
/// Contracts are stateless singletons registered in a fixed order; the
/// executor instantiates nothing, it invokes the first contract whose
/// `can_exec` matches the transaction type. All per-call state lives in
/// locals of `exec`.
pub trait SystemContract: Send + Sync {
    /// True when this contract handles transactions of type `ty`.
    fn can_exec(&self, ty: TxType) -> bool;

    /// Executes `tx` against the state at `chain_height`.
    fn exec(&self, ctx: &mut ExecCtx<'_>, tx: &Tx, chain_height: u64)
        -> Result<(), ContractError>;
}
