//! The transaction executor: the single entry point the consensus driver
//! calls for every committed transaction, plus the end-of-block sweep and
//! the block-commit boundary.

/// End-of-block proposal sweep.
pub mod end_block;
/// In-memory engine construction for tests and tooling.
pub mod testutil;
/// Apply-time transaction validation.
pub mod validation;

use forge_api::{
    ExecCtx, IndexStore, RepoSyncer, StateStore, SystemContract, TicketManager, TxValidator,
    APPLY_TIME,
};
use forge_keepers::SystemKeeper;
use forge_types::error::{codes, ContractError, StateError};
use forge_types::params::Params;
use forge_types::system::BlockInfo;
use forge_types::tx::{Tx, TxResponse};

/// The deterministic state-transition engine.
///
/// Owns the storage backends, the contract registry and the injected
/// collaborators. Execution is strictly sequential: the consensus driver
/// delivers one transaction at a time, then runs the end-of-block sweep,
/// then commits the block.
pub struct Executor {
    tree: Box<dyn StateStore>,
    index: Box<dyn IndexStore>,
    tickets: Box<dyn TicketManager>,
    syncer: Box<dyn RepoSyncer>,
    validator: Box<dyn TxValidator>,
    contracts: Vec<Box<dyn SystemContract>>,
    params: Params,
}

impl Executor {
    /// Builds an executor with the standard contract registry and the
    /// standard apply-time validator.
    pub fn new(
        tree: Box<dyn StateStore>,
        index: Box<dyn IndexStore>,
        tickets: Box<dyn TicketManager>,
        syncer: Box<dyn RepoSyncer>,
        params: Params,
    ) -> Self {
        Executor {
            tree,
            index,
            tickets,
            syncer,
            validator: Box::new(validation::StdTxValidator),
            contracts: forge_contracts::system_contracts(),
            params,
        }
    }

    /// Replaces the injected validator.
    pub fn with_validator(mut self, validator: Box<dyn TxValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Direct tree access for genesis seeding and tests.
    pub fn tree_mut(&mut self) -> &mut dyn StateStore {
        self.tree.as_mut()
    }

    /// Direct index access for genesis seeding and tests.
    pub fn index_mut(&mut self) -> &mut dyn IndexStore {
        self.index.as_mut()
    }

    /// Simultaneous access to both stores, for keepers that span them.
    pub fn stores_mut(&mut self) -> (&mut dyn StateStore, &mut dyn IndexStore) {
        (self.tree.as_mut(), self.index.as_mut())
    }

    /// Validates and executes one committed transaction against the state
    /// at `chain_height`, returning the response code and log for the
    /// consensus driver. Failed transactions leave no partial writes.
    pub fn exec_tx(&mut self, tx: &Tx, chain_height: u64) -> TxResponse {
        let mut ctx = ExecCtx {
            tree: self.tree.as_mut(),
            index: self.index.as_mut(),
            tickets: self.tickets.as_ref(),
            syncer: self.syncer.as_ref(),
            params: &self.params,
        };

        if let Err(e) = self.validator.validate_tx(tx, APPLY_TIME, &mut ctx) {
            return TxResponse::failure(
                codes::FAILED_DECODE,
                format!("tx failed validation: {}", e),
            );
        }

        let Some(contract) = self.contracts.iter().find(|c| c.can_exec(tx.tx_type())) else {
            return TxResponse::failure(
                codes::EXEC_FAILURE,
                "failed to execute tx: no executor found".to_string(),
            );
        };

        ctx.tree.tx_begin();
        ctx.index.tx_begin();
        match contract.exec(&mut ctx, tx, chain_height) {
            Ok(()) => {
                ctx.tree.tx_commit();
                ctx.index.tx_commit();
                TxResponse::ok()
            }
            Err(e) => {
                ctx.tree.tx_rollback();
                ctx.index.tx_rollback();
                let code = if e.is_object_not_found() {
                    // The push referenced an object not yet replicated;
                    // consensus retries the block after replication.
                    codes::RE_EXEC_BLOCK
                } else {
                    codes::EXEC_FAILURE
                };
                tracing::debug!(
                    target: "executor",
                    tx_type = %tx.tx_type(),
                    code,
                    error = %e,
                    "transaction rejected"
                );
                TxResponse::failure(code, e.to_string())
            }
        }
    }

    /// Runs the end-of-block hook for the block at `height`: settles every
    /// proposal whose voting closed at this height. Errors abort the block
    /// commit.
    pub fn end_block(&mut self, height: u64) -> Result<(), ContractError> {
        let mut ctx = ExecCtx {
            tree: self.tree.as_mut(),
            index: self.index.as_mut(),
            tickets: self.tickets.as_ref(),
            syncer: self.syncer.as_ref(),
            params: &self.params,
        };
        end_block::maybe_apply_ended_proposals(&mut ctx, height)
    }

    /// Metadata of the most recently committed block.
    pub fn last_block_info(&mut self) -> Result<Option<BlockInfo>, StateError> {
        SystemKeeper::new(self.tree.as_mut(), self.index.as_mut()).get_last_block_info()
    }

    /// Atomically commits every staged write as the state of `height` and
    /// records the block info. Returns the committed block metadata.
    pub fn commit_block(&mut self, height: u64, time: u64) -> Result<BlockInfo, StateError> {
        self.tree.commit_block(height)?;
        let info = BlockInfo {
            height,
            app_hash: self.tree.root_hash(),
            time,
        };
        SystemKeeper::new(self.tree.as_mut(), self.index.as_mut()).set_last_block_info(&info)?;
        self.index.commit_block(height)?;

        tracing::info!(
            target: "executor",
            event = "commit",
            height,
            app_hash = %hex::encode(&info.app_hash),
            "block committed"
        );
        Ok(info)
    }
}
