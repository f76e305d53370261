//! The injected transaction validator.

use crate::contract::ExecCtx;
use forge_types::error::ValidationError;
use forge_types::tx::Tx;

/// The index value denoting apply-time validation (as opposed to a mempool
/// position, which is zero or greater).
pub const APPLY_TIME: i64 = -1;

/// Syntactic and consistency validation run before dispatch.
///
/// `index` is `APPLY_TIME` when a committed transaction is being applied,
/// or the transaction's mempool position during pre-checks.
pub trait TxValidator {
    fn validate_tx(
        &self,
        tx: &Tx,
        index: i64,
        ctx: &mut ExecCtx<'_>,
    ) -> Result<(), ValidationError>;
}
