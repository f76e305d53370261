//! Push-key registration and update/delete.

use crate::common::debit_sender;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::PushKeyKeeper;
use forge_types::error::ContractError;
use forge_types::pushkey::PushKey;
use forge_types::tx::{Tx, TxType};
use forge_types::Amount;

/// Handles `TxType::RegisterPushKey`.
pub struct RegisterPushKeyContract;

impl SystemContract for RegisterPushKeyContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RegisterPushKey
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RegisterPushKey(t) = tx else {
            return Err(ContractError::Invalid("expected a push key registration".into()));
        };

        let id = t.pub_key.to_push_key_id();
        {
            let keeper = PushKeyKeeper::new(&mut *ctx.tree);
            if keeper.get(&id)?.is_some() {
                return Err(ContractError::Invalid(format!(
                    "push key already registered: {}",
                    id
                )));
            }
        }

        debit_sender(
            ctx,
            &t.common.sender_pub_key,
            Amount::zero(),
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;

        let key = PushKey {
            pub_key: t.pub_key,
            address: t.common.sender_address(),
            scopes: t.scopes.clone(),
            fee_cap: t.fee_cap,
        };
        PushKeyKeeper::new(&mut *ctx.tree).update(&id, &key)?;

        tracing::debug!(target: "contract", tx = "register_push_key", id = %id, "push key registered");
        Ok(())
    }
}

/// Handles `TxType::UpDelPushKey`: deletes a key, or edits its scopes and
/// fee cap. Scope removals are applied from the highest index down so the
/// indices stay valid as elements shift.
pub struct UpDelPushKeyContract;

impl SystemContract for UpDelPushKeyContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::UpDelPushKey
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::UpDelPushKey(t) = tx else {
            return Err(ContractError::Invalid("expected a push key update".into()));
        };

        let mut key = PushKeyKeeper::new(&mut *ctx.tree)
            .get(&t.id)?
            .ok_or_else(|| ContractError::PushKeyNotFound(t.id.clone()))?;
        if key.address != t.common.sender_address() {
            return Err(ContractError::Invalid(
                "sender is not the owner of the push key".into(),
            ));
        }

        debit_sender(
            ctx,
            &t.common.sender_pub_key,
            Amount::zero(),
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;

        let mut keeper = PushKeyKeeper::new(&mut *ctx.tree);
        if t.delete {
            keeper.remove(&t.id)?;
            tracing::debug!(target: "contract", tx = "up_del_push_key", id = %t.id, "push key removed");
            return Ok(());
        }

        key.remove_scopes(t.remove_scopes.clone());
        key.scopes.extend(t.add_scopes.iter().cloned());
        if let Some(cap) = t.fee_cap {
            key.fee_cap = cap;
        }
        keeper.update(&t.id, &key)?;
        Ok(())
    }
}
