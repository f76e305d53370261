//! Ticket purchase, unbonding and delegator commission.

use crate::common::can_exec_coin_transfer;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::AccountKeeper;
use forge_types::error::ContractError;
use forge_types::tx::{Tx, TxType};
use forge_types::{BalanceAccount, StakeKind};

/// Handles `TxType::TicketPurchase` for both validator and host tickets.
///
/// The purchase debits only the fee; the ticket value stays on the balance
/// as a bonded stake. Validator stakes schedule their own unbond height;
/// host stakes stay bonded until an explicit unbond transaction.
pub struct TicketPurchaseContract;

impl SystemContract for TicketPurchaseContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::TicketPurchase
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::TicketPurchase(t) = tx else {
            return Err(ContractError::Invalid("expected a ticket purchase".into()));
        };

        let addr = t.common.sender_address();
        let mut accounts = AccountKeeper::new(&mut *ctx.tree);
        let mut acct = accounts.get(&addr)?;
        can_exec_coin_transfer(&acct, t.value, t.common.fee, t.common.nonce, chain_height)?;

        let unbond_height = match t.ticket_type {
            StakeKind::Validator => ctx.params.validator_unbond_height(chain_height),
            StakeKind::Host => 0,
        };

        acct.balance -= t.common.fee;
        let stake_id = acct.stakes.add(t.ticket_type, t.value, unbond_height);
        acct.nonce += 1;
        acct.clean(chain_height);
        accounts.update(&addr, &acct)?;

        tracing::debug!(
            target: "contract",
            tx = "ticket_purchase",
            stake = %stake_id,
            value = %t.value,
            unbond_height,
            "stake bonded"
        );
        Ok(())
    }
}

/// Handles `TxType::TicketUnbond`: schedules the thaw of a host stake.
pub struct TicketUnbondContract;

impl SystemContract for TicketUnbondContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::TicketUnbond
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::TicketUnbond(t) = tx else {
            return Err(ContractError::Invalid("expected a ticket unbond".into()));
        };

        let ticket = ctx
            .tickets
            .get_by_hash(&t.ticket_hash)
            .ok_or(ContractError::TicketNotFound)?;

        let addr = t.common.sender_address();
        let unbond_height = ctx.params.host_unbond_height(chain_height);
        let mut accounts = AccountKeeper::new(&mut *ctx.tree);
        let mut acct = accounts.get(&addr)?;
        can_exec_coin_transfer(
            &acct,
            forge_types::Amount::zero(),
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;

        let stake = acct
            .stakes
            .first_bonded_host(&ticket.value)
            .ok_or(ContractError::StakeNotFound)?;
        stake.unbond_height = unbond_height;

        acct.balance -= t.common.fee;
        acct.nonce += 1;
        acct.clean(chain_height);
        accounts.update(&addr, &acct)?;

        tracing::debug!(
            target: "contract",
            tx = "ticket_unbond",
            ticket = %t.ticket_hash,
            unbond_height,
            "host stake unbonding"
        );
        Ok(())
    }
}

/// Handles `TxType::SetDelegatorCommission`.
pub struct SetDelegatorCommissionContract;

impl SystemContract for SetDelegatorCommissionContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::SetDelegatorCommission
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::SetDelegatorCommission(t) = tx else {
            return Err(ContractError::Invalid("expected a commission update".into()));
        };

        let addr = t.common.sender_address();
        let mut accounts = AccountKeeper::new(&mut *ctx.tree);
        let mut acct = accounts.get(&addr)?;
        can_exec_coin_transfer(
            &acct,
            forge_types::Amount::zero(),
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;

        acct.delegator_commission = t.commission;
        acct.balance -= t.common.fee;
        acct.nonce += 1;
        acct.clean(chain_height);
        accounts.update(&addr, &acct)?;
        Ok(())
    }
}
