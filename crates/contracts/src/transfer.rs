//! The coin-transfer contract and recipient resolution.

use crate::common::can_exec_coin_transfer;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::{AccountKeeper, NamespaceKeeper, RepoKeeper};
use forge_types::error::ContractError;
use forge_types::tx::{Tx, TxCoinTransfer, TxType};
use forge_types::{Address, BalanceAccount};

/// The resolved destination of a transfer.
enum Recipient {
    Account(Address),
    Repo(String),
}

/// Resolves a recipient operand through the cascade: a namespace URI is
/// replaced by its domain target, then prefixed identifiers select the
/// account or repository keeper, and the canonical bech32 form selects an
/// account directly.
fn resolve_recipient(ctx: &mut ExecCtx<'_>, to: &Address) -> Result<Recipient, ContractError> {
    let mut target = to.clone();

    if target.is_namespace_uri() {
        let (ns_name, domain) = target
            .as_str()
            .split_once('/')
            .ok_or_else(|| ContractError::Invalid(format!("malformed namespace uri: {}", target)))?;
        let ns = NamespaceKeeper::new(&mut *ctx.tree)
            .find(ns_name)?
            .ok_or_else(|| ContractError::NamespaceNotFound(ns_name.to_string()))?;
        let resolved = ns.domains.get(domain).ok_or_else(|| {
            ContractError::Invalid(format!("domain not found in namespace: {}", target))
        })?;
        target = Address::new(resolved.clone());
    }

    if target.is_prefixed_user_address() {
        Ok(Recipient::Account(Address::new(target.strip_prefix())))
    } else if target.is_prefixed_repo_address() {
        Ok(Recipient::Repo(target.strip_prefix().to_string()))
    } else {
        Ok(Recipient::Account(target))
    }
}

/// Handles `TxType::CoinTransfer`.
pub struct CoinTransferContract;

impl SystemContract for CoinTransferContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::CoinTransfer
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::CoinTransfer(t) = tx else {
            return Err(ContractError::Invalid("expected a coin transfer".into()));
        };
        exec_coin_transfer(ctx, t, chain_height)
    }
}

fn exec_coin_transfer(
    ctx: &mut ExecCtx<'_>,
    t: &TxCoinTransfer,
    height: u64,
) -> Result<(), ContractError> {
    let sender_addr = t.common.sender_address();
    let recipient = resolve_recipient(ctx, &t.to)?;

    let mut accounts = AccountKeeper::new(&mut *ctx.tree);
    let mut sender = accounts.get(&sender_addr)?;
    can_exec_coin_transfer(&sender, t.value, t.common.fee, t.common.nonce, height)?;

    sender.balance -= t.value + t.common.fee;
    sender.nonce += 1;
    sender.clean(height);

    match recipient {
        Recipient::Account(addr) if addr == sender_addr => {
            // Self-transfer: the recipient is the same object; net balance
            // only loses the fee, and the nonce still advances.
            sender.balance += t.value;
            accounts.update(&sender_addr, &sender)?;
        }
        Recipient::Account(addr) => {
            accounts.update(&sender_addr, &sender)?;
            let mut rcpt = accounts.get(&addr)?;
            rcpt.balance += t.value;
            rcpt.clean(height);
            accounts.update(&addr, &rcpt)?;
        }
        Recipient::Repo(name) => {
            accounts.update(&sender_addr, &sender)?;
            let mut repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
            let mut repo = repos.get(&name)?;
            repo.balance += t.value;
            repo.clean(height);
            repos.update(&name, &repo)?;
        }
    }

    tracing::debug!(
        target: "contract",
        tx = "coin_transfer",
        from = %sender_addr,
        to = %t.to,
        value = %t.value,
        "transfer applied"
    );
    Ok(())
}
