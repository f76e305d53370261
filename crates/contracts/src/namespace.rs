//! Namespace acquisition and domain updates.

use crate::common::{credit_account, debit_sender};
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::NamespaceKeeper;
use forge_types::error::ContractError;
use forge_types::tx::{Tx, TxType};
use forge_types::Amount;

/// Handles `TxType::NamespaceAcquire`.
///
/// The acquisition value is credited to the protocol treasury; ownership
/// defaults to the sender unless transferred, with a repo target winning
/// over an account target.
pub struct AcquireNamespaceContract;

impl SystemContract for AcquireNamespaceContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::NamespaceAcquire
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::NamespaceAcquire(t) = tx else {
            return Err(ContractError::Invalid("expected a namespace acquisition".into()));
        };

        let mut ns = NamespaceKeeper::new(&mut *ctx.tree).get(&t.name)?;

        ns.owner = if let Some(repo) = &t.transfer_to_repo {
            repo.clone()
        } else if let Some(addr) = &t.transfer_to_account {
            addr.to_string()
        } else {
            t.common.sender_address().to_string()
        };
        ns.expires_at = chain_height + ctx.params.namespace_ttl;
        ns.grace_end_at = ns.expires_at + ctx.params.namespace_grace_dur;
        ns.domains = t.domains.clone();

        debit_sender(
            ctx,
            &t.common.sender_pub_key,
            t.value,
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;
        let treasury = ctx.params.treasury_address.clone();
        credit_account(ctx, &treasury, t.value, chain_height)?;

        NamespaceKeeper::new(&mut *ctx.tree).update(&t.name, &ns)?;

        tracing::debug!(
            target: "contract",
            tx = "namespace_acquire",
            name = %t.name,
            owner = %ns.owner,
            expires_at = ns.expires_at,
            "namespace acquired"
        );
        Ok(())
    }
}

/// Handles `TxType::NamespaceDomainUpdate`: upserts each domain in the
/// patch, deleting those whose target is empty.
pub struct UpdateNamespaceDomainsContract;

impl SystemContract for UpdateNamespaceDomainsContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::NamespaceDomainUpdate
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::NamespaceDomainUpdate(t) = tx else {
            return Err(ContractError::Invalid("expected a domain update".into()));
        };

        let mut ns = NamespaceKeeper::new(&mut *ctx.tree)
            .find(&t.name)?
            .ok_or_else(|| ContractError::NamespaceNotFound(t.name.clone()))?;

        for (domain, target) in &t.domains {
            if target.is_empty() {
                ns.domains.remove(domain);
            } else {
                ns.domains.insert(domain.clone(), target.clone());
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
        NamespaceKeeper::new(&mut *ctx.tree).update(&t.name, &ns)?;
        Ok(())
    }
}
