//! The push-note contract: applies a batch of reference updates to a
//! repository, charges per-reference fees, maintains issue metadata and
//! merge-request proposals, and finally hands the note to the repository
//! synchronizer to merge the physical objects.

use crate::common::can_exec_coin_transfer;
use crate::proposal::register_proposal;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::{AccountKeeper, RepoKeeper};
use forge_types::error::ContractError;
use forge_types::proposal::ProposalAction;
use forge_types::push::{
    is_issue_reference, is_merge_request_reference, reference_short_name, PushedReference,
};
use forge_types::repo::{Reference, Repository};
use forge_types::tx::{Tx, TxType};
use forge_types::{Account, Address, Amount, BalanceAccount};

/// Handles `TxType::Push`.
pub struct PushContract;

impl SystemContract for PushContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::Push
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::Push(t) = tx else {
            return Err(ContractError::Invalid("expected a push".into()));
        };
        let note = &t.note;

        let mut repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
            .find(&note.repo_name)?
            .ok_or_else(|| ContractError::RepoNotFound(note.repo_name.clone()))?;

        let pusher_addr = t.common.sender_address();
        let mut pusher = AccountKeeper::new(&mut *ctx.tree).get(&pusher_addr)?;
        // The note fee equals the per-reference sum (validated), so the
        // spendability check covers the debits taken in the loop below.
        can_exec_coin_transfer(
            &pusher,
            Amount::zero(),
            note.total_reference_fees(),
            t.common.nonce,
            chain_height,
        )?;

        let mut fees_due = Amount::zero();
        for pushed in &note.references {
            let existing = repo.references.get(&pushed.name).cloned();

            if existing.is_some() && pushed.is_deletable() {
                repo.references.remove(&pushed.name);
                fees_due += pushed.fee;
                continue;
            }

            let mut reference = existing.unwrap_or_default();
            if reference.creator.is_empty() {
                reference.creator = note.pusher_key_id.clone();
            }

            if is_issue_reference(&pushed.name) {
                apply_issue_data(&mut reference, pushed);
            }

            if is_merge_request_reference(&pushed.name) {
                upsert_merge_proposal(
                    ctx,
                    &note.repo_name,
                    &mut repo,
                    &mut pusher,
                    &pusher_addr,
                    pushed,
                    chain_height,
                )?;
            }

            fees_due += pushed.fee;
            reference.nonce += 1;
            reference.hash = pushed.new_hash.clone();
            repo.references.insert(pushed.name.clone(), reference);
        }

        repo.updated_at = chain_height + 1;

        pusher.balance -= fees_due;
        pusher.nonce += 1;
        pusher.clean(chain_height);
        AccountKeeper::new(&mut *ctx.tree).update(&pusher_addr, &pusher)?;
        RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).update(&note.repo_name, &repo)?;

        tracing::debug!(
            target: "contract",
            tx = "push",
            repo = %note.repo_name,
            refs = note.references.len(),
            fees = %fees_due,
            "push note applied"
        );

        // Merge the pushed objects into the physical repository. A missing
        // object surfaces the replication sentinel to the executor.
        ctx.syncer.exec_tx_push(note)?;
        Ok(())
    }
}

/// Applies close/label/assignee deltas to an issue reference. Entries
/// prefixed `-` remove; bare entries add idempotently.
fn apply_issue_data(reference: &mut Reference, pushed: &PushedReference) {
    if let Some(close) = pushed.data.close {
        reference.data.closed = close;
    }
    if let Some(labels) = &pushed.data.labels {
        apply_deltas(&mut reference.data.labels, labels);
    }
    if let Some(assignees) = &pushed.data.assignees {
        apply_deltas(&mut reference.data.assignees, assignees);
    }
}

fn apply_deltas(current: &mut Vec<String>, deltas: &[String]) {
    for delta in deltas {
        if let Some(removed) = delta.strip_prefix('-') {
            current.retain(|v| v != removed);
        } else if !current.iter().any(|v| v == delta) {
            current.push(delta.clone());
        }
    }
}

/// Creates or updates the merge proposal tied to a merge-request reference.
/// Creation charges the reference's value as the proposal deposit.
fn upsert_merge_proposal(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    pusher: &mut Account,
    pusher_addr: &Address,
    pushed: &PushedReference,
    height: u64,
) -> Result<(), ContractError> {
    let prop_id = reference_short_name(&pushed.name).to_string();
    let action = ProposalAction::MergeRequest {
        base_branch: pushed.data.base_branch.clone().unwrap_or_default(),
        base_branch_hash: pushed.data.base_branch_hash.clone().unwrap_or_default(),
        target_branch: pushed.data.target_branch.clone().unwrap_or_default(),
        target_branch_hash: pushed.data.target_branch_hash.clone().unwrap_or_default(),
    };

    if let Some(existing) = repo.proposals.get_mut(&prop_id) {
        if existing.is_finalized() {
            return Err(ContractError::ProposalClosed);
        }
        existing.action = action;
        return Ok(());
    }

    if pusher.balance < pushed.value {
        return Err(ContractError::InsufficientBalance {
            spendable: pusher.balance.to_string(),
            required: pushed.value.to_string(),
        });
    }
    let prop = crate::proposal::build_proposal(repo, action, pusher_addr, pushed.value, height);
    pusher.balance -= pushed.value;

    // An instantly-decided proposal settles fees against persisted account
    // state, so flush the pusher first and reload afterwards.
    AccountKeeper::new(&mut *ctx.tree).update(pusher_addr, pusher)?;
    register_proposal(ctx, repo_name, repo, &prop_id, prop, height)?;
    *pusher = AccountKeeper::new(&mut *ctx.tree).get(pusher_addr)?;
    Ok(())
}
