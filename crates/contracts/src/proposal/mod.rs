//! Proposal-creation contracts, fee deposits and voting.
//!
//! Every creation contract shares the same skeleton: snapshot the repo's
//! governance config onto a new proposal, seed the creator's deposit,
//! compute the deposit/voting windows, index the ending height for the
//! end-of-block sweep, and apply immediately when the proposal is
//! instantly decidable (sole owner proposing to themselves).

pub mod engine;
pub mod vote;

use crate::common::debit_sender;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::RepoKeeper;
use forge_types::error::ContractError;
use forge_types::proposal::{ProposalAction, RepoProposal};
use forge_types::repo::{Repository, VoterType};
use forge_types::tx::{ProposalCommon, Tx, TxCommon, TxType};
use forge_types::{Address, Amount};

/// Builds a proposal from the repo's current governance config.
///
/// With a fee-deposit phase configured, voting runs for `proposal_duration`
/// blocks after the deposit window; otherwise it starts with the next
/// block. The power age pins voter eligibility to the creation height.
pub(crate) fn build_proposal(
    repo: &Repository,
    action: ProposalAction,
    creator: &Address,
    deposit: Amount,
    height: u64,
) -> RepoProposal {
    let gov = repo.config.governance.clone();
    let mut prop = RepoProposal::new(action, creator.to_string(), gov);

    if !deposit.is_zero() {
        prop.add_fee(creator.as_str(), deposit);
    }
    prop.power_age = height + 1;

    if prop.config.fee_deposit_duration > 0 {
        prop.fee_deposit_end_at = height + prop.config.fee_deposit_duration + 1;
        prop.end_at = prop.fee_deposit_end_at + prop.config.proposal_duration;
    } else {
        prop.end_at = height + prop.config.proposal_duration + 1;
    }
    prop
}

/// Inserts a proposal into the repository, indexes its ending height and
/// applies it immediately when instantly decidable.
pub(crate) fn register_proposal(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    prop_id: &str,
    prop: RepoProposal,
    height: u64,
) -> Result<(), ContractError> {
    if repo.proposals.contains_key(prop_id) {
        return Err(ContractError::ProposalExists(prop_id.to_string()));
    }

    let end_at = prop.end_at;
    let instantly_decidable = prop.config.voter == VoterType::Owner
        && repo.owners.len() == 1
        && repo.owners.contains_key(&prop.creator);
    repo.proposals.insert(prop_id.to_string(), prop);

    RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
        .index_proposal_end(repo_name, prop_id, end_at)?;

    if instantly_decidable {
        engine::maybe_apply_proposal(ctx, repo_name, repo, prop_id, height)?;
    }
    Ok(())
}

/// The shared execution path of the four creation contracts.
fn exec_proposal_creation(
    ctx: &mut ExecCtx<'_>,
    common: &TxCommon,
    pcommon: &ProposalCommon,
    action: ProposalAction,
    height: u64,
) -> Result<(), ContractError> {
    let mut repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
        .find(&pcommon.repo_name)?
        .ok_or_else(|| ContractError::RepoNotFound(pcommon.repo_name.clone()))?;

    debit_sender(
        ctx,
        &common.sender_pub_key,
        pcommon.value,
        common.fee,
        common.nonce,
        height,
    )?;

    let creator = common.sender_address();
    let prop = build_proposal(&repo, action, &creator, pcommon.value, height);
    register_proposal(ctx, &pcommon.repo_name, &mut repo, &pcommon.id, prop, height)?;

    RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).update(&pcommon.repo_name, &repo)?;
    tracing::debug!(
        target: "proposal",
        repo = %pcommon.repo_name,
        id = %pcommon.id,
        creator = %creator,
        "proposal created"
    );
    Ok(())
}

/// Handles `TxType::RepoProposalUpsertOwner`.
pub struct ProposalUpsertOwnerContract;

impl SystemContract for ProposalUpsertOwnerContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalUpsertOwner
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalUpsertOwner(t) = tx else {
            return Err(ContractError::Invalid("expected an owner proposal".into()));
        };
        exec_proposal_creation(
            ctx,
            &t.common,
            &t.proposal,
            ProposalAction::UpsertOwner {
                addresses: t.addresses.clone(),
                veto: t.veto,
            },
            chain_height,
        )
    }
}

/// Handles `TxType::RepoProposalUpdate`.
pub struct ProposalRepoUpdateContract;

impl SystemContract for ProposalRepoUpdateContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalUpdate
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalUpdate(t) = tx else {
            return Err(ContractError::Invalid("expected a repo update proposal".into()));
        };
        exec_proposal_creation(
            ctx,
            &t.common,
            &t.proposal,
            ProposalAction::RepoUpdate {
                config: t.config.clone(),
            },
            chain_height,
        )
    }
}

/// Handles `TxType::RepoProposalRegisterPushKeys`.
pub struct ProposalRegisterPushKeysContract;

impl SystemContract for ProposalRegisterPushKeysContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalRegisterPushKeys
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalRegisterPushKeys(t) = tx else {
            return Err(ContractError::Invalid("expected a push key proposal".into()));
        };
        exec_proposal_creation(
            ctx,
            &t.common,
            &t.proposal,
            ProposalAction::RegisterPushKey {
                ids: t.key_ids.clone(),
                policies: t.policies.clone(),
                fee_mode: t.fee_mode,
                fee_cap: t.fee_cap,
                namespace: t.namespace.clone(),
                namespace_only: t.namespace_only.clone(),
            },
            chain_height,
        )
    }
}

/// Handles `TxType::RepoProposalMergeRequest`.
pub struct ProposalMergeRequestContract;

impl SystemContract for ProposalMergeRequestContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalMergeRequest
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalMergeRequest(t) = tx else {
            return Err(ContractError::Invalid("expected a merge request".into()));
        };
        exec_proposal_creation(
            ctx,
            &t.common,
            &t.proposal,
            ProposalAction::MergeRequest {
                base_branch: t.base_branch.clone(),
                base_branch_hash: t.base_branch_hash.clone(),
                target_branch: t.target_branch.clone(),
                target_branch_hash: t.target_branch_hash.clone(),
            },
            chain_height,
        )
    }
}

/// Handles `TxType::RepoProposalFeeDeposit`.
pub struct ProposalFeeDepositContract;

impl SystemContract for ProposalFeeDepositContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalFeeDeposit
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalFeeDeposit(t) = tx else {
            return Err(ContractError::Invalid("expected a fee deposit".into()));
        };

        let mut repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
            .find(&t.proposal.repo_name)?
            .ok_or_else(|| ContractError::RepoNotFound(t.proposal.repo_name.clone()))?;
        {
            let prop = repo
                .proposals
                .get(&t.proposal.id)
                .ok_or_else(|| ContractError::ProposalNotFound(t.proposal.id.clone()))?;
            if !prop.is_deposit_period(chain_height + 1) {
                return Err(ContractError::DepositPhaseClosed);
            }
        }

        debit_sender(
            ctx,
            &t.common.sender_pub_key,
            t.proposal.value,
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;

        let sender = t.common.sender_address();
        if let Some(prop) = repo.proposals.get_mut(&t.proposal.id) {
            prop.add_fee(sender.as_str(), t.proposal.value);
        }
        RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).update(&t.proposal.repo_name, &repo)?;
        Ok(())
    }
}
