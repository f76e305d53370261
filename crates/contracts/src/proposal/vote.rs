//! The proposal-vote contract and the tally methods.

use crate::common::debit_sender;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::{AccountKeeper, RepoKeeper};
use forge_types::error::ContractError;
use forge_types::proposal::{ProposalVoteRecord, RepoProposal, VoteChoice};
use forge_types::repo::{TallyMethod, VoterType};
use forge_types::tx::{Tx, TxRepoProposalVote, TxType};
use forge_types::{Address, Amount, PublicKey};

/// Handles `TxType::RepoProposalVote`.
pub struct ProposalVoteContract;

impl SystemContract for ProposalVoteContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoProposalVote
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoProposalVote(t) = tx else {
            return Err(ContractError::Invalid("expected a proposal vote".into()));
        };
        exec_vote(ctx, t, chain_height)
    }
}

fn exec_vote(
    ctx: &mut ExecCtx<'_>,
    t: &TxRepoProposalVote,
    height: u64,
) -> Result<(), ContractError> {
    let mut repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
        .find(&t.repo_name)?
        .ok_or_else(|| ContractError::RepoNotFound(t.repo_name.clone()))?;
    let mut prop = repo
        .proposals
        .get(&t.proposal_id)
        .cloned()
        .ok_or_else(|| ContractError::ProposalNotFound(t.proposal_id.clone()))?;

    if prop.is_finalized() || height + 1 > prop.end_at {
        return Err(ContractError::ProposalClosed);
    }
    if prop.is_deposit_period(height + 1) {
        return Err(ContractError::DepositPhaseActive);
    }

    let sender_addr = t.common.sender_address();
    let pk = t.common.sender_pub_key;

    check_eligibility(&repo, &prop, &sender_addr, t.vote)?;

    {
        let repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
        if repos
            .get_proposal_vote(&t.repo_name, &t.proposal_id, sender_addr.as_str())?
            .is_some()
        {
            return Err(ContractError::AlreadyVoted(t.proposal_id.clone()));
        }
    }

    let weight = if t.vote == VoteChoice::NoWithVetoByOwners {
        // The owners' veto always carries owner-weight 1.
        1.0
    } else {
        compute_vote_weight(
            ctx,
            &t.repo_name,
            &t.proposal_id,
            &mut prop,
            &pk,
            &sender_addr,
        )?
    };

    add_to_side(&mut prop, t.vote, weight);
    RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).index_proposal_vote(
        &t.repo_name,
        &t.proposal_id,
        sender_addr.as_str(),
        &ProposalVoteRecord {
            choice: t.vote,
            weight,
        },
    )?;

    debit_sender(
        ctx,
        &pk,
        Amount::zero(),
        t.common.fee,
        t.common.nonce,
        height,
    )?;

    repo.proposals.insert(t.proposal_id.clone(), prop);
    RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).update(&t.repo_name, &repo)?;

    tracing::debug!(
        target: "proposal",
        repo = %t.repo_name,
        id = %t.proposal_id,
        voter = %sender_addr,
        choice = ?t.vote,
        weight,
        "vote recorded"
    );
    Ok(())
}

/// Verifies that the sender belongs to the proposal's voter population and
/// that the chosen side is available to them.
fn check_eligibility(
    repo: &forge_types::repo::Repository,
    prop: &RepoProposal,
    sender: &Address,
    choice: VoteChoice,
) -> Result<(), ContractError> {
    if choice == VoteChoice::NoWithVetoByOwners {
        if prop.config.voter != VoterType::NetStakersAndVetoOwner {
            return Err(ContractError::Invalid(
                "the owners' veto is not available under this voter set".into(),
            ));
        }
        let owner = repo.owners.get(sender.as_str()).ok_or(ContractError::NotAVoter)?;
        if !owner.veto {
            return Err(ContractError::NotAVoter);
        }
        return Ok(());
    }

    if prop.config.voter == VoterType::Owner {
        let owner = repo.owners.get(sender.as_str()).ok_or(ContractError::NotAVoter)?;
        if prop.power_age > 0 && owner.joined_at > prop.power_age {
            return Err(ContractError::NotAVoter);
        }
    }
    Ok(())
}

/// Converts the vote into its numeric weight per the proposal's tally
/// method.
fn compute_vote_weight(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    prop_id: &str,
    prop: &mut RepoProposal,
    pk: &PublicKey,
    sender: &Address,
) -> Result<f64, ContractError> {
    match prop.config.tally_method {
        TallyMethod::Identity => Ok(1.0),
        TallyMethod::CoinWeighted => {
            let acct = AccountKeeper::new(&mut *ctx.tree).get(sender)?;
            Ok(acct.balance.to_f64())
        }
        TallyMethod::NetStakeOfProposer => Ok(ctx
            .tickets
            .value_of_non_delegated_tickets(pk, prop.power_age)?),
        TallyMethod::NetStakeOfDelegators => {
            Ok(ctx.tickets.value_of_delegated_tickets(pk, prop.power_age)?)
        }
        TallyMethod::NetStake => net_stake_weight(ctx, repo_name, prop_id, prop, pk, sender),
    }
}

/// Full net-stake weighting with the last-voter-wins correction.
///
/// A delegated ticket belongs to its delegator by default. When the other
/// party of a ticket has already voted, their recorded weight is pulled off
/// their side and handed to the current voter, so whichever of
/// {proposer, delegator} voted last controls the stake.
fn net_stake_weight(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    prop_id: &str,
    prop: &mut RepoProposal,
    pk: &PublicKey,
    sender: &Address,
) -> Result<f64, ContractError> {
    let tickets = ctx.tickets.get_non_decayed_tickets(pk, prop.power_age)?;
    let mut weight = 0.0;

    for ticket in &tickets {
        let owned_by_voter = if ticket.is_delegated() {
            ticket.delegator == *sender
        } else {
            ticket.proposer_pub_key == *pk
        };
        if owned_by_voter {
            weight += ticket.value.to_f64();
        }
    }

    let mut repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
    for ticket in &tickets {
        if !ticket.is_delegated() {
            continue;
        }
        let counterpart = if ticket.proposer_pub_key == *pk {
            ticket.delegator.clone()
        } else {
            ticket.proposer_pub_key.to_address()
        };
        if counterpart == *sender {
            continue;
        }

        let Some(prev) = repos.get_proposal_vote(repo_name, prop_id, counterpart.as_str())? else {
            continue;
        };
        if prev.weight <= 0.0 {
            continue;
        }

        subtract_from_side(prop, prev.choice, prev.weight);
        weight += prev.weight;
        repos.index_proposal_vote(
            repo_name,
            prop_id,
            counterpart.as_str(),
            &ProposalVoteRecord {
                choice: prev.choice,
                weight: 0.0,
            },
        )?;
    }
    Ok(weight)
}

fn add_to_side(prop: &mut RepoProposal, choice: VoteChoice, weight: f64) {
    match choice {
        VoteChoice::Yes => prop.yes += weight,
        VoteChoice::No => prop.no += weight,
        VoteChoice::NoWithVeto => prop.no_with_veto += weight,
        VoteChoice::Abstain => prop.abstain += weight,
        VoteChoice::NoWithVetoByOwners => prop.no_with_veto_by_owners += weight,
    }
}

fn subtract_from_side(prop: &mut RepoProposal, choice: VoteChoice, weight: f64) {
    match choice {
        VoteChoice::Yes => prop.yes -= weight,
        VoteChoice::No => prop.no -= weight,
        VoteChoice::NoWithVeto => prop.no_with_veto -= weight,
        VoteChoice::Abstain => prop.abstain -= weight,
        VoteChoice::NoWithVetoByOwners => prop.no_with_veto_by_owners -= weight,
    }
}
