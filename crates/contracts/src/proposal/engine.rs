//! The proposal sub-engine: tally evaluation, outcome decision, action
//! application and fee settlement.

use forge_api::ExecCtx;
use forge_keepers::{AccountKeeper, NamespaceKeeper, RepoKeeper, SystemKeeper};
use forge_types::error::ContractError;
use forge_types::proposal::{ProposalAction, ProposalOutcome, RepoProposal};
use forge_types::repo::{Contributor, FeeMode, Repository, VoterType};
use forge_types::{Address, Amount, BalanceAccount};

/// Number of owners eligible to vote given the proposal's power-age cap.
fn eligible_owner_count(repo: &Repository, power_age: u64) -> f64 {
    repo.owners
        .values()
        .filter(|o| power_age == 0 || o.joined_at <= power_age)
        .count() as f64
}

/// Total voting power of the proposal's voter population.
fn total_voting_power(
    ctx: &mut ExecCtx<'_>,
    repo: &Repository,
    prop: &RepoProposal,
) -> Result<f64, ContractError> {
    match prop.config.voter {
        VoterType::Owner => Ok(eligible_owner_count(repo, prop.power_age)),
        VoterType::NetStakers | VoterType::NetStakersAndVetoOwner => {
            Ok(ctx.tickets.value_of_all_tickets(prop.power_age)?)
        }
    }
}

/// Decides the outcome of a closed proposal from its tallies.
///
/// The checks are ordered: quorum, stakeholder veto, owners' veto, then the
/// threshold comparison.
pub fn determine_outcome(
    ctx: &mut ExecCtx<'_>,
    repo: &Repository,
    prop: &RepoProposal,
) -> Result<ProposalOutcome, ContractError> {
    let total_power = total_voting_power(ctx, repo, prop)?;
    let received = prop.yes + prop.no + prop.no_with_veto;

    let quorum = (total_power * prop.config.quorum / 100.0).round();
    let threshold = (received * prop.config.threshold / 100.0).round();
    let veto_quorum = (received * prop.config.veto_quorum / 100.0).round();
    let veto_owner_quorum =
        (repo.owners.len() as f64 * prop.config.veto_owners_quorum / 100.0).round();

    if received < quorum {
        return Ok(ProposalOutcome::QuorumNotMet);
    }
    if prop.no_with_veto > 0.0 && prop.no_with_veto >= veto_quorum {
        return Ok(ProposalOutcome::RejectedWithVeto);
    }
    if prop.config.voter == VoterType::NetStakersAndVetoOwner
        && prop.no_with_veto_by_owners > 0.0
        && prop.no_with_veto_by_owners >= veto_owner_quorum
    {
        return Ok(ProposalOutcome::RejectedWithVetoByOwners);
    }
    if prop.yes >= threshold && prop.no < threshold {
        return Ok(ProposalOutcome::Accepted);
    }
    if prop.no >= threshold && prop.yes < threshold {
        return Ok(ProposalOutcome::Rejected);
    }
    Ok(ProposalOutcome::BelowThreshold)
}

/// Evaluates a proposal at `chain_height`, applying its action or settling
/// its fees when it has closed. Returns `true` only when the action was
/// applied. Already-finalized proposals are left untouched.
pub fn maybe_apply_proposal(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    prop_id: &str,
    chain_height: u64,
) -> Result<bool, ContractError> {
    let mut prop = repo
        .proposals
        .get(prop_id)
        .cloned()
        .ok_or_else(|| ContractError::ProposalNotFound(prop_id.to_string()))?;
    let applied = maybe_apply_inner(ctx, repo_name, repo, prop_id, &mut prop, chain_height)?;
    repo.proposals.insert(prop_id.to_string(), prop);
    Ok(applied)
}

fn maybe_apply_inner(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    prop_id: &str,
    prop: &mut RepoProposal,
    chain_height: u64,
) -> Result<bool, ContractError> {
    if prop.is_finalized() {
        return Ok(false);
    }

    // An expired deposit phase with an insufficient total voids the
    // proposal and returns every deposit.
    let prop_fee = prop.config.proposal_fee;
    if !prop_fee.is_zero()
        && chain_height + 1 > prop.fee_deposit_end_at
        && prop.total_fees() < prop_fee
    {
        prop.outcome = Some(ProposalOutcome::InsufficientDeposit);
        refund_deposits(ctx, prop, chain_height)?;
        tracing::info!(
            target: "proposal",
            repo = repo_name,
            id = prop_id,
            "insufficient deposit; proposal voided and deposits refunded"
        );
        return Ok(false);
    }

    let sole_owner_creator = prop.config.voter == VoterType::Owner
        && repo.owners.len() == 1
        && repo.owners.contains_key(&prop.creator);

    let outcome = if sole_owner_creator {
        prop.yes += 1.0;
        ProposalOutcome::Accepted
    } else {
        if prop.end_at > chain_height + 1 {
            return Ok(false);
        }
        determine_outcome(ctx, repo, prop)?
    };

    prop.outcome = Some(outcome);
    tracing::info!(
        target: "proposal",
        repo = repo_name,
        id = prop_id,
        outcome = ?outcome,
        yes = prop.yes,
        no = prop.no,
        no_with_veto = prop.no_with_veto,
        "proposal settled"
    );

    if outcome != ProposalOutcome::Accepted {
        settle_fees(ctx, repo_name, repo, prop, outcome, chain_height)?;
        return Ok(false);
    }

    apply_proposal_action(ctx, repo, prop, chain_height)?;
    settle_fees(ctx, repo_name, repo, prop, outcome, chain_height)?;
    Ok(true)
}

/// Applies an accepted proposal's action to the repository.
fn apply_proposal_action(
    ctx: &mut ExecCtx<'_>,
    repo: &mut Repository,
    prop: &RepoProposal,
    chain_height: u64,
) -> Result<(), ContractError> {
    match &prop.action {
        ProposalAction::UpsertOwner { addresses, veto } => {
            for addr in addresses {
                repo.upsert_owner(addr, *veto, chain_height + 1, false);
            }
        }
        ProposalAction::RepoUpdate { config } => {
            config.apply_to(&mut repo.config);
        }
        ProposalAction::RegisterPushKey {
            ids,
            policies,
            fee_mode,
            fee_cap,
            namespace,
            namespace_only,
        } => {
            let contrib = Contributor {
                policies: policies.clone(),
                fee_mode: *fee_mode,
                fee_cap: if *fee_mode == FeeMode::RepoPaysCapped {
                    *fee_cap
                } else {
                    Amount::zero()
                },
                fee_used: Amount::zero(),
            };

            if namespace_only.is_none() {
                for id in ids {
                    repo.contributors.insert(id.clone(), contrib.clone());
                }
            }

            if let Some(ns_name) = namespace_only.as_ref().or(namespace.as_ref()) {
                let mut namespaces = NamespaceKeeper::new(&mut *ctx.tree);
                let mut ns = match namespaces.find(ns_name) {
                    Ok(Some(ns)) => ns,
                    Ok(None) => panic!(
                        "corrupt state: namespace {} named by accepted proposal does not exist",
                        ns_name
                    ),
                    Err(e) => return Err(e.into()),
                };
                for id in ids {
                    ns.contributors.insert(id.clone(), contrib.clone());
                }
                namespaces.update(ns_name, &ns)?;
            }
        }
        // Merge requests carry no on-chain action; the merge itself is
        // validated on push.
        ProposalAction::MergeRequest { .. } => {}
    }
    Ok(())
}

/// True when the refund type returns deposits for the given outcome.
fn should_refund(rt: forge_types::repo::FeeRefundType, outcome: ProposalOutcome) -> bool {
    use forge_types::repo::FeeRefundType::*;
    use ProposalOutcome::*;
    let accepted = outcome == Accepted;
    let rejected = outcome == Rejected;
    let any_reject = matches!(outcome, Rejected | RejectedWithVeto | RejectedWithVetoByOwners);
    let below = outcome == BelowThreshold;
    match rt {
        No => false,
        OnAccept => accepted,
        OnAcceptReject => accepted || rejected,
        OnAcceptAllReject => accepted || any_reject,
        OnBelowThreshold => below,
        OnBelowThresholdAccept => below || accepted,
        OnBelowThresholdAcceptReject => below || accepted || rejected,
        OnBelowThresholdAcceptAllReject => below || accepted || any_reject,
    }
}

/// Settles a closed proposal's deposits: refund to depositors, or split
/// between the helm repo and the target repo.
fn settle_fees(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    prop: &RepoProposal,
    outcome: ProposalOutcome,
    chain_height: u64,
) -> Result<(), ContractError> {
    if prop.fees.is_empty() {
        return Ok(());
    }
    if should_refund(prop.config.fee_refund_type, outcome) {
        refund_deposits(ctx, prop, chain_height)
    } else {
        distribute_deposits(ctx, repo_name, repo, prop)
    }
}

/// Credits every deposit back to its depositor.
fn refund_deposits(
    ctx: &mut ExecCtx<'_>,
    prop: &RepoProposal,
    chain_height: u64,
) -> Result<(), ContractError> {
    let mut accounts = AccountKeeper::new(&mut *ctx.tree);
    for (addr, amount) in &prop.fees {
        let addr = Address::new(addr.clone());
        let mut acct = accounts.get(&addr)?;
        acct.balance += *amount;
        acct.clean(chain_height);
        accounts.update(&addr, &acct)?;
    }
    Ok(())
}

/// Splits the deposits between the helm repo and the target repo per the
/// network fee-split parameters. The target repo is credited on the caller's
/// in-memory object; the helm repo is persisted here.
fn distribute_deposits(
    ctx: &mut ExecCtx<'_>,
    repo_name: &str,
    repo: &mut Repository,
    prop: &RepoProposal,
) -> Result<(), ContractError> {
    let total = prop.total_fees();
    if total.is_zero() {
        return Ok(());
    }

    let helm_name = SystemKeeper::new(&mut *ctx.tree, &mut *ctx.index)
        .get_helm_repo()?
        .unwrap_or_else(|| ctx.params.helm_repo.clone());

    let helm_cut = total.mul_f64(ctx.params.helm_proposal_fee_split);
    let repo_cut = total.mul_f64(ctx.params.target_repo_proposal_fee_split);

    if helm_name == repo_name {
        repo.balance += helm_cut + repo_cut;
        return Ok(());
    }

    let mut repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
    let mut helm = match repos.find(&helm_name) {
        Ok(Some(h)) => h,
        Ok(None) => panic!(
            "corrupt state: helm repository {} is not configured on chain",
            helm_name
        ),
        Err(e) => return Err(e.into()),
    };
    helm.balance += helm_cut;
    repos.update(&helm_name, &helm)?;

    repo.balance += repo_cut;
    tracing::info!(
        target: "proposal",
        repo = repo_name,
        total = %total,
        helm = %helm_cut,
        target = %repo_cut,
        "proposal deposits distributed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestEnv;
    use forge_types::proposal::ProposalAction;
    use forge_types::repo::{FeeRefundType, Governance, RepoOwner};

    fn owner_repo(n: usize) -> Repository {
        let mut repo = Repository::bare();
        for i in 0..n {
            repo.owners.insert(
                format!("addr{}", i),
                RepoOwner {
                    veto: false,
                    joined_at: 1,
                    creator: i == 0,
                },
            );
        }
        repo.updated_at = 1;
        repo
    }

    fn owner_proposal(gov: Governance) -> RepoProposal {
        RepoProposal::new(
            ProposalAction::UpsertOwner {
                addresses: vec!["new1".into()],
                veto: false,
            },
            "addr0".into(),
            gov,
        )
    }

    fn gov(quorum: f64, threshold: f64, veto_quorum: f64) -> Governance {
        Governance {
            quorum,
            threshold,
            veto_quorum,
            ..Default::default()
        }
    }

    #[test]
    fn three_of_ten_owners_misses_a_40_percent_quorum() {
        let mut env = TestEnv::new();
        let repo = owner_repo(10);
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.yes = 3.0;

        let outcome = determine_outcome(&mut env.ctx(), &repo, &prop).unwrap();
        assert_eq!(outcome, ProposalOutcome::QuorumNotMet);
    }

    #[test]
    fn four_of_ten_owners_split_lands_below_threshold() {
        let mut env = TestEnv::new();
        let repo = owner_repo(10);
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.yes = 2.0;
        prop.no = 2.0;

        let outcome = determine_outcome(&mut env.ctx(), &repo, &prop).unwrap();
        assert_eq!(outcome, ProposalOutcome::BelowThreshold);
    }

    #[test]
    fn veto_check_precedes_the_threshold_check() {
        let mut env = TestEnv::new();
        let repo = owner_repo(10);
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        // Yes alone would clear the threshold, but the veto fires first.
        prop.yes = 6.0;
        prop.no_with_veto = 3.0;

        let outcome = determine_outcome(&mut env.ctx(), &repo, &prop).unwrap();
        assert_eq!(outcome, ProposalOutcome::RejectedWithVeto);
    }

    #[test]
    fn zero_veto_quorum_still_vetoes_on_any_veto_vote() {
        let mut env = TestEnv::new();
        let repo = owner_repo(10);
        let mut prop = owner_proposal(gov(40.0, 51.0, 0.0));
        prop.yes = 5.0;
        prop.no_with_veto = 1.0;

        let outcome = determine_outcome(&mut env.ctx(), &repo, &prop).unwrap();
        assert_eq!(outcome, ProposalOutcome::RejectedWithVeto);
    }

    #[test]
    fn clear_majorities_accept_and_reject() {
        let mut env = TestEnv::new();
        let repo = owner_repo(10);

        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.yes = 5.0;
        prop.no = 1.0;
        assert_eq!(
            determine_outcome(&mut env.ctx(), &repo, &prop).unwrap(),
            ProposalOutcome::Accepted
        );

        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.yes = 1.0;
        prop.no = 5.0;
        assert_eq!(
            determine_outcome(&mut env.ctx(), &repo, &prop).unwrap(),
            ProposalOutcome::Rejected
        );
    }

    #[test]
    fn power_age_caps_the_owner_population() {
        let mut env = TestEnv::new();
        let mut repo = owner_repo(4);
        // Two owners joined after the power-age cut-off.
        repo.owners.get_mut("addr2").unwrap().joined_at = 50;
        repo.owners.get_mut("addr3").unwrap().joined_at = 60;

        let mut prop = owner_proposal(gov(100.0, 51.0, 33.0));
        prop.power_age = 10;
        prop.yes = 2.0;

        // Quorum of 100% over the 2 eligible owners is met by 2 votes.
        assert_eq!(
            determine_outcome(&mut env.ctx(), &repo, &prop).unwrap(),
            ProposalOutcome::Accepted
        );
    }

    #[test]
    fn finalized_proposals_are_not_reapplied() {
        let mut env = TestEnv::new();
        let mut repo = owner_repo(2);
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.end_at = 5;
        prop.outcome = Some(ProposalOutcome::Rejected);
        repo.proposals.insert("1".into(), prop);

        let applied =
            maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 100).unwrap();
        assert!(!applied);
        assert_eq!(
            repo.proposals["1"].outcome,
            Some(ProposalOutcome::Rejected)
        );
        // The owner set is untouched.
        assert_eq!(repo.owners.len(), 2);
    }

    #[test]
    fn open_proposals_wait_for_their_end_height() {
        let mut env = TestEnv::new();
        let mut repo = owner_repo(2);
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.end_at = 100;
        repo.proposals.insert("1".into(), prop);

        let applied = maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 50).unwrap();
        assert!(!applied);
        assert!(repo.proposals["1"].outcome.is_none());
    }

    #[test]
    fn sole_owner_creator_is_auto_accepted() {
        let mut env = TestEnv::new();
        let mut repo = owner_repo(1);
        repo.owners.insert(
            "addr0".into(),
            RepoOwner {
                veto: false,
                joined_at: 1,
                creator: true,
            },
        );
        let mut prop = owner_proposal(gov(40.0, 51.0, 33.0));
        prop.end_at = 1_000;
        repo.proposals.insert("1".into(), prop);

        // Applies immediately even though end_at is far away.
        let applied = maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 2).unwrap();
        assert!(applied);
        let settled = &repo.proposals["1"];
        assert_eq!(settled.outcome, Some(ProposalOutcome::Accepted));
        assert_eq!(settled.yes, 1.0);
        assert!(repo.owners.contains_key("new1"));
    }

    #[test]
    fn insufficient_deposit_refunds_and_voids() {
        let mut env = TestEnv::new();
        let depositor = env.seed_account(5, "0");
        let mut repo = owner_repo(3);

        let mut gov_cfg = gov(40.0, 51.0, 33.0);
        gov_cfg.proposal_fee = "1".parse().unwrap();
        let mut prop = owner_proposal(gov_cfg);
        prop.fee_deposit_end_at = 100;
        prop.end_at = 200;
        prop.add_fee(depositor.to_address().as_str(), "0.4".parse().unwrap());
        repo.proposals.insert("1".into(), prop);

        // Sweep at height 101: the deposit phase has expired short of the fee.
        let applied =
            maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 100).unwrap();
        assert!(!applied);
        assert_eq!(
            repo.proposals["1"].outcome,
            Some(ProposalOutcome::InsufficientDeposit)
        );
        assert_eq!(
            env.account(&depositor.to_address()).balance,
            "0.4".parse().unwrap()
        );
    }

    #[test]
    fn non_refundable_fees_split_forty_sixty() {
        let mut env = TestEnv::new();
        let mut helm = Repository::bare();
        helm.updated_at = 1;
        env.set_repo("helm", &helm);

        let mut repo = owner_repo(10);
        let mut gov_cfg = gov(10.0, 51.0, 33.0);
        gov_cfg.fee_refund_type = FeeRefundType::No;
        let mut prop = owner_proposal(gov_cfg);
        prop.end_at = 10;
        prop.no = 6.0;
        prop.yes = 1.0;
        prop.add_fee("someaddr", "300".parse().unwrap());
        repo.proposals.insert("1".into(), prop);

        let applied = maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 9).unwrap();
        assert!(!applied);
        assert_eq!(repo.proposals["1"].outcome, Some(ProposalOutcome::Rejected));
        assert_eq!(env.repo("helm").balance, "120.0".parse().unwrap());
        assert_eq!(repo.balance, "180.0".parse().unwrap());
    }

    #[test]
    fn refund_on_accept_returns_deposits() {
        let mut env = TestEnv::new();
        let depositor = env.seed_account(5, "0");
        let mut repo = owner_repo(10);

        let mut gov_cfg = gov(10.0, 51.0, 33.0);
        gov_cfg.fee_refund_type = FeeRefundType::OnAccept;
        let mut prop = owner_proposal(gov_cfg);
        prop.end_at = 10;
        prop.yes = 6.0;
        prop.add_fee(depositor.to_address().as_str(), "2".parse().unwrap());
        repo.proposals.insert("1".into(), prop);

        let applied = maybe_apply_proposal(&mut env.ctx(), "repo1", &mut repo, "1", 9).unwrap();
        assert!(applied);
        assert_eq!(
            env.account(&depositor.to_address()).balance,
            "2".parse().unwrap()
        );
    }

    #[test]
    fn refund_matrix_matches_the_refund_type() {
        use FeeRefundType::*;
        use ProposalOutcome::*;
        assert!(!should_refund(No, Accepted));
        assert!(should_refund(OnAccept, Accepted));
        assert!(!should_refund(OnAccept, Rejected));
        assert!(should_refund(OnAcceptReject, Rejected));
        assert!(!should_refund(OnAcceptReject, RejectedWithVeto));
        assert!(should_refund(OnAcceptAllReject, RejectedWithVeto));
        assert!(should_refund(OnAcceptAllReject, RejectedWithVetoByOwners));
        assert!(!should_refund(OnAcceptAllReject, BelowThreshold));
        assert!(should_refund(OnBelowThreshold, BelowThreshold));
        assert!(!should_refund(OnBelowThreshold, Accepted));
        assert!(should_refund(OnBelowThresholdAccept, Accepted));
        assert!(should_refund(OnBelowThresholdAcceptReject, Rejected));
        assert!(should_refund(OnBelowThresholdAcceptAllReject, RejectedWithVeto));
    }
}
