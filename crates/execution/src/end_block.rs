//! The end-of-block hook.
//!
//! After the last transaction of block `height`, the sweep loads every
//! proposal whose voting closed at this height and settles it. A repository
//! named by the index but missing from the tree is an invariant violation;
//! the resulting error aborts the block commit.

use forge_api::ExecCtx;
use forge_contracts::proposal::engine;
use forge_keepers::RepoKeeper;
use forge_types::error::ContractError;

/// Settles every proposal whose `end_at` equals `height`.
pub fn maybe_apply_ended_proposals(
    ctx: &mut ExecCtx<'_>,
    height: u64,
) -> Result<(), ContractError> {
    let entries =
        RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).proposals_ending_at(height)?;
    if entries.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        target: "end_block",
        height,
        proposals = entries.len(),
        "sweeping ended proposals"
    );

    for (repo_name, prop_id) in entries {
        let mut repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
            .find(&repo_name)?
            .ok_or_else(|| ContractError::RepoNotFound(repo_name.clone()))?;

        let applied =
            engine::maybe_apply_proposal(ctx, &repo_name, &mut repo, &prop_id, height.saturating_sub(1))?;

        let mut repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
        repos.update(&repo_name, &repo)?;
        repos.unindex_proposal_end(&repo_name, &prop_id, height)?;

        tracing::info!(
            target: "end_block",
            height,
            repo = %repo_name,
            id = %prop_id,
            applied,
            "ended proposal settled"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testutil::TestChain;
    use forge_types::proposal::{ProposalAction, ProposalOutcome, RepoProposal};
    use forge_types::repo::{Governance, RepoOwner};

    fn open_proposal(creator: &str, end_at: u64) -> RepoProposal {
        let mut prop = RepoProposal::new(
            ProposalAction::UpsertOwner {
                addresses: vec!["newowner".into()],
                veto: false,
            },
            creator.into(),
            Governance::default(),
        );
        prop.end_at = end_at;
        prop
    }

    #[test]
    fn sweep_settles_proposals_ending_at_the_height() {
        let mut chain = TestChain::new();
        chain.seed_repo("repo1");

        let mut repo = chain.repo("repo1");
        for addr in ["owner1", "owner2", "owner3"] {
            repo.owners.insert(
                addr.into(),
                RepoOwner {
                    veto: false,
                    joined_at: 1,
                    creator: false,
                },
            );
        }
        let mut prop = open_proposal("owner1", 50);
        // 2 of 3 owners voted yes; quorum 40% and threshold 51% are met.
        prop.yes = 2.0;
        repo.proposals.insert("1".into(), prop);
        chain.set_repo("repo1", &repo);
        chain.index_proposal_end("repo1", "1", 50);

        // Nothing happens at earlier heights.
        chain.executor.end_block(49).unwrap();
        assert!(chain.repo("repo1").proposals["1"].outcome.is_none());

        chain.executor.end_block(50).unwrap();
        let repo = chain.repo("repo1");
        assert_eq!(
            repo.proposals["1"].outcome,
            Some(ProposalOutcome::Accepted)
        );
        assert!(repo.owners.contains_key("newowner"));
    }

    #[test]
    fn sweep_is_idempotent_once_settled() {
        let mut chain = TestChain::new();
        chain.seed_repo("repo1");

        let mut repo = chain.repo("repo1");
        repo.owners.insert(
            "owner1".into(),
            RepoOwner {
                veto: false,
                joined_at: 1,
                creator: false,
            },
        );
        repo.owners.insert(
            "owner2".into(),
            RepoOwner {
                veto: false,
                joined_at: 1,
                creator: false,
            },
        );
        let mut prop = open_proposal("owner1", 50);
        prop.yes = 2.0;
        repo.proposals.insert("1".into(), prop);
        chain.set_repo("repo1", &repo);
        chain.index_proposal_end("repo1", "1", 50);

        chain.executor.end_block(50).unwrap();
        let owners_after_first = chain.repo("repo1").owners.len();

        // Re-running the sweep (and re-indexing the height) changes nothing.
        chain.index_proposal_end("repo1", "1", 50);
        chain.executor.end_block(50).unwrap();
        assert_eq!(chain.repo("repo1").owners.len(), owners_after_first);
    }

    #[test]
    fn missing_repo_during_sweep_aborts_the_block() {
        let mut chain = TestChain::new();
        chain.index_proposal_end("ghost", "1", 50);
        let err = chain.executor.end_block(50).unwrap_err();
        assert!(matches!(
            err,
            forge_types::error::ContractError::RepoNotFound(_)
        ));
    }
}
