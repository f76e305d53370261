//! Repository creation.

use crate::common::debit_sender;
use forge_api::{ExecCtx, SystemContract};
use forge_keepers::RepoKeeper;
use forge_types::error::ContractError;
use forge_types::repo::{Repository, VoterType};
use forge_types::tx::{Tx, TxType};
use forge_types::Amount;

/// Handles `TxType::RepoCreate`.
///
/// The submitted config patch is merged onto the network's default repo
/// config (default push policies included). Under owner voting the creator
/// becomes the first owner.
pub struct RepoCreateContract;

impl SystemContract for RepoCreateContract {
    fn can_exec(&self, ty: TxType) -> bool {
        ty == TxType::RepoCreate
    }

    fn exec(
        &self,
        ctx: &mut ExecCtx<'_>,
        tx: &Tx,
        chain_height: u64,
    ) -> Result<(), ContractError> {
        let Tx::RepoCreate(t) = tx else {
            return Err(ContractError::Invalid("expected a repo creation".into()));
        };

        {
            let repos = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index);
            if repos.find(&t.name)?.is_some() {
                return Err(ContractError::Invalid(format!(
                    "repo name already exists: {}",
                    t.name
                )));
            }
        }

        let mut repo = Repository::bare();
        repo.config = ctx.params.default_repo_config();
        t.config.apply_to(&mut repo.config);

        let creator = t.common.sender_address();
        if repo.config.governance.voter == VoterType::Owner {
            repo.upsert_owner(creator.as_str(), false, chain_height + 1, true);
        }
        repo.updated_at = chain_height + 1;

        debit_sender(
            ctx,
            &t.common.sender_pub_key,
            Amount::zero(),
            t.common.fee,
            t.common.nonce,
            chain_height,
        )?;
        RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index).update(&t.name, &repo)?;

        tracing::info!(
            target: "contract",
            tx = "repo_create",
            name = %t.name,
            creator = %creator,
            "repository created"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestEnv;
    use forge_types::repo::{GovernanceUpdate, RepoConfigUpdate};
    use forge_types::tx::{TxCommon, TxRepoCreate};
    use forge_types::PublicKey;

    fn create(pk: PublicKey, name: &str, config: RepoConfigUpdate, nonce: u64) -> Tx {
        Tx::RepoCreate(TxRepoCreate {
            common: TxCommon {
                nonce,
                fee: "1".parse().unwrap(),
                sender_pub_key: pk,
                timestamp: 1,
            },
            name: name.into(),
            config,
        })
    }

    #[test]
    fn creator_becomes_owner_under_owner_voting() {
        let mut env = TestEnv::new();
        let pk = env.seed_account(1, "10");

        let tx = create(pk, "repo1", RepoConfigUpdate::default(), 1);
        RepoCreateContract.exec(&mut env.ctx(), &tx, 5).unwrap();

        let repo = env.repo("repo1");
        let owner = &repo.owners[pk.to_address().as_str()];
        assert!(owner.creator);
        assert_eq!(owner.joined_at, 6);
        assert_eq!(repo.updated_at, 6);
        assert!(!repo.config.policies.is_empty());
        assert_eq!(env.account(&pk.to_address()).balance, "9".parse().unwrap());
    }

    #[test]
    fn net_staker_voting_skips_the_owner_record() {
        let mut env = TestEnv::new();
        let pk = env.seed_account(1, "10");

        let cfg = RepoConfigUpdate {
            governance: GovernanceUpdate {
                voter: Some(VoterType::NetStakers),
                ..Default::default()
            },
            policies: None,
        };
        let tx = create(pk, "repo1", cfg, 1);
        RepoCreateContract.exec(&mut env.ctx(), &tx, 5).unwrap();

        let repo = env.repo("repo1");
        assert!(repo.owners.is_empty());
        assert_eq!(repo.config.governance.voter, VoterType::NetStakers);
        // Unpatched fields keep the network defaults.
        assert_eq!(
            repo.config.governance.quorum,
            env.params.default_governance.quorum
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut env = TestEnv::new();
        let pk = env.seed_account(1, "10");

        let tx = create(pk, "repo1", RepoConfigUpdate::default(), 1);
        RepoCreateContract.exec(&mut env.ctx(), &tx, 5).unwrap();
        let dup = create(pk, "repo1", RepoConfigUpdate::default(), 2);
        let err = RepoCreateContract.exec(&mut env.ctx(), &dup, 6).unwrap_err();
        assert!(matches!(err, ContractError::Invalid(_)));
    }
}
