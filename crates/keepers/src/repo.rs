//! Typed CRUD over repositories, plus the proposal indices kept in the
//! auxiliary index DB: the ending-height index driving the end-of-block
//! sweep, and the per-voter vote records backing the `netStake` tally
//! correction.

use crate::{decode, encode};
use forge_api::state::{IndexStore, StateStore};
use forge_types::error::StateError;
use forge_types::keys;
use forge_types::proposal::ProposalVoteRecord;
use forge_types::repo::Repository;

/// A short-lived view over the state tree and index DB for repository
/// access.
pub struct RepoKeeper<'a> {
    state: &'a mut dyn StateStore,
    index: &'a mut dyn IndexStore,
}

impl<'a> RepoKeeper<'a> {
    pub fn new(state: &'a mut dyn StateStore, index: &'a mut dyn IndexStore) -> Self {
        RepoKeeper { state, index }
    }

    /// Loads the repository `name`, or a bare repository when none exists.
    pub fn get(&self, name: &str) -> Result<Repository, StateError> {
        match self.state.get(&keys::repo_key(name))? {
            Some(bytes) => decode(&bytes),
            None => Ok(Repository::bare()),
        }
    }

    /// Loads the repository `name`, or `None` when it was never created.
    pub fn find(&self, name: &str) -> Result<Option<Repository>, StateError> {
        match self.state.get(&keys::repo_key(name))? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Persists `repo` under `name`.
    pub fn update(&mut self, name: &str, repo: &Repository) -> Result<(), StateError> {
        self.state.insert(&keys::repo_key(name), &encode(repo)?)
    }

    /// Records that `proposal_id` on `repo` closes voting at `end_height`.
    pub fn index_proposal_end(
        &mut self,
        repo: &str,
        proposal_id: &str,
        end_height: u64,
    ) -> Result<(), StateError> {
        self.index
            .insert(&keys::proposal_end_key(end_height, repo, proposal_id), &[])
    }

    /// Every `(repo, proposal_id)` whose voting closes at `height`.
    pub fn proposals_ending_at(&self, height: u64) -> Result<Vec<(String, String)>, StateError> {
        let prefix = keys::proposal_end_height_prefix(height);
        let mut out = Vec::new();
        for (key, _) in self.index.prefix_scan(&prefix)? {
            let rest = &key[prefix.len()..];
            let rest = std::str::from_utf8(rest)
                .map_err(|e| StateError::Decode(format!("proposal end index key: {}", e)))?;
            let (repo, id) = rest.split_once('/').ok_or_else(|| {
                StateError::Decode(format!("malformed proposal end index key: {}", rest))
            })?;
            out.push((repo.to_string(), id.to_string()));
        }
        Ok(out)
    }

    /// Drops one ending-height index entry after the sweep has settled it.
    pub fn unindex_proposal_end(
        &mut self,
        repo: &str,
        proposal_id: &str,
        end_height: u64,
    ) -> Result<(), StateError> {
        self.index
            .delete(&keys::proposal_end_key(end_height, repo, proposal_id))
    }

    /// Records a cast vote with the weight that was applied to the tally.
    pub fn index_proposal_vote(
        &mut self,
        repo: &str,
        proposal_id: &str,
        voter: &str,
        record: &ProposalVoteRecord,
    ) -> Result<(), StateError> {
        self.index.insert(
            &keys::proposal_vote_key(repo, proposal_id, voter),
            &encode(record)?,
        )
    }

    /// The vote previously cast by `voter`, if any.
    pub fn get_proposal_vote(
        &self,
        repo: &str,
        proposal_id: &str,
        voter: &str,
    ) -> Result<Option<ProposalVoteRecord>, StateError> {
        match self
            .index
            .get(&keys::proposal_vote_key(repo, proposal_id, voter))?
        {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_storage::{MemoryIndex, MemoryTree};
    use forge_types::proposal::VoteChoice;

    #[test]
    fn find_distinguishes_missing_from_bare() {
        let mut tree = MemoryTree::new();
        let mut index = MemoryIndex::new();
        let mut keeper = RepoKeeper::new(&mut tree, &mut index);

        assert!(keeper.find("repo1").unwrap().is_none());
        assert!(keeper.get("repo1").unwrap().is_bare());

        let repo = Repository::bare();
        keeper.update("repo1", &repo).unwrap();
        assert!(keeper.find("repo1").unwrap().is_some());
    }

    #[test]
    fn ending_height_index_scans_one_height() {
        let mut tree = MemoryTree::new();
        let mut index = MemoryIndex::new();
        let mut keeper = RepoKeeper::new(&mut tree, &mut index);

        keeper.index_proposal_end("repo1", "1", 50).unwrap();
        keeper.index_proposal_end("repo2", "9", 50).unwrap();
        keeper.index_proposal_end("repo1", "2", 500).unwrap();

        let mut at50 = keeper.proposals_ending_at(50).unwrap();
        at50.sort();
        assert_eq!(
            at50,
            vec![
                ("repo1".to_string(), "1".to_string()),
                ("repo2".to_string(), "9".to_string())
            ]
        );

        keeper.unindex_proposal_end("repo1", "1", 50).unwrap();
        assert_eq!(keeper.proposals_ending_at(50).unwrap().len(), 1);
    }

    #[test]
    fn vote_records_roundtrip() {
        let mut tree = MemoryTree::new();
        let mut index = MemoryIndex::new();
        let mut keeper = RepoKeeper::new(&mut tree, &mut index);

        assert!(keeper
            .get_proposal_vote("repo1", "1", "addr1")
            .unwrap()
            .is_none());

        let rec = ProposalVoteRecord {
            choice: VoteChoice::Yes,
            weight: 12.0,
        };
        keeper
            .index_proposal_vote("repo1", "1", "addr1", &rec)
            .unwrap();
        assert_eq!(
            keeper.get_proposal_vote("repo1", "1", "addr1").unwrap(),
            Some(rec)
        );
    }
}
