//! In-memory engine construction for tests and light tooling: memory
//! storage backends plus stub ticket-manager and repo-syncer seams.

use crate::Executor;
use forge_api::{RepoSyncer, TicketManager};
use forge_keepers::{AccountKeeper, RepoKeeper};
use forge_storage::{MemoryIndex, MemoryTree};
use forge_types::error::{ErrObjectNotFound, StateError};
use forge_types::params::Params;
use forge_types::push::{PushNote, PushedReference};
use forge_types::repo::{Reference, Repository};
use forge_types::ticket::Ticket;
use forge_types::{Account, Address, Amount, PublicKey};

/// A ticket manager backed by a fixed in-memory ticket list.
#[derive(Default)]
pub struct StubTickets {
    pub tickets: Vec<Ticket>,
    pub total_value: f64,
}

impl TicketManager for StubTickets {
    fn get_by_hash(&self, hash: &str) -> Option<Ticket> {
        self.tickets.iter().find(|t| t.hash == hash).cloned()
    }

    fn value_of_all_tickets(&self, _max_height: u64) -> Result<f64, StateError> {
        Ok(self.total_value)
    }

    fn get_non_decayed_tickets(
        &self,
        pk: &PublicKey,
        _height: u64,
    ) -> Result<Vec<Ticket>, StateError> {
        let addr = pk.to_address();
        Ok(self
            .tickets
            .iter()
            .filter(|t| t.proposer_pub_key == *pk || t.delegator == addr)
            .cloned()
            .collect())
    }

    fn value_of_non_delegated_tickets(
        &self,
        pk: &PublicKey,
        _height: u64,
    ) -> Result<f64, StateError> {
        Ok(self
            .tickets
            .iter()
            .filter(|t| t.proposer_pub_key == *pk && !t.is_delegated())
            .map(|t| t.value.to_f64())
            .sum())
    }

    fn value_of_delegated_tickets(&self, pk: &PublicKey, _height: u64) -> Result<f64, StateError> {
        Ok(self
            .tickets
            .iter()
            .filter(|t| t.proposer_pub_key == *pk && t.is_delegated())
            .map(|t| t.value.to_f64())
            .sum())
    }
}

/// A repo syncer that either succeeds or reports the replication sentinel.
#[derive(Default)]
pub struct StubSyncer {
    pub missing_object: bool,
}

impl RepoSyncer for StubSyncer {
    fn exec_tx_push(&self, note: &PushNote) -> anyhow::Result<()> {
        if self.missing_object {
            return Err(anyhow::Error::new(ErrObjectNotFound)
                .context(format!("merging push into {}", note.repo_name)));
        }
        Ok(())
    }
}

/// An executor over in-memory backends with seeding helpers.
pub struct TestChain {
    pub executor: Executor,
}

impl TestChain {
    pub fn new() -> Self {
        Self::build(StubTickets::default(), false)
    }

    /// An engine whose syncer always reports a missing object.
    pub fn with_missing_objects() -> Self {
        Self::build(StubTickets::default(), true)
    }

    pub fn with_tickets(tickets: StubTickets) -> Self {
        Self::build(tickets, false)
    }

    fn build(tickets: StubTickets, missing_object: bool) -> Self {
        TestChain {
            executor: Executor::new(
                Box::new(MemoryTree::new()),
                Box::new(MemoryIndex::new()),
                Box::new(tickets),
                Box::new(StubSyncer { missing_object }),
                Params::default(),
            ),
        }
    }

    /// Seeds an account keyed by a deterministic public key.
    pub fn seed_account(&mut self, fill: u8, balance: &str) -> PublicKey {
        let pk = PublicKey([fill; 32]);
        let mut acct = Account::bare();
        acct.balance = balance.parse::<Amount>().unwrap();
        self.set_account(&pk.to_address(), &acct);
        pk
    }

    pub fn account(&mut self, addr: &Address) -> Account {
        AccountKeeper::new(self.executor.tree_mut()).get(addr).unwrap()
    }

    pub fn set_account(&mut self, addr: &Address, acct: &Account) {
        AccountKeeper::new(self.executor.tree_mut())
            .update(addr, acct)
            .unwrap();
    }

    /// Seeds a repository with a `master` reference at nonce 1.
    pub fn seed_repo(&mut self, name: &str) {
        let mut repo = Repository::bare();
        repo.references.insert(
            "refs/heads/master".into(),
            Reference {
                creator: "fpk1creator".into(),
                nonce: 1,
                hash: "aa".repeat(20),
                data: Default::default(),
            },
        );
        repo.updated_at = 1;
        self.set_repo(name, &repo);
    }

    pub fn repo(&mut self, name: &str) -> Repository {
        let (tree, index) = self.executor.stores_mut();
        RepoKeeper::new(tree, index).get(name).unwrap()
    }

    pub fn set_repo(&mut self, name: &str, repo: &Repository) {
        let (tree, index) = self.executor.stores_mut();
        RepoKeeper::new(tree, index).update(name, repo).unwrap();
    }

    pub fn index_proposal_end(&mut self, repo: &str, prop_id: &str, end_at: u64) {
        let (tree, index) = self.executor.stores_mut();
        RepoKeeper::new(tree, index)
            .index_proposal_end(repo, prop_id, end_at)
            .unwrap();
    }
}

impl Default for TestChain {
    fn default() -> Self {
        TestChain::new()
    }
}

/// A push note updating `refs/heads/master` with no fees.
pub fn simple_note(repo: &str, pusher: PublicKey, nonce: u64) -> PushNote {
    PushNote {
        repo_name: repo.into(),
        pusher_key_id: pusher.to_push_key_id(),
        pusher_address: pusher.to_address(),
        account_nonce: nonce,
        timestamp: 1,
        total_size: 64,
        fee: Amount::zero(),
        references: vec![PushedReference {
            name: "refs/heads/master".into(),
            old_hash: "aa".repeat(20),
            new_hash: "bb".repeat(20),
            nonce: 2,
            ..Default::default()
        }],
        node_sig: vec![],
        node_pub_key: PublicKey::default(),
    }
}
