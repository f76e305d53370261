//! In-memory harness for contract tests: memory stores plus stub
//! collaborators.

use forge_api::{ExecCtx, RepoSyncer, TicketManager};
use forge_keepers::{AccountKeeper, RepoKeeper};
use forge_storage::{MemoryIndex, MemoryTree};
use forge_types::error::{ErrObjectNotFound, StateError};
use forge_types::params::Params;
use forge_types::push::PushNote;
use forge_types::repo::Repository;
use forge_types::ticket::Ticket;
use forge_types::{Account, Address, Amount, PublicKey};

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

pub struct TestEnv {
    pub tree: MemoryTree,
    pub index: MemoryIndex,
    pub tickets: StubTickets,
    pub syncer: StubSyncer,
    pub params: Params,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            tree: MemoryTree::new(),
            index: MemoryIndex::new(),
            tickets: StubTickets::default(),
            syncer: StubSyncer::default(),
            params: Params::default(),
        }
    }

    pub fn ctx(&mut self) -> ExecCtx<'_> {
        ExecCtx {
            tree: &mut self.tree,
            index: &mut self.index,
            tickets: &self.tickets,
            syncer: &self.syncer,
            params: &self.params,
        }
    }

    pub fn account(&mut self, addr: &Address) -> Account {
        AccountKeeper::new(&mut self.tree).get(addr).unwrap()
    }

    pub fn set_account(&mut self, addr: &Address, acct: &Account) {
        AccountKeeper::new(&mut self.tree).update(addr, acct).unwrap();
    }

    /// Seeds an account with a balance, keyed by a deterministic public key.
    pub fn seed_account(&mut self, fill: u8, balance: &str) -> PublicKey {
        let pk = PublicKey([fill; 32]);
        let mut acct = Account::bare();
        acct.balance = balance.parse::<Amount>().unwrap();
        self.set_account(&pk.to_address(), &acct);
        pk
    }

    pub fn repo(&mut self, name: &str) -> Repository {
        RepoKeeper::new(&mut self.tree, &mut self.index)
            .get(name)
            .unwrap()
    }

    pub fn set_repo(&mut self, name: &str, repo: &Repository) {
        RepoKeeper::new(&mut self.tree, &mut self.index)
            .update(name, repo)
            .unwrap();
    }
}
