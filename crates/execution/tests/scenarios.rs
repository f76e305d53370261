//! End-to-end scenarios driven through the executor, mirroring the way the
//! consensus driver delivers transactions and block boundaries.

use forge_execution::testutil::{simple_note, TestChain};
use forge_types::error::codes;
use forge_types::proposal::ProposalOutcome;
use forge_types::repo::{RepoOwner, Repository};
use forge_types::tx::{
    ProposalCommon, Tx, TxCoinTransfer, TxCommon, TxNamespaceAcquire, TxPush,
    TxRepoProposalUpsertOwner,
};
use forge_types::{Address, Amount, PublicKey};
use std::collections::BTreeMap;

fn common(pk: PublicKey, fee: &str, nonce: u64) -> TxCommon {
    TxCommon {
        nonce,
        fee: fee.parse().unwrap(),
        sender_pub_key: pk,
        timestamp: 1,
    }
}

fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

#[test]
fn s1_coin_transfer_state_delta() {
    let mut chain = TestChain::new();
    let a = chain.seed_account(1, "100");
    let b = chain.seed_account(2, "10");

    let tx = Tx::CoinTransfer(TxCoinTransfer {
        common: common(a, "1", 1),
        to: b.to_address(),
        value: amt("10"),
    });
    let resp = chain.executor.exec_tx(&tx, 1);
    assert!(resp.is_ok(), "{}", resp.log);

    let sender = chain.account(&a.to_address());
    assert_eq!(sender.balance, amt("89"));
    assert_eq!(sender.nonce, 1);
    let rcpt = chain.account(&b.to_address());
    assert_eq!(rcpt.balance, amt("20"));
    assert_eq!(rcpt.nonce, 0);
}

#[test]
fn s2_push_updates_reference_nonce_and_fee() {
    let mut chain = TestChain::new();
    let s = chain.seed_account(1, "10");
    chain.seed_repo("repo1");

    // The sender has already applied one transaction.
    let mut acct = chain.account(&s.to_address());
    acct.nonce = 1;
    chain.set_account(&s.to_address(), &acct);

    let mut note = simple_note("repo1", s, 2);
    note.references[0].fee = amt("1");
    note.fee = amt("1");
    let tx = Tx::Push(TxPush {
        common: common(s, "1", 2),
        note,
    });
    let resp = chain.executor.exec_tx(&tx, 3);
    assert!(resp.is_ok(), "{}", resp.log);

    let repo = chain.repo("repo1");
    assert_eq!(repo.references["refs/heads/master"].nonce, 2);
    let sender = chain.account(&s.to_address());
    assert_eq!(sender.balance, amt("9"));
    assert_eq!(sender.nonce, 2);
}

#[test]
fn s3_single_owner_upsert_auto_accepts() {
    let mut chain = TestChain::new();
    let o = chain.seed_account(1, "10");
    let o_addr = o.to_address();

    let mut repo = Repository::bare();
    repo.owners.insert(
        o_addr.to_string(),
        RepoOwner {
            veto: false,
            joined_at: 1,
            creator: true,
        },
    );
    repo.updated_at = 1;
    chain.set_repo("repo1", &repo);
    let mut helm = Repository::bare();
    helm.updated_at = 1;
    chain.set_repo("helm", &helm);

    let tx = Tx::RepoProposalUpsertOwner(TxRepoProposalUpsertOwner {
        common: common(o, "1.5", 1),
        proposal: ProposalCommon {
            repo_name: "repo1".into(),
            id: "1".into(),
            value: amt("1"),
        },
        addresses: vec!["fg1newowner1".into(), "fg1newowner2".into()],
        veto: false,
    });
    let resp = chain.executor.exec_tx(&tx, 1);
    assert!(resp.is_ok(), "{}", resp.log);

    let repo = chain.repo("repo1");
    assert_eq!(repo.proposals.len(), 1);
    let prop = &repo.proposals["1"];
    assert_eq!(prop.outcome, Some(ProposalOutcome::Accepted));
    assert_eq!(prop.fees[o_addr.as_str()], amt("1"));
    assert_eq!(repo.owners.len(), 3);
    assert_eq!(chain.account(&o_addr).balance, amt("7.5"));
}

#[test]
fn s4_expired_deposit_phase_refunds_at_the_sweep() {
    let mut chain = TestChain::new();
    let depositor = chain.seed_account(3, "0");
    let mut repo = Repository::bare();
    for addr in ["owner1", "owner2"] {
        repo.owners.insert(
            addr.into(),
            RepoOwner {
                veto: false,
                joined_at: 1,
                creator: false,
            },
        );
    }
    repo.updated_at = 1;

    let mut gov = forge_types::repo::Governance::default();
    gov.proposal_fee = amt("1");
    let mut prop = forge_types::proposal::RepoProposal::new(
        forge_types::proposal::ProposalAction::UpsertOwner {
            addresses: vec!["newowner".into()],
            veto: false,
        },
        "owner1".into(),
        gov,
    );
    prop.fee_deposit_end_at = 100;
    prop.end_at = 101;
    prop.add_fee(depositor.to_address().as_str(), amt("0.25"));
    repo.proposals.insert("1".into(), prop);
    chain.set_repo("repo1", &repo);
    chain.index_proposal_end("repo1", "1", 101);

    chain.executor.end_block(101).unwrap();

    let repo = chain.repo("repo1");
    assert_eq!(
        repo.proposals["1"].outcome,
        Some(ProposalOutcome::InsufficientDeposit)
    );
    assert!(!repo.owners.contains_key("newowner"));
    assert_eq!(chain.account(&depositor.to_address()).balance, amt("0.25"));
}

#[test]
fn s6_namespace_acquire_with_repo_transfer() {
    let mut chain = TestChain::new();
    let s = chain.seed_account(1, "10");
    let treasury = chain.executor.params().treasury_address.clone();
    let ttl = chain.executor.params().namespace_ttl;

    let tx = Tx::NamespaceAcquire(TxNamespaceAcquire {
        common: common(s, "1", 1),
        name: "name1".into(),
        value: amt("1"),
        transfer_to_repo: Some("r1".into()),
        transfer_to_account: None,
        domains: BTreeMap::new(),
    });
    let resp = chain.executor.exec_tx(&tx, 7);
    assert!(resp.is_ok(), "{}", resp.log);

    let (tree, _) = chain.executor.stores_mut();
    let ns = forge_keepers::NamespaceKeeper::new(tree).get("name1").unwrap();
    assert_eq!(ns.owner, "r1");
    assert_eq!(ns.expires_at, 7 + ttl);

    assert_eq!(chain.account(&s.to_address()).balance, amt("8"));
    assert_eq!(chain.account(&treasury).balance, amt("1"));
}

#[test]
fn coin_supply_is_conserved_across_a_block() {
    let mut chain = TestChain::new();
    let a = chain.seed_account(1, "100");
    let b = chain.seed_account(2, "50");
    chain.seed_repo("repo1");

    // Fee-less legal transfers between accounts and a repo.
    let txs = vec![
        Tx::CoinTransfer(TxCoinTransfer {
            common: common(a, "0", 1),
            to: b.to_address(),
            value: amt("30"),
        }),
        Tx::CoinTransfer(TxCoinTransfer {
            common: common(b, "0", 1),
            to: Address::new("r/repo1"),
            value: amt("15"),
        }),
        Tx::CoinTransfer(TxCoinTransfer {
            common: common(a, "0", 2),
            to: a.to_address(),
            value: amt("7"),
        }),
    ];
    for tx in &txs {
        let resp = chain.executor.exec_tx(tx, 1);
        assert!(resp.is_ok(), "{}", resp.log);
    }

    let total = chain.account(&a.to_address()).balance
        + chain.account(&b.to_address()).balance
        + chain.repo("repo1").balance;
    assert_eq!(total, amt("150"));
}

#[test]
fn failed_tx_in_a_block_leaves_no_trace_after_commit() {
    let mut chain = TestChain::new();
    let a = chain.seed_account(1, "10");
    let b = chain.seed_account(2, "0");

    let good = Tx::CoinTransfer(TxCoinTransfer {
        common: common(a, "0", 1),
        to: b.to_address(),
        value: amt("4"),
    });
    let overdraft = Tx::CoinTransfer(TxCoinTransfer {
        common: common(a, "0", 2),
        to: b.to_address(),
        value: amt("1000"),
    });

    assert!(chain.executor.exec_tx(&good, 1).is_ok());
    assert_eq!(chain.executor.exec_tx(&overdraft, 1).code, codes::EXEC_FAILURE);
    chain.executor.end_block(2).unwrap();
    chain.executor.commit_block(2, 42).unwrap();

    assert_eq!(chain.account(&a.to_address()).balance, amt("6"));
    assert_eq!(chain.account(&a.to_address()).nonce, 1);
    assert_eq!(chain.account(&b.to_address()).balance, amt("4"));
}
