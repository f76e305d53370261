//! Property tests: every persisted entity survives a canonical
//! encode/decode round trip structurally intact.

use forge_types::codec;
use forge_types::proposal::{ProposalAction, RepoProposal};
use forge_types::repo::{Governance, RepoOwner, Repository};
use forge_types::{Account, Amount, StakeKind};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn amount() -> impl Strategy<Value = Amount> {
    (0i64..1_000_000_000, 0u32..6).prop_map(|(n, scale)| Amount::new(Decimal::new(n, scale)))
}

proptest! {
    #[test]
    fn account_roundtrip(
        balance in amount(),
        nonce in 0u64..u64::MAX / 2,
        commission in 0.0f64..100.0,
        stakes in proptest::collection::vec((amount(), 0u64..1_000_000), 0..6),
    ) {
        let mut acct = Account::bare();
        acct.balance = balance;
        acct.nonce = nonce;
        acct.delegator_commission = commission;
        for (value, unbond) in stakes {
            let kind = if unbond == 0 { StakeKind::Host } else { StakeKind::Validator };
            acct.stakes.add(kind, value, unbond);
        }

        let bytes = codec::to_bytes_canonical(&acct).unwrap();
        let back: Account = codec::from_bytes_canonical(&bytes).unwrap();
        prop_assert_eq!(acct, back);
    }

    #[test]
    fn repository_roundtrip(
        balance in amount(),
        owners in proptest::collection::btree_map("[a-z0-9]{4,12}", (any::<bool>(), 1u64..10_000), 0..5),
        updated_at in 0u64..1_000_000,
    ) {
        let mut repo = Repository::bare();
        repo.balance = balance;
        repo.updated_at = updated_at;
        for (addr, (veto, joined_at)) in owners {
            repo.owners.insert(addr, RepoOwner { veto, joined_at, creator: false });
        }
        let mut prop = RepoProposal::new(
            ProposalAction::UpsertOwner { addresses: vec!["addr".into()], veto: true },
            "creator".into(),
            Governance::default(),
        );
        prop.yes = 3.0;
        prop.end_at = updated_at + 10;
        repo.proposals.insert("1".into(), prop);

        let bytes = codec::to_bytes_canonical(&repo).unwrap();
        let back: Repository = codec::from_bytes_canonical(&bytes).unwrap();
        prop_assert_eq!(repo, back);
    }

    #[test]
    fn amount_string_roundtrip(value in amount()) {
        let s = value.to_string();
        let parsed: Amount = s.parse().unwrap();
        prop_assert_eq!(value, parsed);
    }
}
