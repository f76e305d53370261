//! Apply-time transaction validation.
//!
//! Syntactic and consistency checks run before contract dispatch. Failures
//! are reported with a field-annotated message and surface to the consensus
//! driver as `FailedDecode`; the transaction never reaches a contract.

use forge_api::{ExecCtx, TxValidator};
use forge_keepers::RepoKeeper;
use forge_types::address::is_push_key_id;
use forge_types::error::ValidationError;
use forge_types::push::ZERO_HASH;
use forge_types::tx::{Tx, TxCommon};
use forge_types::{Address, Amount};

/// The standard validator wired into the executor by default.
pub struct StdTxValidator;

fn err<M: Into<String>>(field: &str, msg: M) -> ValidationError {
    ValidationError::field(field, msg)
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 128
        && s.chars().next().map(|c| c.is_ascii_alphanumeric()).unwrap_or(false)
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn is_valid_scope(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 128
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '/')
}

fn is_hex_hash(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= 16 && s.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_recipient(a: &Address) -> bool {
    if a.is_prefixed_user_address() || a.is_prefixed_repo_address() {
        return !a.strip_prefix().is_empty();
    }
    a.is_user_address() || a.is_namespace_uri()
}

fn check_non_negative(field: &str, amount: Amount) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(err(field, "amount cannot be negative"));
    }
    Ok(())
}

fn validate_common(common: &TxCommon) -> Result<(), ValidationError> {
    if common.sender_pub_key.is_zero() {
        return Err(err("senderPubKey", "sender public key is required"));
    }
    if common.nonce == 0 {
        return Err(err("nonce", "nonce must be greater than zero"));
    }
    check_non_negative("fee", common.fee)
}

impl TxValidator for StdTxValidator {
    fn validate_tx(
        &self,
        tx: &Tx,
        _index: i64,
        ctx: &mut ExecCtx<'_>,
    ) -> Result<(), ValidationError> {
        validate_common(tx.common())?;

        match tx {
            Tx::CoinTransfer(t) => {
                check_non_negative("value", t.value)?;
                if t.to.is_empty() {
                    return Err(err("to", "recipient address is required"));
                }
                if !is_valid_recipient(&t.to) {
                    return Err(err("to", "recipient address is not valid"));
                }
            }
            Tx::TicketPurchase(t) => {
                if t.value.is_zero() || t.value.is_negative() {
                    return Err(err("value", "ticket value must be a positive amount"));
                }
            }
            Tx::TicketUnbond(t) => {
                if t.ticket_hash.is_empty() {
                    return Err(err("ticket", "ticket hash is required"));
                }
                if !t.ticket_hash.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(err("ticket", "ticket hash must be hex"));
                }
            }
            Tx::SetDelegatorCommission(t) => {
                if !(0.0..=100.0).contains(&t.commission) {
                    return Err(err("commission", "commission must be between 0 and 100"));
                }
            }
            Tx::RepoCreate(t) => {
                if !is_valid_name(&t.name) {
                    return Err(err("name", "repo name is not valid"));
                }
            }
            Tx::Push(t) => {
                let note = &t.note;
                if !is_valid_name(&note.repo_name) {
                    return Err(err("repo", "repo name is not valid"));
                }
                if !is_push_key_id(&note.pusher_key_id) {
                    return Err(err("pusherKeyId", "push key id is not valid"));
                }
                if note.references.is_empty() {
                    return Err(err("references", "at least one reference is required"));
                }
                if note.account_nonce != t.common.nonce {
                    return Err(err("accountNonce", "note nonce does not match the tx nonce"));
                }
                for (i, r) in note.references.iter().enumerate() {
                    let field = |name: &str| format!("references[{}].{}", i, name);
                    if !r.name.starts_with("refs/") {
                        return Err(err(&field("name"), "reference name must start with refs/"));
                    }
                    if r.new_hash != ZERO_HASH && !is_hex_hash(&r.new_hash) {
                        return Err(err(&field("newHash"), "new hash is not a valid object hash"));
                    }
                    if !r.old_hash.is_empty() && !is_hex_hash(&r.old_hash) {
                        return Err(err(&field("oldHash"), "old hash is not a valid object hash"));
                    }
                    check_non_negative(&field("fee"), r.fee)?;
                    check_non_negative(&field("value"), r.value)?;
                }
                if note.fee != note.total_reference_fees() {
                    return Err(err("fee", "note fee must equal the sum of reference fees"));
                }
            }
            Tx::NamespaceAcquire(t) => {
                if !is_valid_name(&t.name) {
                    return Err(err("name", "namespace name is not valid"));
                }
                check_non_negative("value", t.value)?;
                if let Some(repo) = &t.transfer_to_repo {
                    if !is_valid_name(repo) {
                        return Err(err("toRepo", "repo name is not valid"));
                    }
                }
                if let Some(addr) = &t.transfer_to_account {
                    if !addr.is_user_address() {
                        return Err(err("toAccount", "account address is not valid"));
                    }
                }
                for (domain, target) in &t.domains {
                    if !is_valid_name(domain) {
                        return Err(err("domains", format!("domain name is not valid: {}", domain)));
                    }
                    let target = Address::new(target.clone());
                    if !(target.is_prefixed_user_address()
                        || target.is_prefixed_repo_address()
                        || target.is_user_address())
                    {
                        return Err(err("domains", format!("domain target is not valid: {}", target)));
                    }
                }
            }
            Tx::NamespaceDomainUpdate(t) => {
                if !is_valid_name(&t.name) {
                    return Err(err("name", "namespace name is not valid"));
                }
                for domain in t.domains.keys() {
                    if !is_valid_name(domain) {
                        return Err(err("domains", format!("domain name is not valid: {}", domain)));
                    }
                }
            }
            Tx::RegisterPushKey(t) => {
                if t.pub_key.is_zero() {
                    return Err(err("pubKey", "push public key is required"));
                }
                check_non_negative("feeCap", t.fee_cap)?;
                for scope in &t.scopes {
                    if !is_valid_scope(scope) {
                        return Err(err("scopes", format!("scope is not valid: {}", scope)));
                    }
                }
            }
            Tx::UpDelPushKey(t) => {
                if !is_push_key_id(&t.id) {
                    return Err(err("id", "push key id is not valid"));
                }
                if t.delete
                    && (!t.add_scopes.is_empty()
                        || !t.remove_scopes.is_empty()
                        || t.fee_cap.is_some())
                {
                    return Err(err("delete", "a delete request cannot carry updates"));
                }
                for scope in &t.add_scopes {
                    if !is_valid_scope(scope) {
                        return Err(err("addScopes", format!("scope is not valid: {}", scope)));
                    }
                }
                if let Some(cap) = t.fee_cap {
                    check_non_negative("feeCap", cap)?;
                }
            }
            Tx::RepoProposalUpsertOwner(t) => {
                validate_proposal_common(ctx, &t.proposal)?;
                if t.addresses.is_empty() {
                    return Err(err("addresses", "at least one address is required"));
                }
            }
            Tx::RepoProposalUpdate(t) => {
                validate_proposal_common(ctx, &t.proposal)?;
            }
            Tx::RepoProposalRegisterPushKeys(t) => {
                validate_proposal_common(ctx, &t.proposal)?;
                if t.key_ids.is_empty() {
                    return Err(err("ids", "at least one push key id is required"));
                }
                for id in &t.key_ids {
                    if !is_push_key_id(id) {
                        return Err(err("ids", format!("push key id is not valid: {}", id)));
                    }
                }
                check_non_negative("feeCap", t.fee_cap)?;
            }
            Tx::RepoProposalMergeRequest(t) => {
                validate_proposal_common(ctx, &t.proposal)?;
                if t.base_branch.is_empty() {
                    return Err(err("base", "base branch is required"));
                }
                if t.target_branch.is_empty() {
                    return Err(err("target", "target branch is required"));
                }
            }
            Tx::RepoProposalVote(t) => {
                if !is_valid_name(&t.repo_name) {
                    return Err(err("name", "repo name is not valid"));
                }
                if !is_numeric_id(&t.proposal_id) {
                    return Err(err("id", "proposal id is not valid"));
                }
            }
            Tx::RepoProposalFeeDeposit(t) => {
                if !is_valid_name(&t.proposal.repo_name) {
                    return Err(err("name", "repo name is not valid"));
                }
                if !is_numeric_id(&t.proposal.id) {
                    return Err(err("id", "proposal id is not valid"));
                }
                if t.proposal.value.is_zero() || t.proposal.value.is_negative() {
                    return Err(err("value", "deposit must be a positive amount"));
                }
            }
        }
        Ok(())
    }
}

/// Shared checks of the proposal-creation transactions, including the
/// minimum-fee consistency check against the target repo's config.
fn validate_proposal_common(
    ctx: &mut ExecCtx<'_>,
    pcommon: &forge_types::tx::ProposalCommon,
) -> Result<(), ValidationError> {
    if !is_valid_name(&pcommon.repo_name) {
        return Err(err("name", "repo name is not valid"));
    }
    if !is_numeric_id(&pcommon.id) {
        return Err(err("id", "proposal id is not valid"));
    }
    check_non_negative("value", pcommon.value)?;

    // Without a deposit phase the full proposal fee is due at creation.
    let repo = RepoKeeper::new(&mut *ctx.tree, &mut *ctx.index)
        .find(&pcommon.repo_name)
        .map_err(|e| err("name", e.to_string()))?;
    if let Some(repo) = repo {
        let gov = &repo.config.governance;
        if gov.fee_deposit_duration == 0
            && !gov.proposal_fee.is_zero()
            && pcommon.value < gov.proposal_fee
        {
            return Err(err(
                "value",
                format!("proposal fee cannot be less than {}", gov.proposal_fee),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestChain;
    use forge_api::APPLY_TIME;
    use forge_types::repo::Repository;
    use forge_types::tx::{
        ProposalCommon, TxCoinTransfer, TxPush, TxRepoProposalUpsertOwner, TxUpDelPushKey,
    };
    use forge_types::PublicKey;

    fn common(nonce: u64) -> TxCommon {
        TxCommon {
            nonce,
            fee: "1".parse().unwrap(),
            sender_pub_key: PublicKey([1u8; 32]),
            timestamp: 1,
        }
    }

    fn validate(chain: &mut TestChain, tx: &Tx) -> Result<(), ValidationError> {
        let (tree, index) = chain.executor.stores_mut();
        // Build a minimal context over the chain's stores.
        let tickets = crate::testutil::StubTickets::default();
        let syncer = crate::testutil::StubSyncer::default();
        let params = forge_types::params::Params::default();
        let mut ctx = ExecCtx {
            tree,
            index,
            tickets: &tickets,
            syncer: &syncer,
            params: &params,
        };
        StdTxValidator.validate_tx(tx, APPLY_TIME, &mut ctx)
    }

    #[test]
    fn common_header_checks() {
        let mut chain = TestChain::new();
        let mut t = TxCoinTransfer {
            common: common(0),
            to: Address::new("r/repo1"),
            value: "1".parse().unwrap(),
        };
        let e = validate(&mut chain, &Tx::CoinTransfer(t.clone())).unwrap_err();
        assert_eq!(e.to_string(), "field:nonce, msg:nonce must be greater than zero");

        t.common = common(1);
        t.common.sender_pub_key = PublicKey::default();
        let e = validate(&mut chain, &Tx::CoinTransfer(t.clone())).unwrap_err();
        assert!(e.to_string().contains("field:senderPubKey"));

        t.common = common(1);
        assert!(validate(&mut chain, &Tx::CoinTransfer(t)).is_ok());
    }

    #[test]
    fn transfer_recipient_shapes() {
        let mut chain = TestChain::new();
        let user = PublicKey([7; 32]).to_address();
        for (to, ok) in [
            ("r/repo1", true),
            ("a/fg1abc", true),
            ("myns/web", true),
            (user.as_str(), true),
            ("not-an-address", false),
            ("", false),
        ] {
            let tx = Tx::CoinTransfer(TxCoinTransfer {
                common: common(1),
                to: Address::new(to),
                value: "1".parse().unwrap(),
            });
            assert_eq!(validate(&mut chain, &tx).is_ok(), ok, "recipient {:?}", to);
        }
    }

    #[test]
    fn push_note_consistency() {
        let mut chain = TestChain::new();
        let pk = PublicKey([1u8; 32]);

        let mut note = crate::testutil::simple_note("repo1", pk, 1);
        note.pusher_key_id = pk.to_push_key_id();
        note.references[0].fee = "2".parse().unwrap();
        // note.fee left at zero: mismatch with the per-reference sum.
        let tx = Tx::Push(TxPush {
            common: common(1),
            note: note.clone(),
        });
        let e = validate(&mut chain, &tx).unwrap_err();
        assert!(e.to_string().contains("sum of reference fees"));

        note.fee = "2".parse().unwrap();
        let tx = Tx::Push(TxPush {
            common: common(1),
            note: note.clone(),
        });
        assert!(validate(&mut chain, &tx).is_ok());

        note.references[0].name = "master".into();
        let tx = Tx::Push(TxPush {
            common: common(1),
            note,
        });
        let e = validate(&mut chain, &tx).unwrap_err();
        assert!(e.to_string().contains("refs/"));
    }

    #[test]
    fn proposal_fee_minimum_without_deposit_phase() {
        let mut chain = TestChain::new();
        let mut repo = Repository::bare();
        repo.config.governance.proposal_fee = "5".parse().unwrap();
        repo.updated_at = 1;
        chain.set_repo("repo1", &repo);

        let mut tx = TxRepoProposalUpsertOwner {
            common: common(1),
            proposal: ProposalCommon {
                repo_name: "repo1".into(),
                id: "12".into(),
                value: "2".parse().unwrap(),
            },
            addresses: vec!["fg1new".into()],
            veto: false,
        };
        let e = validate(&mut chain, &Tx::RepoProposalUpsertOwner(tx.clone())).unwrap_err();
        assert!(e.to_string().contains("cannot be less than 5"));

        tx.proposal.value = "5".parse().unwrap();
        assert!(validate(&mut chain, &Tx::RepoProposalUpsertOwner(tx)).is_ok());
    }

    #[test]
    fn delete_push_key_requests_cannot_carry_updates() {
        let mut chain = TestChain::new();
        let id = PublicKey([3; 32]).to_push_key_id();
        let tx = Tx::UpDelPushKey(TxUpDelPushKey {
            common: common(1),
            id,
            add_scopes: vec!["repo1".into()],
            remove_scopes: vec![],
            fee_cap: None,
            delete: true,
        });
        let e = validate(&mut chain, &tx).unwrap_err();
        assert!(e.to_string().contains("cannot carry updates"));
    }

    #[test]
    fn numeric_proposal_ids_only() {
        assert!(is_numeric_id("123"));
        assert!(!is_numeric_id("12a"));
        assert!(!is_numeric_id(""));
        assert!(!is_numeric_id("12345678901234567"));
    }
}
