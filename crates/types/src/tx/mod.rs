//! The transaction model.
//!
//! Transactions form a tagged union; every variant carries the common
//! header (`TxCommon`) plus its payload. The executor dispatches on
//! `Tx::tx_type()` and contracts downcast via the `as_*` accessors.

use crate::address::{Address, PublicKey};
use crate::proposal::VoteChoice;
use crate::push::PushNote;
use crate::repo::{ContributorPolicy, FeeMode, RepoConfigUpdate};
use crate::account::StakeKind;
use crate::token::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The type tag of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxType {
    CoinTransfer,
    TicketPurchase,
    TicketUnbond,
    SetDelegatorCommission,
    RepoCreate,
    Push,
    NamespaceAcquire,
    NamespaceDomainUpdate,
    RegisterPushKey,
    UpDelPushKey,
    RepoProposalUpsertOwner,
    RepoProposalUpdate,
    RepoProposalRegisterPushKeys,
    RepoProposalMergeRequest,
    RepoProposalVote,
    RepoProposalFeeDeposit,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxType::CoinTransfer => "coin_transfer",
            TxType::TicketPurchase => "ticket_purchase",
            TxType::TicketUnbond => "ticket_unbond",
            TxType::SetDelegatorCommission => "set_delegator_commission",
            TxType::RepoCreate => "repo_create",
            TxType::Push => "push",
            TxType::NamespaceAcquire => "namespace_acquire",
            TxType::NamespaceDomainUpdate => "namespace_domain_update",
            TxType::RegisterPushKey => "register_push_key",
            TxType::UpDelPushKey => "up_del_push_key",
            TxType::RepoProposalUpsertOwner => "repo_proposal_upsert_owner",
            TxType::RepoProposalUpdate => "repo_proposal_update",
            TxType::RepoProposalRegisterPushKeys => "repo_proposal_register_push_keys",
            TxType::RepoProposalMergeRequest => "repo_proposal_merge_request",
            TxType::RepoProposalVote => "repo_proposal_vote",
            TxType::RepoProposalFeeDeposit => "repo_proposal_fee_deposit",
        };
        f.write_str(s)
    }
}

/// Fields shared by every transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxCommon {
    /// The sender's next account nonce.
    pub nonce: u64,
    pub fee: Amount,
    pub sender_pub_key: PublicKey,
    pub timestamp: u64,
}

impl TxCommon {
    /// The sender's derived account address.
    pub fn sender_address(&self) -> Address {
        self.sender_pub_key.to_address()
    }
}

/// Transfers coins from the sender to an account, repo or namespace target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxCoinTransfer {
    pub common: TxCommon,
    pub to: Address,
    pub value: Amount,
}

/// Purchases a validator or host ticket, bonding `value` as a stake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxTicketPurchase {
    pub common: TxCommon,
    pub ticket_type: StakeKind,
    pub value: Amount,
}

/// Schedules the unbonding of a host ticket's stake.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxTicketUnbond {
    pub common: TxCommon,
    /// Hex hash of the ticket to unbond.
    pub ticket_hash: String,
}

/// Sets the sender's delegator commission percentage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxSetDelegatorCommission {
    pub common: TxCommon,
    pub commission: f64,
}

/// Creates a repository.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoCreate {
    pub common: TxCommon,
    pub name: String,
    pub config: RepoConfigUpdate,
}

/// Applies a push note to a repository.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxPush {
    pub common: TxCommon,
    pub note: PushNote,
}

/// Acquires a namespace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxNamespaceAcquire {
    pub common: TxCommon,
    pub name: String,
    pub value: Amount,
    /// Transfer ownership to a repository; wins over `transfer_to_account`.
    pub transfer_to_repo: Option<String>,
    pub transfer_to_account: Option<Address>,
    pub domains: BTreeMap<String, String>,
}

/// Upserts or deletes domains of an owned namespace. An empty target deletes
/// the domain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxNamespaceDomainUpdate {
    pub common: TxCommon,
    pub name: String,
    pub domains: BTreeMap<String, String>,
}

/// Registers a push key for the sender.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRegisterPushKey {
    pub common: TxCommon,
    pub pub_key: PublicKey,
    pub scopes: Vec<String>,
    pub fee_cap: Amount,
}

/// Updates or deletes an existing push key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxUpDelPushKey {
    pub common: TxCommon,
    pub id: String,
    pub add_scopes: Vec<String>,
    /// Scope indices to remove, applied from high to low.
    pub remove_scopes: Vec<usize>,
    pub fee_cap: Option<Amount>,
    pub delete: bool,
}

/// Header shared by the proposal-creation transactions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalCommon {
    pub repo_name: String,
    /// Caller-chosen numeric proposal ID.
    pub id: String,
    /// Proposal-fee deposit paid with the transaction.
    pub value: Amount,
}

/// Proposes adding or updating repository owners.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalUpsertOwner {
    pub common: TxCommon,
    pub proposal: ProposalCommon,
    pub addresses: Vec<String>,
    pub veto: bool,
}

/// Proposes a repository config update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalUpdate {
    pub common: TxCommon,
    pub proposal: ProposalCommon,
    pub config: RepoConfigUpdate,
}

/// Proposes registering push keys as contributors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalRegisterPushKeys {
    pub common: TxCommon,
    pub proposal: ProposalCommon,
    pub key_ids: Vec<String>,
    pub policies: Vec<ContributorPolicy>,
    pub fee_mode: FeeMode,
    pub fee_cap: Amount,
    pub namespace: Option<String>,
    pub namespace_only: Option<String>,
}

/// Opens a merge-request proposal directly (outside a push).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalMergeRequest {
    pub common: TxCommon,
    pub proposal: ProposalCommon,
    pub base_branch: String,
    pub base_branch_hash: String,
    pub target_branch: String,
    pub target_branch_hash: String,
}

/// Casts a vote on an open proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalVote {
    pub common: TxCommon,
    pub repo_name: String,
    pub proposal_id: String,
    pub vote: VoteChoice,
}

/// Deposits an additional proposal fee during the deposit phase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRepoProposalFeeDeposit {
    pub common: TxCommon,
    pub proposal: ProposalCommon,
}

/// A parsed transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tx {
    CoinTransfer(TxCoinTransfer),
    TicketPurchase(TxTicketPurchase),
    TicketUnbond(TxTicketUnbond),
    SetDelegatorCommission(TxSetDelegatorCommission),
    RepoCreate(TxRepoCreate),
    Push(TxPush),
    NamespaceAcquire(TxNamespaceAcquire),
    NamespaceDomainUpdate(TxNamespaceDomainUpdate),
    RegisterPushKey(TxRegisterPushKey),
    UpDelPushKey(TxUpDelPushKey),
    RepoProposalUpsertOwner(TxRepoProposalUpsertOwner),
    RepoProposalUpdate(TxRepoProposalUpdate),
    RepoProposalRegisterPushKeys(TxRepoProposalRegisterPushKeys),
    RepoProposalMergeRequest(TxRepoProposalMergeRequest),
    RepoProposalVote(TxRepoProposalVote),
    RepoProposalFeeDeposit(TxRepoProposalFeeDeposit),
}

impl Tx {
    pub fn tx_type(&self) -> TxType {
        match self {
            Tx::CoinTransfer(_) => TxType::CoinTransfer,
            Tx::TicketPurchase(_) => TxType::TicketPurchase,
            Tx::TicketUnbond(_) => TxType::TicketUnbond,
            Tx::SetDelegatorCommission(_) => TxType::SetDelegatorCommission,
            Tx::RepoCreate(_) => TxType::RepoCreate,
            Tx::Push(_) => TxType::Push,
            Tx::NamespaceAcquire(_) => TxType::NamespaceAcquire,
            Tx::NamespaceDomainUpdate(_) => TxType::NamespaceDomainUpdate,
            Tx::RegisterPushKey(_) => TxType::RegisterPushKey,
            Tx::UpDelPushKey(_) => TxType::UpDelPushKey,
            Tx::RepoProposalUpsertOwner(_) => TxType::RepoProposalUpsertOwner,
            Tx::RepoProposalUpdate(_) => TxType::RepoProposalUpdate,
            Tx::RepoProposalRegisterPushKeys(_) => TxType::RepoProposalRegisterPushKeys,
            Tx::RepoProposalMergeRequest(_) => TxType::RepoProposalMergeRequest,
            Tx::RepoProposalVote(_) => TxType::RepoProposalVote,
            Tx::RepoProposalFeeDeposit(_) => TxType::RepoProposalFeeDeposit,
        }
    }

    /// The common header shared by every variant.
    pub fn common(&self) -> &TxCommon {
        match self {
            Tx::CoinTransfer(t) => &t.common,
            Tx::TicketPurchase(t) => &t.common,
            Tx::TicketUnbond(t) => &t.common,
            Tx::SetDelegatorCommission(t) => &t.common,
            Tx::RepoCreate(t) => &t.common,
            Tx::Push(t) => &t.common,
            Tx::NamespaceAcquire(t) => &t.common,
            Tx::NamespaceDomainUpdate(t) => &t.common,
            Tx::RegisterPushKey(t) => &t.common,
            Tx::UpDelPushKey(t) => &t.common,
            Tx::RepoProposalUpsertOwner(t) => &t.common,
            Tx::RepoProposalUpdate(t) => &t.common,
            Tx::RepoProposalRegisterPushKeys(t) => &t.common,
            Tx::RepoProposalMergeRequest(t) => &t.common,
            Tx::RepoProposalVote(t) => &t.common,
            Tx::RepoProposalFeeDeposit(t) => &t.common,
        }
    }

    pub fn nonce(&self) -> u64 {
        self.common().nonce
    }

    pub fn fee(&self) -> Amount {
        self.common().fee
    }

    pub fn sender_pub_key(&self) -> PublicKey {
        self.common().sender_pub_key
    }

    pub fn sender_address(&self) -> Address {
        self.common().sender_address()
    }
}

/// The structured result returned to the consensus driver for every
/// delivered transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub code: u32,
    pub log: String,
}

impl TxResponse {
    pub fn ok() -> Self {
        TxResponse {
            code: crate::error::codes::OK,
            log: String::new(),
        }
    }

    pub fn failure(code: u32, log: String) -> Self {
        TxResponse { code, log }
    }

    pub fn is_ok(&self) -> bool {
        self.code == crate::error::codes::OK
    }
}
