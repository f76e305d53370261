//! Core error types for the forge engine.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Response codes surfaced to the consensus driver.
///
/// `RE_EXEC_BLOCK` is reserved by the consensus engine: returning it causes
/// the block to be retried after a short backoff, once missing push objects
/// have replicated.
pub mod codes {
    /// The transaction was applied successfully.
    pub const OK: u32 = 0;
    /// The transaction failed decoding or apply-time validation.
    pub const FAILED_DECODE: u32 = 1;
    /// A contract rejected the transaction during execution.
    pub const EXEC_FAILURE: u32 = 2;
    /// A dependency was transiently missing; consensus must re-execute the block.
    pub const RE_EXEC_BLOCK: u32 = 75;
}

/// Signalling sentinel raised when a push requires a git object that has not
/// yet been replicated to this node.
///
/// The executor compares against the *root cause* of a contract error, so
/// this type must propagate without being flattened into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("object not found")]
pub struct ErrObjectNotFound;

/// Errors from the state tree, the index database or the keeper layer.
#[derive(Error, Debug)]
pub enum StateError {
    /// The requested key was not found in the state.
    #[error("key not found in state")]
    KeyNotFound,
    /// An error occurred while decoding persisted state.
    #[error("decode error: {0}")]
    Decode(String),
    /// An error occurred while encoding state for persistence.
    #[error("encode error: {0}")]
    Encode(String),
    /// An error occurred in the storage backend.
    #[error("state backend error: {0}")]
    Backend(String),
    /// The provided value was invalid.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::Encode(_) => "STATE_ENCODE_ERROR",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::InvalidValue(_) => "STATE_INVALID_VALUE",
        }
    }
}

/// Apply-time validation failure, annotated with the offending field.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A structural or consistency check failed for a named field.
    #[error("field:{field}, msg:{msg}")]
    Field {
        /// The transaction field that failed validation.
        field: String,
        /// A human-readable description of the failure.
        msg: String,
    },
}

impl ValidationError {
    pub fn field<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        ValidationError::Field {
            field: field.into(),
            msg: msg.into(),
        }
    }
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Field { .. } => "VALIDATION_FIELD_ERROR",
        }
    }
}

/// Errors raised by system contracts during execution.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The transaction nonce is not the sender's next nonce.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce {
        /// The next nonce expected from on-chain state.
        expected: u64,
        /// The nonce carried by the transaction.
        got: u64,
    },
    /// The sender's spendable balance cannot cover the transaction.
    #[error("insufficient balance: spendable {spendable}, required {required}")]
    InsufficientBalance {
        /// The spendable balance at the execution height.
        spendable: String,
        /// The total amount the transaction requires.
        required: String,
    },
    /// The referenced ticket does not exist.
    #[error("ticket not found")]
    TicketNotFound,
    /// No bonded stake matches the referenced ticket.
    #[error("stake not found for ticket")]
    StakeNotFound,
    /// The referenced repository does not exist.
    #[error("repo not found: {0}")]
    RepoNotFound(String),
    /// The referenced namespace does not exist.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),
    /// The referenced push key does not exist.
    #[error("push key not found: {0}")]
    PushKeyNotFound(String),
    /// The referenced proposal does not exist.
    #[error("proposal not found: {0}")]
    ProposalNotFound(String),
    /// A proposal with the given ID already exists on the repository.
    #[error("proposal id already exists: {0}")]
    ProposalExists(String),
    /// The sender is not in the proposal's eligible voter population.
    #[error("sender is not an eligible voter")]
    NotAVoter,
    /// The sender has already cast a vote on the proposal.
    #[error("vote already cast on proposal {0}")]
    AlreadyVoted(String),
    /// The proposal's voting period has closed or the outcome is decided.
    #[error("proposal is no longer open")]
    ProposalClosed,
    /// The proposal is still in its fee-deposit phase.
    #[error("proposal fee deposit period is still active")]
    DepositPhaseActive,
    /// The proposal's fee-deposit phase has ended.
    #[error("proposal fee deposit period has closed")]
    DepositPhaseClosed,
    /// A contract-specific consistency check failed.
    #[error("{0}")]
    Invalid(String),
    /// An error from the keeper/storage layer.
    #[error(transparent)]
    State(#[from] StateError),
    /// An error from the repository synchronizer seam. The root cause may be
    /// the `ErrObjectNotFound` sentinel.
    #[error(transparent)]
    Sync(#[from] anyhow::Error),
}

impl ContractError {
    /// True when the root cause of this error is the missing-object sentinel.
    pub fn is_object_not_found(&self) -> bool {
        match self {
            ContractError::Sync(e) => e.root_cause().downcast_ref::<ErrObjectNotFound>().is_some(),
            _ => false,
        }
    }
}

impl ErrorCode for ContractError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidNonce { .. } => "CONTRACT_INVALID_NONCE",
            Self::InsufficientBalance { .. } => "CONTRACT_INSUFFICIENT_BALANCE",
            Self::TicketNotFound => "CONTRACT_TICKET_NOT_FOUND",
            Self::StakeNotFound => "CONTRACT_STAKE_NOT_FOUND",
            Self::RepoNotFound(_) => "CONTRACT_REPO_NOT_FOUND",
            Self::NamespaceNotFound(_) => "CONTRACT_NAMESPACE_NOT_FOUND",
            Self::PushKeyNotFound(_) => "CONTRACT_PUSH_KEY_NOT_FOUND",
            Self::ProposalNotFound(_) => "CONTRACT_PROPOSAL_NOT_FOUND",
            Self::ProposalExists(_) => "CONTRACT_PROPOSAL_EXISTS",
            Self::NotAVoter => "CONTRACT_NOT_A_VOTER",
            Self::AlreadyVoted(_) => "CONTRACT_ALREADY_VOTED",
            Self::ProposalClosed => "CONTRACT_PROPOSAL_CLOSED",
            Self::DepositPhaseActive => "CONTRACT_DEPOSIT_PHASE_ACTIVE",
            Self::DepositPhaseClosed => "CONTRACT_DEPOSIT_PHASE_CLOSED",
            Self::Invalid(_) => "CONTRACT_INVALID",
            Self::State(_) => "CONTRACT_STATE_ERROR",
            Self::Sync(_) => "CONTRACT_SYNC_ERROR",
        }
    }
}

impl From<String> for ContractError {
    fn from(s: String) -> Self {
        ContractError::Invalid(s)
    }
}
