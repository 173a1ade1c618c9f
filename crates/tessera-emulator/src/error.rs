//! Emulator error types

use tessera_crypto::CryptoError;
use tessera_primitives::{Address, SequenceNumber, H256};
use tessera_types::CodecError;
use thiserror::Error;

/// Ledger-level errors
///
/// These reject an operation outright. Failures *inside* a transaction or
/// script are reported as [`ExecutionError`] within the outcome instead.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// A transaction was added after the pending block started executing
    #[error("pending block {height} is currently being executed")]
    PendingBlockMidExecution {
        /// Pending block height
        height: u64,
    },

    /// No queued transactions are left to execute
    #[error("pending block {height} contains no transactions to execute")]
    PendingBlockTransactionsExhausted {
        /// Pending block height
        height: u64,
    },

    /// The pending block still has queued transactions
    #[error("pending block {height} cannot be committed before execution")]
    PendingBlockCommitBeforeExecution {
        /// Pending block height
        height: u64,
    },

    /// Transaction already submitted
    #[error("transaction {0} has already been submitted")]
    DuplicateTransaction(H256),

    /// Account not found
    #[error("account not found: {0}")]
    AccountNotFound(Address),

    /// Key not found on account
    #[error("key {key_index} not found on account {address}")]
    KeyNotFound {
        /// Account
        address: Address,
        /// Key index
        key_index: u32,
    },

    /// A required signature is missing
    #[error("missing {role} signature for account {address}")]
    MissingSignature {
        /// Account that should have signed
        address: Address,
        /// `payload` or `envelope`
        role: &'static str,
    },

    /// A signature did not verify
    #[error("invalid {role} signature for account {address} key {key_index}")]
    InvalidSignature {
        /// Signing account
        address: Address,
        /// Key index
        key_index: u32,
        /// `payload` or `envelope`
        role: &'static str,
    },

    /// Argument or result encoding failed
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Key material error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while executing a transaction or script
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Program panicked
    #[error("panic: {0}")]
    Panic(String),

    /// Runtime failure reported by the VM
    #[error("execution failed: {0}")]
    Runtime(String),

    /// Proposal key sequence number does not match the ledger
    #[error("invalid proposal key sequence number for {address}: expected {expected}, got {got}")]
    SequenceNumberMismatch {
        /// Proposer
        address: Address,
        /// Sequence number on the ledger
        expected: SequenceNumber,
        /// Sequence number in the transaction
        got: SequenceNumber,
    },

    /// Account not found
    #[error("account not found: {0}")]
    AccountNotFound(Address),

    /// Contract changes require the account to authorize the transaction
    #[error("account {0} did not authorize this transaction")]
    Unauthorized(Address),

    /// A contract with this name is already deployed on the account
    #[error("cannot overwrite existing contract {name} in account {address}")]
    ContractAlreadyExists {
        /// Account
        address: Address,
        /// Contract name
        name: String,
    },

    /// Arguments could not be decoded
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Result type for ledger operations
pub type EmulatorResult<T> = Result<T, EmulatorError>;
