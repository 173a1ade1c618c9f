//! Error types for the test runner and backend

use crate::imports::ImportSyntaxError;
use crate::location::Location;
use tessera_crypto::CryptoError;
use tessera_emulator::{EmulatorError, ExecutionError};
use tessera_primitives::Address;
use tessera_types::CodecError;
use thiserror::Error;

/// Failure reported by the language runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Source failed to parse
    #[error("parsing failed for {location}: {message}")]
    Parse {
        /// Program being parsed
        location: Location,
        /// Parser message
        message: String,
    },

    /// Program failed to type-check
    #[error("checking failed for {location}: {message}")]
    Check {
        /// Program being checked
        location: Location,
        /// Checker message
        message: String,
    },

    /// Error raised while running a function
    #[error("{0}")]
    Execution(String),

    /// Function is not declared
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// A test assertion failed
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// Import could not be loaded
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Blockchain call made by the program failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure loading an imported program
#[derive(Debug, Error)]
pub enum ImportError {
    /// No import resolver was configured
    #[error("import resolver not provided: cannot import {0}")]
    ImportResolverNotProvided(Location),

    /// Imported code imports something other than `Test` or a deployed contract
    #[error("nested imports are not supported: {0}")]
    NestedImportsNotSupported(Location),

    /// Resolver failed
    #[error("failed to resolve import {location}: {message}")]
    Resolve {
        /// Import being resolved
        location: Location,
        /// Resolver message
        message: String,
    },

    /// Imported program failed to parse or check
    #[error("failed to load import {location}: {source}")]
    Check {
        /// Import being loaded
        location: Location,
        /// Runtime error
        source: Box<RuntimeError>,
    },

    /// Contract value requested for a contract that was never deployed by the test
    #[error("contract invocation not found: {0}")]
    ContractInvocationNotFound(String),

    /// Ledger lookup failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure inside the blockchain test backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Ledger rejected an operation
    #[error("ledger error: {0}")]
    Ledger(#[from] EmulatorError),

    /// Script or transaction execution failed
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// Argument or result encoding failed
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Signing failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Submitted code has malformed imports
    #[error(transparent)]
    ImportSyntax(#[from] ImportSyntaxError),

    /// `read_file` called without a file resolver
    #[error("file resolver not provided")]
    FileResolverNotProvided,

    /// File resolver failed
    #[error("failed to read {path}: {message}")]
    FileResolver {
        /// Requested path
        path: String,
        /// Resolver message
        message: String,
    },

    /// No signer registered for the address
    #[error("no signer registered for {0}")]
    SignerNotFound(Address),

    /// Account holds no contract with the name
    #[error("contract {name} not found in account {address}")]
    ContractNotFound {
        /// Account address
        address: Address,
        /// Contract name
        name: String,
    },

    /// A submitted transaction was not executed
    #[error("transaction was not executed")]
    TransactionNotExecuted,

    /// Deploy attempted while the pending block holds queued transactions
    #[error("cannot deploy contract {name}: {pending} transaction(s) pending in the current block")]
    PendingTransactions {
        /// Contract name
        name: String,
        /// Transactions queued since the last commit
        pending: u64,
    },
}

/// Backend operation result
pub type BackendResult<T> = Result<T, BackendError>;

/// Error reported for a test run or a single case
#[derive(Debug, Error)]
pub enum TestError {
    /// Runtime failure
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Import failure
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Malformed import declaration
    #[error(transparent)]
    ImportSyntax(#[from] ImportSyntaxError),

    /// Test function declares parameters
    #[error("test functions should have no arguments")]
    TestFunctionHasArguments(String),

    /// Test function declares a return type
    #[error("test functions should have no return values")]
    TestFunctionHasReturnValue(String),

    /// Hook or case panicked
    #[error("{0}")]
    Panic(String),
}

/// Runner result
pub type TestResultOf<T> = Result<T, TestError>;
