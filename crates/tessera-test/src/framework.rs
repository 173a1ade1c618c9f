//! Operations the `Test` module exposes to test scripts

use crate::config::Configuration;
use crate::error::{BackendError, BackendResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_crypto::{HashAlgorithm, SignatureAlgorithm};
use tessera_primitives::Address;
use tessera_types::Value;

/// Public half of an account key, as seen by test scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPublicKey {
    /// Encoded public key (64 bytes, x || y)
    pub public_key: Vec<u8>,
    /// Signature algorithm
    pub sign_algo: SignatureAlgorithm,
    /// Hash algorithm
    pub hash_algo: HashAlgorithm,
}

/// Account created by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Ledger address
    pub address: Address,
    /// Key the backend signs with
    pub public_key: AccountPublicKey,
}

/// Outcome of a script run
#[derive(Debug)]
pub enum ScriptResult {
    /// Returned value
    Succeeded(Value),
    /// Any failure, from import rewriting to execution
    Failed(BackendError),
}

impl ScriptResult {
    /// Returned value, if the script succeeded
    pub fn value(&self) -> Option<&Value> {
        match self {
            ScriptResult::Succeeded(value) => Some(value),
            ScriptResult::Failed(_) => None,
        }
    }

    /// Error, if the script failed
    pub fn error(&self) -> Option<&BackendError> {
        match self {
            ScriptResult::Succeeded(_) => None,
            ScriptResult::Failed(err) => Some(err),
        }
    }
}

/// Outcome of an executed transaction
#[derive(Debug, Default)]
pub struct TransactionResult {
    /// Execution error, if the transaction failed
    pub error: Option<BackendError>,
}

impl TransactionResult {
    /// True when the transaction executed without error
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Constructor arguments recorded for a deployed contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInvocation {
    /// Argument values
    pub arguments: Vec<Value>,
    /// Type ids of the arguments
    pub argument_types: Vec<String>,
}

/// Deployed contracts keyed by contract name
pub type ContractInvocations = Arc<RwLock<HashMap<String, ContractInvocation>>>;

/// Blockchain operations available to a test script
pub trait TestFramework: Send {
    /// Run a read-only script against committed state
    fn run_script(&mut self, code: &str, arguments: &[Value]) -> ScriptResult;

    /// Create a new account with a freshly generated key
    fn create_account(&mut self) -> BackendResult<Account>;

    /// Queue a transaction into the pending block
    ///
    /// `signers` sign the payload; the service account pays.
    fn add_transaction(
        &mut self,
        code: &str,
        authorizers: &[Address],
        signers: &[Account],
        arguments: &[Value],
    ) -> BackendResult<()>;

    /// Execute the next queued transaction, `None` when nothing is queued
    fn execute_next_transaction(&mut self) -> Option<TransactionResult>;

    /// Commit the pending block
    fn commit_block(&mut self) -> BackendResult<()>;

    /// Deploy `code` as contract `name` to `account`
    fn deploy_contract(
        &mut self,
        name: &str,
        code: &str,
        account: &Account,
        arguments: &[Value],
    ) -> BackendResult<()>;

    /// Read a file through the embedder's file resolver
    fn read_file(&self, path: &str) -> BackendResult<String>;

    /// Replace the import configuration
    fn use_configuration(&mut self, configuration: Configuration);
}
