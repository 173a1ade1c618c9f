//! Ledger interface consumed by the test backend

use crate::error::{EmulatorResult, ExecutionError};
use tessera_crypto::{HashAlgorithm, PrivateKey, Signer};
use tessera_primitives::{Address, BlockHeight, SequenceNumber, H256};
use tessera_types::{Account, AccountKey, Block, Event, Transaction};
use std::collections::BTreeMap;

/// Service account key with its current sequence number
#[derive(Clone, Debug)]
pub struct ServiceKey {
    /// Service account address
    pub address: Address,
    /// Key index on the service account
    pub index: u32,
    /// Sequence number as of the last committed block
    pub sequence_number: SequenceNumber,
    /// Hash algorithm of the key
    pub hash_algo: HashAlgorithm,
    /// Private key
    pub private_key: PrivateKey,
}

impl ServiceKey {
    /// Signer for this key
    pub fn signer(&self) -> Signer {
        Signer::new(self.private_key.clone(), self.hash_algo)
    }
}

/// Result of a read-only script
#[derive(Clone, Debug)]
pub struct ScriptOutcome {
    /// Encoded return value, or the execution error
    pub result: Result<Vec<u8>, ExecutionError>,
    /// Program logs
    pub logs: Vec<String>,
}

/// Result of executing one queued transaction
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    /// Transaction id
    pub transaction_id: H256,
    /// Execution error, if the transaction failed
    pub error: Option<ExecutionError>,
    /// Program logs
    pub logs: Vec<String>,
    /// Emitted events
    pub events: Vec<Event>,
}

impl TransactionOutcome {
    /// True when execution succeeded
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// An ephemeral ledger with a pending-block model
///
/// Transactions are queued into the pending block, executed one at a time,
/// and become visible to scripts once the block is committed.
pub trait Blockchain: Send {
    /// Service account key, with the sequence number of the last committed block
    fn service_key(&self) -> ServiceKey;

    /// Read an account from committed state
    fn get_account(&self, address: &Address) -> EmulatorResult<Account>;

    /// Create an account directly, returning its address
    fn create_account(
        &mut self,
        keys: Vec<AccountKey>,
        contracts: BTreeMap<String, Vec<u8>>,
    ) -> EmulatorResult<Address>;

    /// Run a script against committed state
    fn execute_script(&self, code: &[u8], arguments: &[Vec<u8>]) -> EmulatorResult<ScriptOutcome>;

    /// Queue a signed transaction into the pending block
    fn add_transaction(&mut self, tx: Transaction) -> EmulatorResult<()>;

    /// Execute the next queued transaction
    fn execute_next_transaction(&mut self) -> EmulatorResult<TransactionOutcome>;

    /// Commit the pending block
    fn commit_block(&mut self) -> EmulatorResult<Block>;

    /// Latest committed block
    fn latest_block(&self) -> Block;

    /// Height of the pending block
    fn pending_block_height(&self) -> BlockHeight;
}
