//! In-memory ledger implementation

use crate::blockchain::{Blockchain, ScriptOutcome, ServiceKey, TransactionOutcome};
use crate::config::{EmulatorConfig, SERVICE_ADDRESS};
use crate::error::{EmulatorError, EmulatorResult, ExecutionError};
use crate::state::LedgerState;
use crate::vm::{ScriptContext, TransactionContext, VirtualMachine};
use std::collections::{BTreeMap, HashSet};
use tessera_crypto::{HashAlgorithm, PrivateKey};
use tessera_primitives::{Address, BlockHeight, H256};
use tessera_types::{
    decode_arguments, encode_value, Account, AccountKey, Block, Transaction,
};
use tracing::{debug, warn};

/// Block under construction
#[derive(Debug)]
struct PendingBlock {
    height: BlockHeight,
    parent_id: H256,
    /// Working copy of the ledger, updated by each successful transaction
    state: LedgerState,
    transactions: Vec<Transaction>,
    results: Vec<TransactionOutcome>,
}

impl PendingBlock {
    fn new(height: BlockHeight, parent_id: H256, state: LedgerState) -> Self {
        Self {
            height,
            parent_id,
            state,
            transactions: Vec::new(),
            results: Vec::new(),
        }
    }

    fn execution_started(&self) -> bool {
        !self.results.is_empty()
    }

    fn execution_complete(&self) -> bool {
        self.results.len() == self.transactions.len()
    }

    fn next_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.results.len())
    }

    fn contains(&self, id: &H256) -> bool {
        self.transactions.iter().any(|tx| tx.id() == *id)
    }
}

/// Ephemeral in-memory ledger
pub struct Emulator<V: VirtualMachine> {
    vm: V,
    service_private_key: PrivateKey,
    service_hash_algo: HashAlgorithm,
    committed: LedgerState,
    blocks: Vec<Block>,
    pending: PendingBlock,
    /// Ids of every transaction ever committed
    committed_transactions: HashSet<H256>,
}

impl<V: VirtualMachine> Emulator<V> {
    /// Create an emulator with the default configuration
    pub fn new(vm: V) -> EmulatorResult<Self> {
        Self::with_config(vm, EmulatorConfig::default())
    }

    /// Create an emulator with `config`
    ///
    /// The genesis block (height 0) holds the service account; the first
    /// pending block is height 1.
    pub fn with_config(vm: V, config: EmulatorConfig) -> EmulatorResult<Self> {
        let service_private_key = config.service_key()?;
        let mut committed = LedgerState::new(SERVICE_ADDRESS);

        let address = committed.allocate_address();
        let key = AccountKey::new(service_private_key.public_key(), config.service_hash_algo);
        let mut service = Account::new(address, vec![key]);
        service.balance = config.service_balance;
        committed.set_account(service);

        let genesis = Block::genesis();
        let pending = PendingBlock::new(genesis.height + 1, genesis.id, committed.clone());
        debug!(service = %address, "emulator created");

        Ok(Self {
            vm,
            service_private_key,
            service_hash_algo: config.service_hash_algo,
            committed,
            blocks: vec![genesis],
            pending,
            committed_transactions: HashSet::new(),
        })
    }

    /// Block at `height`
    pub fn block(&self, height: BlockHeight) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    /// Outcomes of the transactions executed in the pending block so far
    pub fn pending_results(&self) -> &[TransactionOutcome] {
        &self.pending.results
    }

    fn verify_signatures(&self, tx: &Transaction) -> EmulatorResult<()> {
        let state = &self.pending.state;

        let payload_message = tx.payload_message();
        for sig in &tx.payload_signatures {
            let account = state
                .account(&sig.address)
                .ok_or(EmulatorError::AccountNotFound(sig.address))?;
            let key = account.key(sig.key_index).ok_or(EmulatorError::KeyNotFound {
                address: sig.address,
                key_index: sig.key_index,
            })?;
            if !key.verify(&payload_message, &sig.signature) {
                return Err(EmulatorError::InvalidSignature {
                    address: sig.address,
                    key_index: sig.key_index,
                    role: "payload",
                });
            }
        }

        let envelope_message = tx.envelope_message();
        for sig in &tx.envelope_signatures {
            let account = state
                .account(&sig.address)
                .ok_or(EmulatorError::AccountNotFound(sig.address))?;
            let key = account.key(sig.key_index).ok_or(EmulatorError::KeyNotFound {
                address: sig.address,
                key_index: sig.key_index,
            })?;
            if !key.verify(&envelope_message, &sig.signature) {
                return Err(EmulatorError::InvalidSignature {
                    address: sig.address,
                    key_index: sig.key_index,
                    role: "envelope",
                });
            }
        }

        if !tx.envelope_signatures.iter().any(|s| s.address == tx.payer) {
            return Err(EmulatorError::MissingSignature {
                address: tx.payer,
                role: "envelope",
            });
        }

        for authorizer in &tx.authorizers {
            if *authorizer == tx.payer {
                continue;
            }
            if !tx.payload_signatures.iter().any(|s| s.address == *authorizer) {
                return Err(EmulatorError::MissingSignature {
                    address: *authorizer,
                    role: "payload",
                });
            }
        }

        Ok(())
    }

    fn run_transaction(&mut self, tx: &Transaction, id: H256) -> TransactionOutcome {
        let mut outcome = TransactionOutcome {
            transaction_id: id,
            error: None,
            logs: Vec::new(),
            events: Vec::new(),
        };

        let proposal = &tx.proposal_key;
        let key = self
            .pending
            .state
            .account_mut(&proposal.address)
            .and_then(|account| account.key_mut(proposal.key_index));
        let Some(key) = key else {
            outcome.error = Some(ExecutionError::AccountNotFound(proposal.address));
            return outcome;
        };
        if key.sequence_number != proposal.sequence_number {
            outcome.error = Some(ExecutionError::SequenceNumberMismatch {
                address: proposal.address,
                expected: key.sequence_number,
                got: proposal.sequence_number,
            });
            return outcome;
        }
        key.sequence_number += 1;

        let arguments = match decode_arguments(&tx.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                outcome.error = Some(ExecutionError::InvalidArguments(e.to_string()));
                return outcome;
            }
        };

        let code = tx.script_str();
        let mut working = self.pending.state.clone();
        let mut ctx = TransactionContext::new(&mut working, id, tx.authorizers.clone());
        let result = self.vm.execute_transaction(&mut ctx, &code, &arguments);
        let (logs, events) = ctx.into_effects();
        outcome.logs = logs;

        match result {
            Ok(()) => {
                outcome.events = events;
                self.pending.state = working;
            }
            Err(e) => outcome.error = Some(e),
        }
        outcome
    }
}

impl<V: VirtualMachine> Blockchain for Emulator<V> {
    fn service_key(&self) -> ServiceKey {
        let sequence_number = self
            .committed
            .account(&SERVICE_ADDRESS)
            .and_then(|account| account.key(0))
            .map(|key| key.sequence_number)
            .unwrap_or_default();
        ServiceKey {
            address: SERVICE_ADDRESS,
            index: 0,
            sequence_number,
            hash_algo: self.service_hash_algo,
            private_key: self.service_private_key.clone(),
        }
    }

    fn get_account(&self, address: &Address) -> EmulatorResult<Account> {
        self.committed
            .account(address)
            .cloned()
            .ok_or(EmulatorError::AccountNotFound(*address))
    }

    fn create_account(
        &mut self,
        keys: Vec<AccountKey>,
        contracts: BTreeMap<String, Vec<u8>>,
    ) -> EmulatorResult<Address> {
        let address = self.committed.allocate_address();
        let mut account = Account::new(address, keys);
        account.contracts = contracts;

        // both copies allocate in lockstep so later accounts agree on addresses
        self.pending.state.allocate_address();
        self.pending.state.set_account(account.clone());
        self.committed.set_account(account);

        debug!(%address, "account created");
        Ok(address)
    }

    fn execute_script(&self, code: &[u8], arguments: &[Vec<u8>]) -> EmulatorResult<ScriptOutcome> {
        let arguments = decode_arguments(arguments)?;
        let code = String::from_utf8_lossy(code);

        let mut ctx = ScriptContext::new(&self.committed);
        let result = self.vm.execute_script(&mut ctx, &code, &arguments);
        let logs = ctx.into_logs();

        let result = match result {
            Ok(value) => Ok(encode_value(&value)?),
            Err(e) => Err(e),
        };
        debug!(succeeded = result.is_ok(), "script executed");
        Ok(ScriptOutcome { result, logs })
    }

    fn add_transaction(&mut self, tx: Transaction) -> EmulatorResult<()> {
        if self.pending.execution_started() {
            return Err(EmulatorError::PendingBlockMidExecution {
                height: self.pending.height,
            });
        }

        let id = tx.id();
        if self.committed_transactions.contains(&id) || self.pending.contains(&id) {
            return Err(EmulatorError::DuplicateTransaction(id));
        }

        let state = &self.pending.state;
        if state.account(&tx.payer).is_none() {
            return Err(EmulatorError::AccountNotFound(tx.payer));
        }
        if state.account(&tx.proposal_key.address).is_none() {
            return Err(EmulatorError::AccountNotFound(tx.proposal_key.address));
        }
        self.verify_signatures(&tx)?;

        debug!(
            id = %id,
            height = self.pending.height,
            sequence_number = tx.proposal_key.sequence_number,
            "transaction queued"
        );
        self.pending.transactions.push(tx);
        Ok(())
    }

    fn execute_next_transaction(&mut self) -> EmulatorResult<TransactionOutcome> {
        let Some(tx) = self.pending.next_transaction().cloned() else {
            return Err(EmulatorError::PendingBlockTransactionsExhausted {
                height: self.pending.height,
            });
        };

        let id = tx.id();
        let outcome = self.run_transaction(&tx, id);
        match &outcome.error {
            None => debug!(id = %id, "transaction executed"),
            Some(e) => warn!(id = %id, error = %e, "transaction failed"),
        }
        self.pending.results.push(outcome.clone());
        Ok(outcome)
    }

    fn commit_block(&mut self) -> EmulatorResult<Block> {
        if !self.pending.execution_complete() {
            return Err(EmulatorError::PendingBlockCommitBeforeExecution {
                height: self.pending.height,
            });
        }

        let ids: Vec<H256> = self.pending.results.iter().map(|r| r.transaction_id).collect();
        let block = Block::new(self.pending.height, self.pending.parent_id, ids);
        self.committed_transactions.extend(block.transaction_ids.iter().copied());

        let next = PendingBlock::new(block.height + 1, block.id, LedgerState::default());
        let finished = std::mem::replace(&mut self.pending, next);
        self.committed = finished.state;
        self.pending.state = self.committed.clone();

        debug!(
            height = block.height,
            transactions = block.transaction_ids.len(),
            "block committed"
        );
        self.blocks.push(block.clone());
        Ok(block)
    }

    fn latest_block(&self) -> Block {
        self.blocks
            .last()
            .cloned()
            .unwrap_or_else(Block::genesis)
    }

    fn pending_block_height(&self) -> BlockHeight {
        self.pending.height
    }
}
