//! Virtual machine seam
//!
//! The emulator does not interpret programs itself. It hands the script
//! source and decoded arguments to a [`VirtualMachine`] together with a
//! context that mediates every ledger read and write.

use crate::error::ExecutionError;
use crate::state::LedgerState;
use tessera_primitives::{Address, H256};
use tessera_types::{Account, Event, Value};

/// Executes scripts and transactions against ledger state
pub trait VirtualMachine: Send + Sync {
    /// Run a read-only script and return its result
    fn execute_script(
        &self,
        ctx: &mut ScriptContext<'_>,
        code: &str,
        arguments: &[Value],
    ) -> Result<Value, ExecutionError>;

    /// Run a transaction
    fn execute_transaction(
        &self,
        ctx: &mut TransactionContext<'_>,
        code: &str,
        arguments: &[Value],
    ) -> Result<(), ExecutionError>;
}

/// Read-only view handed to scripts
pub struct ScriptContext<'a> {
    state: &'a LedgerState,
    logs: Vec<String>,
}

impl<'a> ScriptContext<'a> {
    /// Create a context over `state`
    pub fn new(state: &'a LedgerState) -> Self {
        Self {
            state,
            logs: Vec::new(),
        }
    }

    /// Read an account
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.state.account(address)
    }

    /// Record a program log line
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    /// Logs recorded so far
    pub fn into_logs(self) -> Vec<String> {
        self.logs
    }
}

/// Mutable view handed to transactions
pub struct TransactionContext<'a> {
    state: &'a mut LedgerState,
    transaction_id: H256,
    authorizers: Vec<Address>,
    logs: Vec<String>,
    events: Vec<Event>,
}

impl<'a> TransactionContext<'a> {
    /// Create a context over `state`
    pub fn new(state: &'a mut LedgerState, transaction_id: H256, authorizers: Vec<Address>) -> Self {
        Self {
            state,
            transaction_id,
            authorizers,
            logs: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Accounts that authorized the transaction, in order
    pub fn authorizers(&self) -> &[Address] {
        &self.authorizers
    }

    /// Id of the executing transaction
    pub fn transaction_id(&self) -> H256 {
        self.transaction_id
    }

    /// Read an account
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.state.account(address)
    }

    fn authorized_account(&mut self, address: &Address) -> Result<&mut Account, ExecutionError> {
        if !self.authorizers.contains(address) {
            return Err(ExecutionError::Unauthorized(*address));
        }
        self.state
            .account_mut(address)
            .ok_or(ExecutionError::AccountNotFound(*address))
    }

    /// Deploy a contract to an authorizing account
    pub fn add_contract(
        &mut self,
        address: &Address,
        name: &str,
        code: Vec<u8>,
    ) -> Result<(), ExecutionError> {
        let account = self.authorized_account(address)?;
        if account.contracts.contains_key(name) {
            return Err(ExecutionError::ContractAlreadyExists {
                address: *address,
                name: name.to_string(),
            });
        }
        account.contracts.insert(name.to_string(), code);
        Ok(())
    }

    /// Replace the source of a deployed contract
    pub fn update_contract(
        &mut self,
        address: &Address,
        name: &str,
        code: Vec<u8>,
    ) -> Result<(), ExecutionError> {
        let account = self.authorized_account(address)?;
        match account.contracts.get_mut(name) {
            Some(existing) => {
                *existing = code;
                Ok(())
            }
            None => Err(ExecutionError::Runtime(format!(
                "contract {name} is not deployed on {address}"
            ))),
        }
    }

    /// Remove a deployed contract, returning whether it existed
    pub fn remove_contract(&mut self, address: &Address, name: &str) -> Result<bool, ExecutionError> {
        let account = self.authorized_account(address)?;
        Ok(account.contracts.remove(name).is_some())
    }

    /// Emit an event
    pub fn emit_event(&mut self, event_type: impl Into<String>, payload: Value) {
        let event_index = self.events.len() as u32;
        self.events.push(Event {
            event_type: event_type.into(),
            transaction_id: self.transaction_id,
            transaction_index: 0,
            event_index,
            payload,
        });
    }

    /// Record a program log line
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    /// Logs and events recorded so far
    pub fn into_effects(self) -> (Vec<String>, Vec<Event>) {
        (self.logs, self.events)
    }
}
