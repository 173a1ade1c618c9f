//! Blockchain test backend
//!
//! Bridges the `Test` module to an ephemeral ledger. The backend owns every
//! private key it generates and tracks how many transactions it has queued
//! into the current pending block, so each new transaction's proposal
//! sequence number is the service key's committed sequence number plus that
//! offset.

use crate::config::Configuration;
use crate::error::{BackendError, BackendResult};
use crate::framework::{
    Account, AccountPublicKey, ContractInvocation, ContractInvocations, ScriptResult,
    TestFramework, TransactionResult,
};
use crate::imports::rewrite_imports;
use crate::runner::FileResolver;
use std::collections::{BTreeMap, HashMap};
use tessera_crypto::{HashAlgorithm, KeyGenerator, SignatureAlgorithm, Signer};
use tessera_emulator::{Blockchain, EmulatorError};
use tessera_primitives::Address;
use tessera_types::{decode_value, encode_arguments, AccountKey, Transaction, Value};
use tracing::debug;

/// Hash algorithm for keys created by the backend
const ACCOUNT_HASH_ALGO: HashAlgorithm = HashAlgorithm::Sha3_256;

/// Signature algorithm for keys created by the backend
const ACCOUNT_SIGN_ALGO: SignatureAlgorithm = SignatureAlgorithm::EcdsaSecp256k1;

/// Key registered by the backend, with the signer that owns it
#[derive(Debug, Clone)]
struct KeyInfo {
    account_key: AccountKey,
    signer: Signer,
}

/// Build the transaction that deploys contract `name`
///
/// Constructor arguments become transaction parameters `arg0..argN`, typed
/// by their value type, and are forwarded to `contracts.add`.
fn deploy_script(name: &str, code: &str, arguments: &[Value]) -> String {
    let params = arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| format!("arg{i}: {}", arg.type_id()))
        .collect::<Vec<_>>()
        .join(", ");
    let add_args: String = (0..arguments.len()).map(|i| format!(", arg{i}")).collect();

    format!(
        "transaction({params}) {{\n    prepare(signer: AuthAccount) {{\n        signer.contracts.add(name: \"{name}\", code: \"{}\".decodeHex(){add_args})\n    }}\n}}",
        hex::encode(code.as_bytes()),
    )
}

/// [`TestFramework`] backed by a [`Blockchain`]
pub struct EmulatorBackend {
    blockchain: Box<dyn Blockchain>,
    /// Transactions queued in the current pending block
    block_offset: u64,
    /// Per address, hex public key to key info
    account_keys: HashMap<Address, HashMap<String, KeyInfo>>,
    file_resolver: Option<FileResolver>,
    configuration: Option<Configuration>,
    contract_invocations: ContractInvocations,
    keygen: KeyGenerator,
}

impl EmulatorBackend {
    /// Create a backend over `blockchain`
    pub fn new(blockchain: Box<dyn Blockchain>, file_resolver: Option<FileResolver>) -> Self {
        Self {
            blockchain,
            block_offset: 0,
            account_keys: HashMap::new(),
            file_resolver,
            configuration: None,
            contract_invocations: ContractInvocations::default(),
            keygen: KeyGenerator::default(),
        }
    }

    /// Transactions queued into the current pending block
    pub fn block_offset(&self) -> u64 {
        self.block_offset
    }

    /// Constructor arguments of contracts deployed through this backend
    pub fn contract_invocations(&self) -> ContractInvocations {
        self.contract_invocations.clone()
    }

    /// Source of contract `name` deployed at `address`
    pub fn contract_code(&self, address: &Address, name: &str) -> BackendResult<String> {
        let account = self.blockchain.get_account(address)?;
        let code = account
            .contract(name)
            .ok_or_else(|| BackendError::ContractNotFound {
                address: *address,
                name: name.to_string(),
            })?;
        Ok(String::from_utf8_lossy(code).into_owned())
    }

    /// Underlying ledger
    pub fn blockchain(&self) -> &dyn Blockchain {
        self.blockchain.as_ref()
    }

    fn rewrite(&self, code: &str) -> BackendResult<String> {
        match &self.configuration {
            Some(configuration) => Ok(rewrite_imports(code, configuration)?),
            None => Ok(code.to_string()),
        }
    }

    fn new_transaction(&self, code: String, authorizers: &[Address]) -> Transaction {
        let service_key = self.blockchain.service_key();
        let sequence_number = service_key.sequence_number + self.block_offset;

        let mut tx = Transaction::new(code)
            .with_proposal_key(service_key.address, service_key.index, sequence_number)
            .with_payer(service_key.address);
        for authorizer in authorizers {
            tx = tx.with_authorizer(*authorizer);
        }
        tx
    }

    fn sign_transaction(&self, tx: &mut Transaction, signers: &[Account]) -> BackendResult<()> {
        for account in signers.iter().rev() {
            let public_key = hex::encode(&account.public_key.public_key);
            let info = self
                .account_keys
                .get(&account.address)
                .and_then(|keys| keys.get(&public_key))
                .ok_or(BackendError::SignerNotFound(account.address))?;
            tx.sign_payload(account.address, info.account_key.index, &info.signer)?;
        }

        let service_key = self.blockchain.service_key();
        tx.sign_envelope(service_key.address, service_key.index, &service_key.signer())?;
        Ok(())
    }

    fn submit(&mut self, tx: Transaction) -> BackendResult<()> {
        let sequence_number = tx.proposal_key.sequence_number;
        self.blockchain.add_transaction(tx)?;
        self.block_offset += 1;
        debug!(sequence_number, offset = self.block_offset, "transaction submitted");
        Ok(())
    }

    fn try_run_script(&self, code: &str, arguments: &[Value]) -> BackendResult<Value> {
        let code = self.rewrite(code)?;
        let arguments = encode_arguments(arguments)?;
        let outcome = self.blockchain.execute_script(code.as_bytes(), &arguments)?;
        for line in &outcome.logs {
            debug!(target: "tessera::script", "{}", line);
        }
        let encoded = outcome.result?;
        Ok(decode_value(&encoded)?)
    }
}

impl TestFramework for EmulatorBackend {
    fn run_script(&mut self, code: &str, arguments: &[Value]) -> ScriptResult {
        match self.try_run_script(code, arguments) {
            Ok(value) => ScriptResult::Succeeded(value),
            Err(err) => ScriptResult::Failed(err),
        }
    }

    fn create_account(&mut self) -> BackendResult<Account> {
        let private_key = self.keygen.generate(ACCOUNT_SIGN_ALGO);
        let public_key = private_key.public_key();
        let account_key = AccountKey::new(public_key.clone(), ACCOUNT_HASH_ALGO);

        let address = self
            .blockchain
            .create_account(vec![account_key.clone()], BTreeMap::new())?;

        let info = KeyInfo {
            account_key,
            signer: Signer::new(private_key, ACCOUNT_HASH_ALGO),
        };
        self.account_keys
            .entry(address)
            .or_default()
            .insert(public_key.to_hex(), info);
        debug!(%address, "test account created");

        Ok(Account {
            address,
            public_key: AccountPublicKey {
                public_key: public_key.encode(),
                sign_algo: ACCOUNT_SIGN_ALGO,
                hash_algo: ACCOUNT_HASH_ALGO,
            },
        })
    }

    fn add_transaction(
        &mut self,
        code: &str,
        authorizers: &[Address],
        signers: &[Account],
        arguments: &[Value],
    ) -> BackendResult<()> {
        let code = self.rewrite(code)?;
        let mut tx = self.new_transaction(code, authorizers);
        for argument in encode_arguments(arguments)? {
            tx.add_argument(argument);
        }
        self.sign_transaction(&mut tx, signers)?;
        self.submit(tx)
    }

    fn execute_next_transaction(&mut self) -> Option<TransactionResult> {
        match self.blockchain.execute_next_transaction() {
            Ok(outcome) => Some(TransactionResult {
                error: outcome.error.map(BackendError::from),
            }),
            Err(EmulatorError::PendingBlockTransactionsExhausted { .. }) => None,
            Err(err) => Some(TransactionResult {
                error: Some(err.into()),
            }),
        }
    }

    fn commit_block(&mut self) -> BackendResult<()> {
        self.block_offset = 0;
        let block = self.blockchain.commit_block()?;
        debug!(height = block.height, "block committed");
        Ok(())
    }

    fn deploy_contract(
        &mut self,
        name: &str,
        code: &str,
        account: &Account,
        arguments: &[Value],
    ) -> BackendResult<()> {
        if self.block_offset > 0 {
            return Err(BackendError::PendingTransactions {
                name: name.to_string(),
                pending: self.block_offset,
            });
        }

        let code = self.rewrite(code)?;
        let script = deploy_script(name, &code, arguments);

        let mut tx = self.new_transaction(script, &[account.address]);
        for argument in encode_arguments(arguments)? {
            tx.add_argument(argument);
        }
        self.sign_transaction(&mut tx, std::slice::from_ref(account))?;
        self.submit(tx)?;

        // always commit; the deploy is the only transaction in the block
        let result = self.execute_next_transaction();
        self.commit_block()?;

        match result {
            None => Err(BackendError::TransactionNotExecuted),
            Some(TransactionResult { error: Some(err) }) => Err(err),
            Some(TransactionResult { error: None }) => {
                let invocation = ContractInvocation {
                    arguments: arguments.to_vec(),
                    argument_types: arguments.iter().map(Value::type_id).collect(),
                };
                self.contract_invocations
                    .write()
                    .insert(name.to_string(), invocation);
                debug!(contract = name, address = %account.address, "contract deployed");
                Ok(())
            }
        }
    }

    fn read_file(&self, path: &str) -> BackendResult<String> {
        let resolver = self
            .file_resolver
            .as_ref()
            .ok_or(BackendError::FileResolverNotProvided)?;
        resolver(path).map_err(|e| BackendError::FileResolver {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn use_configuration(&mut self, configuration: Configuration) {
        self.configuration = Some(configuration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_script_without_arguments() {
        let script = deploy_script("Foo", "pub contract Foo {}", &[]);
        assert!(script.starts_with("transaction() {"));
        assert!(script.contains(&format!(
            "signer.contracts.add(name: \"Foo\", code: \"{}\".decodeHex())",
            hex::encode("pub contract Foo {}")
        )));
    }

    #[test]
    fn test_deploy_script_with_arguments() {
        let args = vec![Value::Int(1), Value::from("x")];
        let script = deploy_script("Foo", "c", &args);
        assert!(script.starts_with("transaction(arg0: Int, arg1: String) {"));
        assert!(script.contains(".decodeHex(), arg0, arg1)"));
    }
}
