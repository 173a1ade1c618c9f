//! Ledger accounts and their keys

use std::collections::BTreeMap;
use tessera_crypto::{HashAlgorithm, PublicKey, SignatureAlgorithm};
use tessera_primitives::{Address, SequenceNumber};

/// Weight required for a set of keys to authorize a transaction
pub const FULL_WEIGHT: u32 = 1000;

/// Key registered on an account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountKey {
    /// Position of the key on its account
    pub index: u32,
    /// Public key
    pub public_key: PublicKey,
    /// Signature algorithm
    pub sign_algo: SignatureAlgorithm,
    /// Hash algorithm applied before signing
    pub hash_algo: HashAlgorithm,
    /// Key weight
    pub weight: u32,
    /// Next expected proposal sequence number
    pub sequence_number: SequenceNumber,
    /// Revoked keys cannot sign
    pub revoked: bool,
}

impl AccountKey {
    /// Full-weight key at index 0 with sequence number 0
    pub fn new(public_key: PublicKey, hash_algo: HashAlgorithm) -> Self {
        Self {
            index: 0,
            sign_algo: public_key.algorithm(),
            public_key,
            hash_algo,
            weight: FULL_WEIGHT,
            sequence_number: 0,
            revoked: false,
        }
    }

    /// Verify `signature` over `message` with this key
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        !self.revoked
            && self
                .public_key
                .verify(self.hash_algo, message, signature)
                .unwrap_or(false)
    }
}

/// Account state on the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account address
    pub address: Address,
    /// Token balance
    pub balance: u64,
    /// Registered keys, indexed by position
    pub keys: Vec<AccountKey>,
    /// Deployed contract sources by name
    pub contracts: BTreeMap<String, Vec<u8>>,
}

impl Account {
    /// Create an account with the given keys and no contracts
    pub fn new(address: Address, keys: Vec<AccountKey>) -> Self {
        let keys = keys
            .into_iter()
            .enumerate()
            .map(|(i, mut key)| {
                key.index = i as u32;
                key
            })
            .collect();
        Self {
            address,
            balance: 0,
            keys,
            contracts: BTreeMap::new(),
        }
    }

    /// Key at `index`
    pub fn key(&self, index: u32) -> Option<&AccountKey> {
        self.keys.get(index as usize)
    }

    /// Mutable key at `index`
    pub fn key_mut(&mut self, index: u32) -> Option<&mut AccountKey> {
        self.keys.get_mut(index as usize)
    }

    /// Source of the contract deployed under `name`
    pub fn contract(&self, name: &str) -> Option<&[u8]> {
        self.contracts.get(name).map(Vec::as_slice)
    }
}
