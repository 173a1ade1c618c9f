//! Emulator configuration

use serde::Deserialize;
use tessera_crypto::{HashAlgorithm, KeyGenerator, PrivateKey, SignatureAlgorithm};
use tessera_primitives::Address;

use crate::error::{EmulatorError, EmulatorResult};

/// Address of the service account
pub const SERVICE_ADDRESS: Address = Address::from_u64(1);

/// Seed of the default service key
pub const DEFAULT_SERVICE_KEY_SEED: u64 = 0x5e_4f1ce;

/// Emulator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Hex-encoded service private key; derived from `service_key_seed` when absent
    pub service_private_key: Option<String>,
    /// Seed for the service key when no explicit key is given
    pub service_key_seed: u64,
    /// Hash algorithm of the service key
    pub service_hash_algo: HashAlgorithm,
    /// Initial service account balance
    pub service_balance: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            service_private_key: None,
            service_key_seed: DEFAULT_SERVICE_KEY_SEED,
            service_hash_algo: HashAlgorithm::Sha3_256,
            service_balance: 1_000_000_000,
        }
    }
}

impl EmulatorConfig {
    /// Resolve the service private key
    pub fn service_key(&self) -> EmulatorResult<PrivateKey> {
        match &self.service_private_key {
            Some(hex_key) => PrivateKey::from_hex(SignatureAlgorithm::EcdsaSecp256k1, hex_key)
                .map_err(|e| EmulatorError::InvalidConfig(format!("service key: {e}"))),
            None => Ok(KeyGenerator::new(self.service_key_seed)
                .generate(SignatureAlgorithm::EcdsaSecp256k1)),
        }
    }
}
