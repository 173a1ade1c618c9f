//! Hash algorithms used for signing

use crate::CryptoError;
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;
use tessera_primitives::H256;

/// Hash algorithm applied to a message before it is signed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HashAlgorithm {
    /// SHA2-256
    Sha2_256,
    /// SHA3-256
    #[default]
    Sha3_256,
}

impl HashAlgorithm {
    /// Hash `data` with this algorithm
    pub fn hash(&self, data: &[u8]) -> H256 {
        match self {
            HashAlgorithm::Sha2_256 => sha2_256(data),
            HashAlgorithm::Sha3_256 => sha3_256(data),
        }
    }

    /// Canonical name, as exposed to scripts
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha2_256 => "SHA2_256",
            HashAlgorithm::Sha3_256 => "SHA3_256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHA2_256" => Ok(HashAlgorithm::Sha2_256),
            "SHA3_256" => Ok(HashAlgorithm::Sha3_256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Compute SHA3-256 of the input data
pub fn sha3_256(data: &[u8]) -> H256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}

/// Compute SHA2-256 of the input data
pub fn sha2_256(data: &[u8]) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}
