//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Invalid signature encoding
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid public key encoding
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid private key
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Algorithm identifier not recognised
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
