//! # tessera-crypto
//!
//! Cryptographic primitives for the Tessera ledger emulator.
//!
//! - SHA2-256 / SHA3-256 hashing
//! - ECDSA signing/verification (secp256k1)
//! - Deterministic key generation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod keygen;
mod signature;

pub use error::{CryptoError, CryptoResult};
pub use hash::{sha2_256, sha3_256, HashAlgorithm};
pub use keygen::{KeyGenerator, DEFAULT_KEYGEN_SEED};
pub use signature::{
    PrivateKey, PublicKey, SignatureAlgorithm, Signer, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
