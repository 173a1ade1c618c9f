//! ECDSA key pairs, signing and verification

use crate::{CryptoError, CryptoResult, HashAlgorithm};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as K256Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::fmt;
use std::str::FromStr;

/// Length of an encoded public key (x || y, without the SEC1 tag byte)
pub const PUBLIC_KEY_LEN: usize = 64;

/// Length of an encoded signature (r || s)
pub const SIGNATURE_LEN: usize = 64;

/// Signature algorithm of an account key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignatureAlgorithm {
    /// ECDSA over secp256k1
    #[default]
    EcdsaSecp256k1,
}

impl SignatureAlgorithm {
    /// Canonical name, as exposed to scripts
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaSecp256k1 => "ECDSA_secp256k1",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECDSA_secp256k1" => Ok(SignatureAlgorithm::EcdsaSecp256k1),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Public half of an account key
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
    algorithm: SignatureAlgorithm,
}

impl PublicKey {
    /// Decode a public key from its 64-byte `x || y` encoding
    pub fn decode(algorithm: SignatureAlgorithm, bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidPublicKey(format!(
                "expected {PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut sec1 = Vec::with_capacity(PUBLIC_KEY_LEN + 1);
        sec1.push(0x04);
        sec1.extend_from_slice(bytes);
        let key = VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key, algorithm })
    }

    /// Encode as `x || y` (64 bytes)
    pub fn encode(&self) -> Vec<u8> {
        let point = self.key.to_encoded_point(false);
        point.as_bytes()[1..].to_vec()
    }

    /// Hex form of [`encode`](Self::encode)
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    /// Signature algorithm of this key
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Verify `signature` over `message`, hashing with `hash_algo` first
    pub fn verify(
        &self,
        hash_algo: HashAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> CryptoResult<bool> {
        let signature = K256Signature::from_slice(signature)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let digest = hash_algo.hash(message);
        Ok(self.key.verify_prehash(digest.as_bytes(), &signature).is_ok())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm)
            .field("key", &self.to_hex())
            .finish()
    }
}

/// Private half of an account key
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
    algorithm: SignatureAlgorithm,
}

impl PrivateKey {
    /// Wrap an existing secp256k1 signing key
    pub fn from_signing_key(key: SigningKey) -> Self {
        Self {
            key,
            algorithm: SignatureAlgorithm::EcdsaSecp256k1,
        }
    }

    /// Create from a 32-byte scalar
    pub fn from_slice(algorithm: SignatureAlgorithm, bytes: &[u8]) -> CryptoResult<Self> {
        let key = SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { key, algorithm })
    }

    /// Create from a hex-encoded scalar (with or without 0x prefix)
    pub fn from_hex(algorithm: SignatureAlgorithm, s: &str) -> CryptoResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_slice(algorithm, &bytes)
    }

    /// Derive the public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: *self.key.verifying_key(),
            algorithm: self.algorithm,
        }
    }

    /// Signature algorithm of this key
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn sign_digest(&self, digest: &[u8]) -> CryptoResult<Vec<u8>> {
        let signature: K256Signature = self
            .key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        // verifiers reject high-s signatures
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Signs messages with a private key and a fixed hash algorithm
#[derive(Clone, Debug)]
pub struct Signer {
    private_key: PrivateKey,
    hash_algo: HashAlgorithm,
}

impl Signer {
    /// Create a signer
    pub fn new(private_key: PrivateKey, hash_algo: HashAlgorithm) -> Self {
        Self {
            private_key,
            hash_algo,
        }
    }

    /// Hash `message` and sign the digest, returning `r || s`
    pub fn sign(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let digest = self.hash_algo.hash(message);
        self.private_key.sign_digest(digest.as_bytes())
    }

    /// Public key matching this signer
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// Hash algorithm applied before signing
    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }
}
