//! Deterministic key generation

use crate::{PrivateKey, SignatureAlgorithm};
use k256::ecdsa::SigningKey;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed used when none is given, so fresh ledgers produce the same keys
pub const DEFAULT_KEYGEN_SEED: u64 = 0x7e55_e4a0;

/// Produces a reproducible stream of private keys from a seed
pub struct KeyGenerator {
    rng: StdRng,
}

impl KeyGenerator {
    /// Create a generator from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next key in the stream
    pub fn generate(&mut self, algorithm: SignatureAlgorithm) -> PrivateKey {
        match algorithm {
            SignatureAlgorithm::EcdsaSecp256k1 => {
                PrivateKey::from_signing_key(SigningKey::random(&mut self.rng))
            }
        }
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEYGEN_SEED)
    }
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_keys() {
        let mut a = KeyGenerator::new(42);
        let mut b = KeyGenerator::new(42);
        for _ in 0..3 {
            let ka = a.generate(SignatureAlgorithm::EcdsaSecp256k1).public_key();
            let kb = b.generate(SignatureAlgorithm::EcdsaSecp256k1).public_key();
            assert_eq!(ka, kb);
        }
    }

    #[test]
    fn test_stream_yields_distinct_keys() {
        let mut keygen = KeyGenerator::default();
        let first = keygen.generate(SignatureAlgorithm::EcdsaSecp256k1).public_key();
        let second = keygen.generate(SignatureAlgorithm::EcdsaSecp256k1).public_key();
        assert_ne!(first, second);
    }
}
