//! Ledger account address (8 bytes)

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected at most 8 bytes, got {0}")]
    InvalidLength(usize),
}

/// 8-byte ledger account address
///
/// Addresses render as `0x` followed by all 16 hex digits, which is also the
/// form used when an import is rewritten to point at a deployed contract.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 8]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 8;

    /// Zero address (0x0000000000000000)
    pub const ZERO: Address = Address([0u8; 8]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Address(bytes)
    }

    /// Create address from its big-endian integer value
    pub const fn from_u64(value: u64) -> Self {
        Address(value.to_be_bytes())
    }

    /// Create address from slice
    ///
    /// Shorter slices are left-padded with zeros, so `[0x01]` is `0x0000000000000001`.
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        if slice.len() > Self::LEN {
            return Err(AddressError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 8];
        bytes[Self::LEN - slice.len()..].copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Parse address from hex string (with or without 0x prefix)
    ///
    /// Odd-length and short literals such as `0x1` are accepted.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.is_empty() {
            return Err(AddressError::InvalidHex("empty address literal".to_string()));
        }
        let padded = if s.len() % 2 == 1 {
            format!("0{s}")
        } else {
            s.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Get as byte array
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Big-endian integer value of the address
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 8]
    }

    /// Hex digits without prefix (always 16 characters)
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", self.hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 8]> for Address {
    fn from(bytes: [u8; 8]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Address;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(feature = "rlp")]
mod rlp_impl {
    use super::*;
    use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

    impl Encodable for Address {
        fn rlp_append(&self, s: &mut RlpStream) {
            s.encoder().encode_value(&self.0);
        }
    }

    impl Decodable for Address {
        fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
            let bytes: Vec<u8> = rlp.as_val()?;
            if bytes.len() != Address::LEN {
                return Err(DecoderError::RlpInvalidLength);
            }
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&bytes);
            Ok(Address(arr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_hex_full() {
        let addr = Address::from_hex("0xf8d6e0586b0a20c7").unwrap();
        assert_eq!(addr.to_hex(), "0xf8d6e0586b0a20c7");
        assert_eq!(addr, Address::from_hex("f8d6e0586b0a20c7").unwrap());
    }

    #[test]
    fn test_address_from_short_literal() {
        let addr = Address::from_hex("0x1").unwrap();
        assert_eq!(addr, Address::from_u64(1));
        assert_eq!(addr.to_hex(), "0x0000000000000001");

        let addr = Address::from_hex("0xAB").unwrap();
        assert_eq!(addr.to_u64(), 0xab);
    }

    #[test]
    fn test_address_mixed_case() {
        let lower = Address::from_hex("0xf8d6e0586b0a20c7").unwrap();
        let upper = Address::from_hex("0xF8D6E0586B0A20C7").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_address_too_long() {
        let result = Address::from_hex("0x0102030405060708090a");
        assert_eq!(result, Err(AddressError::InvalidLength(10)));
    }

    #[test]
    fn test_address_invalid_hex() {
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
        assert!(Address::from_hex("0x").is_err());
        assert!(Address::from_hex("").is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(Address::ZERO.to_hex(), "0x0000000000000000");
        assert!(!Address::from_u64(7).is_zero());
    }

    #[test]
    fn test_address_display_and_parse() {
        let addr = Address::from_u64(0x01cf0e2f2f715450);
        let rendered = addr.to_string();
        assert_eq!(rendered, "0x01cf0e2f2f715450");
        assert_eq!(rendered.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_ordering_follows_value() {
        assert!(Address::from_u64(1) < Address::from_u64(2));
    }
}
