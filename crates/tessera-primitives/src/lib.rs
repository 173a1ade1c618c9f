//! # tessera-primitives
//!
//! Primitive types shared by the Tessera ledger emulator and test runner.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{Hash, HashError, H256};

/// Block height type
pub type BlockHeight = u64;

/// Account key sequence number type
pub type SequenceNumber = u64;
