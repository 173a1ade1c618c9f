//! # tessera-types
//!
//! Core ledger types for Tessera.
//!
//! This crate provides:
//! - [`Value`](value::Value) - Wire values and their JSON codec
//! - [`Transaction`](transaction::Transaction) - Transactions with payload/envelope signing
//! - [`Account`](account::Account) - Accounts and account keys
//! - [`Block`](block::Block) - Blocks and events

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod block;
pub mod codec;
pub mod error;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use account::{Account, AccountKey, FULL_WEIGHT};
pub use block::{Block, Event};
pub use codec::{decode_arguments, decode_value, encode_arguments, encode_value};
pub use error::{CodecError, CodecResult};
pub use transaction::{
    transaction_domain_tag, ProposalKey, Transaction, TransactionSignature, DEFAULT_GAS_LIMIT,
};
pub use value::{Composite, DictionaryEntry, Field, Value};
