//! # tessera-emulator
//!
//! Ephemeral in-memory ledger for Tessera tests.
//!
//! - [`Blockchain`] - ledger interface consumed by the test backend
//! - [`Emulator`] - in-memory implementation with a pending-block model
//! - [`VirtualMachine`] - seam through which programs are executed

#![warn(missing_docs)]
#![warn(clippy::all)]

mod blockchain;
mod config;
mod emulator;
mod error;
mod state;
mod vm;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use blockchain::{Blockchain, ScriptOutcome, ServiceKey, TransactionOutcome};
pub use config::{EmulatorConfig, DEFAULT_SERVICE_KEY_SEED, SERVICE_ADDRESS};
pub use emulator::Emulator;
pub use error::{EmulatorError, EmulatorResult, ExecutionError};
pub use state::LedgerState;
pub use vm::{ScriptContext, TransactionContext, VirtualMachine};
