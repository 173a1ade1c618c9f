//! # tessera-test
//!
//! Test execution engine for Tessera scripts.
//!
//! - [`TestRunner`] - loads a test script, runs lifecycle hooks and test cases
//! - [`EmulatorBackend`] - the [`TestFramework`] behind the `Test` module
//! - [`runtime`] - seam to the language runtime that parses and interprets code
//! - [`CoverageReport`] - line coverage of the code under test
//! - [`rewrite_imports`] - points path imports at deployed contract addresses
//!
//! ## Example
//!
//! ```ignore
//! let runner = TestRunner::with_emulator(runtime, vm)
//!     .with_import_resolver(resolver)
//!     .with_random_seed(42);
//! let report = runner.run_tests(script)?;
//! print!("{}", pretty_print_results(&report.results, "foo_test.tes"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backend;
mod config;
mod coverage;
mod error;
mod framework;
mod imports;
mod location;
mod logs;
mod result;
mod runner;
pub mod runtime;

pub use backend::EmulatorBackend;
pub use config::Configuration;
pub use coverage::CoverageReport;
pub use error::{BackendError, BackendResult, ImportError, RuntimeError, TestError, TestResultOf};
pub use framework::{
    Account, AccountPublicKey, ContractInvocation, ContractInvocations, ScriptResult,
    TestFramework, TransactionResult,
};
pub use imports::{rewrite_imports, scan_imports, ImportDeclaration, ImportSyntaxError};
pub use location::{BuiltinModule, Location};
pub use logs::{LogCollector, ProgramLogger};
pub use result::{pretty_print_result, pretty_print_results, Results, TestResult};
pub use runner::{
    shuffle_cases, CaseReport, FileResolver, ImportResolver, LedgerFactory, SuiteReport,
    TestRunner,
};
