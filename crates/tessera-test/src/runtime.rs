//! Seam between the runner and the language runtime
//!
//! The runner never parses or interprets code itself. A [`Runtime`] turns
//! source into checked [`Program`]s and executes them; the runner supplies
//! imports through [`ImportHandler`] and host services (contract values,
//! logging) through [`InterpreterHost`].

use crate::coverage::CoverageReport;
use crate::error::{ImportError, RuntimeError};
use crate::framework::TestFramework;
use crate::location::{BuiltinModule, Location};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tessera_types::Value;

/// Name prefix that marks a function as a test case
pub const TEST_FUNCTION_PREFIX: &str = "test";

/// Top-level function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// Number of declared parameters
    pub parameter_count: usize,
    /// Whether a return type is declared
    pub has_return_type: bool,
}

impl FunctionDeclaration {
    /// Declaration with no parameters and no return type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_count: 0,
            has_return_type: false,
        }
    }

    /// Whether the name marks a test case
    pub fn is_test(&self) -> bool {
        self.name.starts_with(TEST_FUNCTION_PREFIX)
    }
}

/// Composite type declared by a program
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeType {
    /// Location of the declaring program
    pub location: Location,
    /// Type name
    pub identifier: String,
}

/// A parsed and checked program
#[derive(Debug)]
pub struct Program<E> {
    /// Where the program came from
    pub location: Location,
    /// Top-level functions in declaration order
    pub functions: Vec<FunctionDeclaration>,
    /// Declared composite types
    pub composites: Vec<CompositeType>,
    /// Runtime-specific checking output
    pub elaboration: E,
}

impl<E> Program<E> {
    /// Function named `name`
    pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Test functions in declaration order
    pub fn test_functions(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.functions.iter().filter(|f| f.is_test())
    }
}

/// Supplies imported programs while a program is checked
pub trait ImportHandler<E> {
    /// Load the checked program at `location`
    fn import(&mut self, location: &Location) -> Result<Arc<Program<E>>, ImportError>;
}

/// How composite declarations from a location may be instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Constructible in memory, like a struct
    Constructor,
    /// Singleton contract value
    Composite,
}

/// Declaration kind for composites imported from `location`
///
/// Contracts imported by path can be constructed directly inside tests.
pub fn declaration_kind(location: &Location) -> DeclarationKind {
    match location {
        Location::String(_) => DeclarationKind::Constructor,
        _ => DeclarationKind::Composite,
    }
}

/// Value backing a contract composite at run time
#[derive(Clone)]
pub enum ContractValue {
    /// The built-in cryptography contract
    Crypto,
    /// The `Test` contract, bound to the run's backend
    TestFramework(Arc<Mutex<dyn TestFramework>>),
    /// A contract deployed by the test, built from its recorded constructor arguments
    Deployed {
        /// Constructor argument values
        arguments: Vec<Value>,
        /// Constructor argument type ids
        argument_types: Vec<String>,
    },
    /// A contract constructed in memory
    Constructor,
}

impl fmt::Debug for ContractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractValue::Crypto => f.write_str("Crypto"),
            ContractValue::TestFramework(_) => f.write_str("TestFramework(..)"),
            ContractValue::Deployed {
                arguments,
                argument_types,
            } => f
                .debug_struct("Deployed")
                .field("arguments", arguments)
                .field("argument_types", argument_types)
                .finish(),
            ContractValue::Constructor => f.write_str("Constructor"),
        }
    }
}

/// Services the runner provides to a running interpreter
pub trait InterpreterHost<E>: Send {
    /// Load an imported program for execution
    fn import_program(&mut self, location: &Location) -> Result<Arc<Program<E>>, ImportError>;

    /// Value for a contract composite
    fn contract_value(&mut self, composite: &CompositeType) -> Result<ContractValue, ImportError>;

    /// Record a program log line
    fn log(&self, message: &str);

    /// Report to record line coverage into, when coverage is enabled
    fn coverage_report(&self) -> Option<Arc<CoverageReport>>;
}

/// A running program
pub trait Interpreter {
    /// Whether a global named `name` is declared
    fn contains_global(&self, name: &str) -> bool;

    /// Call a global function
    fn invoke(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// A language runtime
pub trait Runtime: Send + Sync {
    /// Checker output carried by a [`Program`]
    type Elaboration: Send + Sync + 'static;

    /// Interpreter produced by [`Runtime::interpret`]
    type Interpreter: Interpreter;

    /// Parse and check `code`, loading imports through `imports`
    fn parse_and_check(
        &self,
        code: &str,
        location: Location,
        imports: &mut dyn ImportHandler<Self::Elaboration>,
    ) -> Result<Program<Self::Elaboration>, RuntimeError>;

    /// Checked program for a built-in module
    fn builtin(&self, module: BuiltinModule) -> Arc<Program<Self::Elaboration>>;

    /// Create an interpreter for `program`
    fn interpret(
        &self,
        program: Arc<Program<Self::Elaboration>>,
        host: Box<dyn InterpreterHost<Self::Elaboration>>,
    ) -> Result<Self::Interpreter, RuntimeError>;
}
