//! Test orchestration
//!
//! A [`TestRunner`] loads a test script through a [`Runtime`], wires it to a
//! fresh [`EmulatorBackend`], and drives the lifecycle hooks and test cases.
//!
//! Hook order for a suite:
//!
//! ```text
//! setup
//!   beforeEach -> testA -> afterEach
//!   beforeEach -> testB -> afterEach
//! tearDown
//! ```

use crate::backend::EmulatorBackend;
use crate::coverage::CoverageReport;
use crate::error::{BackendError, ImportError, TestError, TestResultOf};
use crate::framework::{ContractInvocations, TestFramework};
use crate::location::{BuiltinModule, Location};
use crate::logs::{LogCollector, ProgramLogger};
use crate::result::{Results, TestResult};
use crate::runtime::{
    CompositeType, ContractValue, ImportHandler, Interpreter, InterpreterHost, Program, Runtime,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tessera_emulator::{Blockchain, Emulator, EmulatorError, VirtualMachine};
use tracing::{debug, info, warn};

/// Supplies source code for imports of the test script
pub type ImportResolver = Arc<dyn Fn(&Location) -> anyhow::Result<String> + Send + Sync>;

/// Reads local files on behalf of `Test.readFile`
pub type FileResolver = Arc<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

/// Creates the ledger for each run
pub type LedgerFactory =
    Arc<dyn Fn() -> Result<Box<dyn Blockchain>, EmulatorError> + Send + Sync>;

const SETUP: &str = "setup";
const TEAR_DOWN: &str = "tearDown";
const BEFORE_EACH: &str = "beforeEach";
const AFTER_EACH: &str = "afterEach";

/// Outcome of [`TestRunner::run_test`]
#[derive(Debug)]
pub struct CaseReport {
    /// Case outcome, absent when `beforeEach` failed
    pub result: Option<TestResult>,
    /// First hook failure after `setup`
    pub error: Option<TestError>,
}

/// Outcome of [`TestRunner::run_tests`]
#[derive(Debug)]
pub struct SuiteReport {
    /// Results of the cases that ran
    pub results: Results,
    /// First hook failure after `setup`
    pub error: Option<TestError>,
}

/// Shuffle test cases in place when `seed` is positive
///
/// The same seed always yields the same order.
pub fn shuffle_cases<T>(cases: &mut [T], seed: i64) {
    if seed > 0 {
        let mut rng = StdRng::seed_from_u64(seed as u64);
        cases.shuffle(&mut rng);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Invoke a global, turning errors and panics into a [`TestError`]
fn invoke_contained<I: Interpreter>(interpreter: &mut I, name: &str) -> Result<(), TestError> {
    match panic::catch_unwind(AssertUnwindSafe(|| interpreter.invoke(name, Vec::new()))) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(err.into()),
        Err(payload) => Err(TestError::Panic(panic_message(payload))),
    }
}

/// Run a hook if the script declares it
fn run_hook<I: Interpreter>(interpreter: &mut I, name: &str) -> Result<(), TestError> {
    if !interpreter.contains_global(name) {
        return Ok(());
    }
    debug!(hook = name, "running hook");
    invoke_contained(interpreter, name).map_err(|err| {
        warn!(hook = name, error = %err, "hook failed");
        err
    })
}

fn validate_test_functions<E>(program: &Program<E>) -> Result<(), TestError> {
    for function in program.test_functions() {
        if function.parameter_count > 0 {
            return Err(TestError::TestFunctionHasArguments(function.name.clone()));
        }
        if function.has_return_type {
            return Err(TestError::TestFunctionHasReturnValue(function.name.clone()));
        }
    }
    Ok(())
}

/// Import state shared by the checker and the interpreter of one run
struct ImportContext<R: Runtime> {
    runtime: Arc<R>,
    backend: Arc<Mutex<EmulatorBackend>>,
    resolver: Option<ImportResolver>,
    cache: Arc<Mutex<HashMap<Location, Arc<Program<R::Elaboration>>>>>,
}

impl<R: Runtime> Clone for ImportContext<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            backend: self.backend.clone(),
            resolver: self.resolver.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<R: Runtime> ImportContext<R> {
    fn cached(&self, location: &Location) -> Option<Arc<Program<R::Elaboration>>> {
        self.cache.lock().get(location).cloned()
    }

    fn remember(&self, location: &Location, program: Program<R::Elaboration>) -> Arc<Program<R::Elaboration>> {
        let program = Arc::new(program);
        self.cache.lock().insert(location.clone(), program.clone());
        program
    }

    fn resolve(&self, location: &Location) -> Result<String, ImportError> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| ImportError::ImportResolverNotProvided(location.clone()))?;

        match resolver(location) {
            Ok(code) => Ok(code),
            Err(err) => match location {
                Location::Address { address, name } => {
                    debug!(%location, error = %err, "resolver failed, reading contract from ledger");
                    Ok(self.backend.lock().contract_code(address, name)?)
                }
                _ => Err(ImportError::Resolve {
                    location: location.clone(),
                    message: err.to_string(),
                }),
            },
        }
    }
}

impl<R: Runtime> ImportHandler<R::Elaboration> for ImportContext<R> {
    fn import(&mut self, location: &Location) -> Result<Arc<Program<R::Elaboration>>, ImportError> {
        if let Some(module) = BuiltinModule::from_location(location) {
            return Ok(self.runtime.builtin(module));
        }
        if let Some(program) = self.cached(location) {
            return Ok(program);
        }

        let code = self.resolve(location)?;
        let mut nested = NestedImportHandler {
            context: self.clone(),
        };
        let program = self
            .runtime
            .parse_and_check(&code, location.clone(), &mut nested)
            .map_err(|e| ImportError::Check {
                location: location.clone(),
                source: Box::new(e),
            })?;
        debug!(%location, "import loaded");
        Ok(self.remember(location, program))
    }
}

/// Imports made by imported code: only `Test` and deployed contracts
struct NestedImportHandler<R: Runtime> {
    context: ImportContext<R>,
}

impl<R: Runtime> ImportHandler<R::Elaboration> for NestedImportHandler<R> {
    fn import(&mut self, location: &Location) -> Result<Arc<Program<R::Elaboration>>, ImportError> {
        match location {
            Location::Identifier(_) if *location == Location::TEST => {
                Ok(self.context.runtime.builtin(BuiltinModule::Test))
            }
            Location::Address { address, name } => {
                if let Some(program) = self.context.cached(location) {
                    return Ok(program);
                }
                let code = self
                    .context
                    .backend
                    .lock()
                    .contract_code(address, name)
                    .map_err(ImportError::from)?;
                let runtime = self.context.runtime.clone();
                let program = runtime
                    .parse_and_check(&code, location.clone(), self)
                    .map_err(|e| ImportError::Check {
                        location: location.clone(),
                        source: Box::new(e),
                    })?;
                Ok(self.context.remember(location, program))
            }
            other => Err(ImportError::NestedImportsNotSupported(other.clone())),
        }
    }
}

/// Host services for the test script's interpreter
struct ScriptHost<R: Runtime> {
    imports: ImportContext<R>,
    invocations: ContractInvocations,
    contract_values: HashMap<CompositeType, ContractValue>,
    logger: ProgramLogger,
    coverage_report: Option<Arc<CoverageReport>>,
}

impl<R: Runtime> InterpreterHost<R::Elaboration> for ScriptHost<R> {
    fn import_program(&mut self, location: &Location) -> Result<Arc<Program<R::Elaboration>>, ImportError> {
        self.imports.import(location)
    }

    fn contract_value(&mut self, composite: &CompositeType) -> Result<ContractValue, ImportError> {
        if let Some(value) = self.contract_values.get(composite) {
            return Ok(value.clone());
        }

        let value = match BuiltinModule::from_location(&composite.location) {
            Some(BuiltinModule::Crypto) => ContractValue::Crypto,
            Some(BuiltinModule::Test) => {
                let framework: Arc<Mutex<dyn TestFramework>> = self.imports.backend.clone();
                ContractValue::TestFramework(framework)
            }
            _ if composite.location.is_address() => {
                let invocation = self
                    .invocations
                    .read()
                    .get(&composite.identifier)
                    .cloned()
                    .ok_or_else(|| {
                        ImportError::ContractInvocationNotFound(composite.identifier.clone())
                    })?;
                ContractValue::Deployed {
                    arguments: invocation.arguments,
                    argument_types: invocation.argument_types,
                }
            }
            _ => ContractValue::Constructor,
        };

        self.contract_values.insert(composite.clone(), value.clone());
        Ok(value)
    }

    fn log(&self, message: &str) {
        self.logger.log(message);
    }

    fn coverage_report(&self) -> Option<Arc<CoverageReport>> {
        self.coverage_report.clone()
    }
}

/// Runs the test functions of a script
pub struct TestRunner<R: Runtime> {
    runtime: Arc<R>,
    ledger_factory: LedgerFactory,
    import_resolver: Option<ImportResolver>,
    file_resolver: Option<FileResolver>,
    random_seed: i64,
    logs: LogCollector,
    coverage_report: Option<Arc<CoverageReport>>,
}

impl<R: Runtime + 'static> TestRunner<R> {
    /// Create a runner; every run gets a fresh ledger from `ledger_factory`
    pub fn new(runtime: R, ledger_factory: LedgerFactory) -> Self {
        Self {
            runtime: Arc::new(runtime),
            ledger_factory,
            import_resolver: None,
            file_resolver: None,
            random_seed: 0,
            logs: LogCollector::new(),
            coverage_report: None,
        }
    }

    /// Create a runner over an in-memory [`Emulator`] driven by `vm`
    pub fn with_emulator<V>(runtime: R, vm: V) -> Self
    where
        V: VirtualMachine + Clone + 'static,
    {
        let factory: LedgerFactory = Arc::new(move || {
            let emulator = Emulator::new(vm.clone())?;
            Ok(Box::new(emulator) as Box<dyn Blockchain>)
        });
        Self::new(runtime, factory)
    }

    /// Resolve imports of the test script with `resolver`
    pub fn with_import_resolver(mut self, resolver: ImportResolver) -> Self {
        self.import_resolver = Some(resolver);
        self
    }

    /// Serve `Test.readFile` with `resolver`
    pub fn with_file_resolver(mut self, resolver: FileResolver) -> Self {
        self.file_resolver = Some(resolver);
        self
    }

    /// Shuffle test cases with `seed`; zero or negative keeps declaration order
    pub fn with_random_seed(mut self, seed: i64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Collect line coverage into `report`
    ///
    /// The `Crypto` and `Test` built-ins and the test script itself are
    /// excluded, so the report covers only the code under test.
    pub fn with_coverage_report(mut self, report: Arc<CoverageReport>) -> Self {
        self.coverage_report = Some(report);
        self
    }

    /// Every program log line captured by this runner
    pub fn logs(&self) -> Vec<String> {
        self.logs.entries()
    }

    /// Run a single test function, with all hooks
    pub fn run_test(&self, script: &str, name: &str) -> TestResultOf<CaseReport> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run_test_inner(script, name)))
            .unwrap_or_else(|payload| Err(TestError::Panic(panic_message(payload))))
    }

    /// Run every test function of `script`
    pub fn run_tests(&self, script: &str) -> TestResultOf<SuiteReport> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run_tests_inner(script)))
            .unwrap_or_else(|payload| Err(TestError::Panic(panic_message(payload))))
    }

    fn run_test_inner(&self, script: &str, name: &str) -> TestResultOf<CaseReport> {
        let (_, mut interpreter) = self.load(script)?;
        run_hook(&mut interpreter, SETUP)?;

        let mut error = None;
        let result = match run_hook(&mut interpreter, BEFORE_EACH) {
            Err(err) => {
                error = Some(err);
                None
            }
            Ok(()) => {
                let outcome = invoke_contained(&mut interpreter, name).err();
                if let Err(err) = run_hook(&mut interpreter, AFTER_EACH) {
                    error = Some(err);
                }
                Some(TestResult {
                    name: name.to_string(),
                    error: outcome,
                })
            }
        };

        if let Err(err) = run_hook(&mut interpreter, TEAR_DOWN) {
            error.get_or_insert(err);
        }
        Ok(CaseReport { result, error })
    }

    fn run_tests_inner(&self, script: &str) -> TestResultOf<SuiteReport> {
        let (program, mut interpreter) = self.load(script)?;
        run_hook(&mut interpreter, SETUP)?;

        let mut cases: Vec<String> = program.test_functions().map(|f| f.name.clone()).collect();
        shuffle_cases(&mut cases, self.random_seed);
        info!(cases = cases.len(), seed = self.random_seed, "running test suite");

        let mut results = Results::with_capacity(cases.len());
        let mut error = None;
        for name in cases {
            if let Err(err) = run_hook(&mut interpreter, BEFORE_EACH) {
                error = Some(err);
                break;
            }

            let outcome = invoke_contained(&mut interpreter, &name).err();
            match &outcome {
                None => debug!(case = %name, "case passed"),
                Some(err) => info!(case = %name, error = %err, "case failed"),
            }
            results.push(TestResult {
                name,
                error: outcome,
            });

            if let Err(err) = run_hook(&mut interpreter, AFTER_EACH) {
                error = Some(err);
                break;
            }
        }

        if let Err(err) = run_hook(&mut interpreter, TEAR_DOWN) {
            error.get_or_insert(err);
        }
        Ok(SuiteReport { results, error })
    }

    /// Parse, check and interpret `script` against a fresh backend
    fn load(&self, script: &str) -> TestResultOf<(Arc<Program<R::Elaboration>>, R::Interpreter)> {
        let blockchain = (self.ledger_factory)().map_err(BackendError::from)?;
        let backend = EmulatorBackend::new(blockchain, self.file_resolver.clone());
        let invocations = backend.contract_invocations();

        let context = ImportContext {
            runtime: self.runtime.clone(),
            backend: Arc::new(Mutex::new(backend)),
            resolver: self.import_resolver.clone(),
            cache: Arc::default(),
        };

        if let Some(report) = &self.coverage_report {
            report.exclude_location(Location::CRYPTO);
            report.exclude_location(Location::TEST);
            report.exclude_location(Location::TestScript);
        }

        let mut checker_imports = context.clone();
        let program = self
            .runtime
            .parse_and_check(script, Location::TestScript, &mut checker_imports)?;
        validate_test_functions(&program)?;
        let program = Arc::new(program);

        let host = ScriptHost {
            imports: context,
            invocations,
            contract_values: HashMap::new(),
            logger: self.logs.logger(),
            coverage_report: self.coverage_report.clone(),
        };
        let interpreter = self.runtime.interpret(program.clone(), Box::new(host))?;
        Ok((program, interpreter))
    }
}
