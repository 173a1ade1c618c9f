//! Scripted runtime used by the integration tests
//!
//! `MockRuntime` understands just enough source to drive the runner:
//! leading `import` declarations, `fun name(params): Ret` lines and
//! `contract Name` lines. Function bodies are Rust closures registered by
//! name, so tests decide what each hook or case does.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_emulator::testutils::TemplateVm;
use tessera_emulator::{Blockchain, Emulator};
use tessera_test::runtime::{
    CompositeType, ContractValue, FunctionDeclaration, ImportHandler, Interpreter,
    InterpreterHost, Program, Runtime,
};
use tessera_test::{
    scan_imports, BuiltinModule, LedgerFactory, Location, RuntimeError, TestFramework,
    TestRunner,
};
use tessera_types::Value;

/// Function body
pub type Body = Arc<dyn Fn(&mut Call<'_>) -> Result<Value, RuntimeError> + Send + Sync>;

/// Checker output: the locations a program imports
#[derive(Debug, Default)]
pub struct MockElaboration {
    pub imports: Vec<Location>,
}

#[derive(Clone, Default)]
pub struct MockRuntime {
    bodies: HashMap<String, Body>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: &str,
        body: impl Fn(&mut Call<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        self.bodies.insert(name.to_string(), Arc::new(body));
        self
    }
}

fn parse_error(location: &Location, message: impl Into<String>) -> RuntimeError {
    RuntimeError::Parse {
        location: location.clone(),
        message: message.into(),
    }
}

fn parse_function(line: &str, location: &Location) -> Result<FunctionDeclaration, RuntimeError> {
    let open = line.find('(').ok_or_else(|| parse_error(location, "expected `(`"))?;
    let close = line.find(')').ok_or_else(|| parse_error(location, "expected `)`"))?;
    let name = line[..open].trim();
    if name.is_empty() || close < open {
        return Err(parse_error(location, format!("malformed function: {line}")));
    }
    let params = line[open + 1..close].trim();
    let rest = line[close + 1..].trim_start();

    Ok(FunctionDeclaration {
        name: name.to_string(),
        parameter_count: if params.is_empty() {
            0
        } else {
            params.split(',').count()
        },
        has_return_type: rest.starts_with(':'),
    })
}

impl Runtime for MockRuntime {
    type Elaboration = MockElaboration;
    type Interpreter = MockInterpreter;

    fn parse_and_check(
        &self,
        code: &str,
        location: Location,
        imports: &mut dyn ImportHandler<MockElaboration>,
    ) -> Result<Program<MockElaboration>, RuntimeError> {
        let declarations =
            scan_imports(code).map_err(|e| parse_error(&location, e.to_string()))?;

        let mut imported = Vec::new();
        for declaration in &declarations {
            for import in declaration.locations() {
                imports.import(&import)?;
                imported.push(import);
            }
        }

        let mut functions = Vec::new();
        let mut composites = Vec::new();
        for line in code.lines() {
            let line = line.trim();
            let line = line.strip_prefix("pub ").unwrap_or(line);
            if let Some(rest) = line.strip_prefix("fun ") {
                functions.push(parse_function(rest, &location)?);
            } else if let Some(rest) = line.strip_prefix("contract ") {
                let identifier = rest
                    .split(|c: char| !c.is_alphanumeric() && c != '_')
                    .next()
                    .unwrap_or_default();
                composites.push(CompositeType {
                    location: location.clone(),
                    identifier: identifier.to_string(),
                });
            }
        }

        Ok(Program {
            location,
            functions,
            composites,
            elaboration: MockElaboration { imports: imported },
        })
    }

    fn builtin(&self, module: BuiltinModule) -> Arc<Program<MockElaboration>> {
        Arc::new(Program {
            location: module.location(),
            functions: Vec::new(),
            composites: vec![CompositeType {
                location: module.location(),
                identifier: module.name().to_string(),
            }],
            elaboration: MockElaboration::default(),
        })
    }

    fn interpret(
        &self,
        program: Arc<Program<MockElaboration>>,
        mut host: Box<dyn InterpreterHost<MockElaboration>>,
    ) -> Result<MockInterpreter, RuntimeError> {
        let coverage = host.coverage_report();
        if let Some(report) = &coverage {
            report.inspect_program(&program.location, 1..=program.functions.len());
        }

        let mut composites = Vec::new();
        for location in &program.elaboration.imports {
            let imported = host.import_program(location)?;
            if let Some(report) = &coverage {
                report.inspect_program(&imported.location, 1..=imported.functions.len());
            }
            composites.extend(imported.composites.iter().cloned());
        }

        Ok(MockInterpreter {
            program,
            bodies: self.bodies.clone(),
            host,
            composites,
        })
    }
}

pub struct MockInterpreter {
    program: Arc<Program<MockElaboration>>,
    bodies: HashMap<String, Body>,
    host: Box<dyn InterpreterHost<MockElaboration>>,
    composites: Vec<CompositeType>,
}

impl Interpreter for MockInterpreter {
    fn contains_global(&self, name: &str) -> bool {
        self.program.function(name).is_some()
    }

    fn invoke(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let Some(index) = self.program.functions.iter().position(|f| f.name == name) else {
            return Err(RuntimeError::FunctionNotFound(name.to_string()));
        };
        if let Some(report) = self.host.coverage_report() {
            report.add_line_hit(&self.program.location, index + 1);
        }
        let Some(body) = self.bodies.get(name).cloned() else {
            return Ok(Value::Void);
        };
        let mut call = Call {
            host: self.host.as_mut(),
            composites: &self.composites,
            arguments,
        };
        body(&mut call)
    }
}

/// What a function body can reach
pub struct Call<'a> {
    host: &'a mut dyn InterpreterHost<MockElaboration>,
    composites: &'a [CompositeType],
    pub arguments: Vec<Value>,
}

impl Call<'_> {
    pub fn log(&self, message: &str) {
        self.host.log(message);
    }

    /// Value of an imported contract, resolved on first use
    pub fn contract(&mut self, name: &str) -> Result<ContractValue, RuntimeError> {
        let composite = self
            .composites
            .iter()
            .find(|c| c.identifier == name)
            .cloned()
            .ok_or_else(|| RuntimeError::Execution(format!("cannot find contract {name}")))?;
        Ok(self.host.contract_value(&composite)?)
    }

    /// The `Test` contract's framework handle
    pub fn test(&mut self) -> Result<Arc<Mutex<dyn TestFramework>>, RuntimeError> {
        match self.contract("Test")? {
            ContractValue::TestFramework(framework) => Ok(framework),
            other => Err(RuntimeError::Execution(format!("unexpected Test value: {other:?}"))),
        }
    }
}

/// Counts how many times a body ran
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn runner(runtime: MockRuntime) -> TestRunner<MockRuntime> {
    init_tracing();
    TestRunner::with_emulator(runtime, TemplateVm::new())
}

/// Ledger factory whose ledgers start with `contracts` deployed at 0x02
pub fn ledger_with_contracts(contracts: &[(&str, &str)]) -> LedgerFactory {
    let contracts: BTreeMap<String, Vec<u8>> = contracts
        .iter()
        .map(|(name, code)| (name.to_string(), code.as_bytes().to_vec()))
        .collect();
    Arc::new(move || {
        let mut emulator = Emulator::new(TemplateVm::new())?;
        emulator.create_account(Vec::new(), contracts.clone())?;
        Ok(Box::new(emulator) as Box<dyn Blockchain>)
    })
}
