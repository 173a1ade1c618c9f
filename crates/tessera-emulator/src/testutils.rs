//! Test doubles for the VM seam

use crate::error::ExecutionError;
use crate::vm::{ScriptContext, TransactionContext, VirtualMachine};
use tessera_primitives::Address;
use tessera_types::Value;

/// A minimal VM that recognises a handful of source patterns.
///
/// - `signer.contracts.add(name: "N", code: "HEX".decodeHex()...)` deploys to
///   the first authorizer
/// - `panic("msg")` fails with [`ExecutionError::Panic`]
/// - `log("msg")` records a log line
/// - `return <literal>` in scripts yields an int, string, bool or address
///
/// Anything else succeeds without effect (scripts return `Void`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateVm;

impl TemplateVm {
    /// Create the VM
    pub fn new() -> Self {
        Self
    }
}

fn quoted_after<'a>(code: &'a str, marker: &str) -> Option<&'a str> {
    let start = code.find(marker)? + marker.len();
    let rest = &code[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn panic_message(code: &str) -> Option<String> {
    quoted_after(code, "panic(\"").map(str::to_string)
}

fn log_lines(code: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = code;
    while let Some(message) = quoted_after(rest, "log(\"") {
        lines.push(message.to_string());
        let consumed = rest.find("log(\"").unwrap_or(0) + 5 + message.len();
        rest = &rest[consumed..];
    }
    lines
}

fn parse_literal(literal: &str) -> Result<Value, ExecutionError> {
    let literal = literal.trim();
    if let Some(s) = literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Ok(Value::String(s.to_string()));
    }
    match literal {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "nil" => return Ok(Value::Optional(None)),
        _ => {}
    }
    if literal.starts_with("0x") {
        return Address::from_hex(literal)
            .map(Value::Address)
            .map_err(|e| ExecutionError::Runtime(e.to_string()));
    }
    literal
        .parse::<i128>()
        .map(Value::Int)
        .map_err(|_| ExecutionError::Runtime(format!("unsupported literal: {literal}")))
}

fn return_literal(code: &str) -> Option<&str> {
    let start = code.find("return ")? + "return ".len();
    let rest = &code[start..];
    let end = rest.find(|c: char| matches!(c, '\n' | '}' | ';')).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

impl VirtualMachine for TemplateVm {
    fn execute_script(
        &self,
        ctx: &mut ScriptContext<'_>,
        code: &str,
        _arguments: &[Value],
    ) -> Result<Value, ExecutionError> {
        for line in log_lines(code) {
            ctx.log(line);
        }
        if let Some(message) = panic_message(code) {
            return Err(ExecutionError::Panic(message));
        }
        match return_literal(code) {
            Some(literal) => parse_literal(literal),
            None => Ok(Value::Void),
        }
    }

    fn execute_transaction(
        &self,
        ctx: &mut TransactionContext<'_>,
        code: &str,
        _arguments: &[Value],
    ) -> Result<(), ExecutionError> {
        for line in log_lines(code) {
            ctx.log(line);
        }
        if let Some(message) = panic_message(code) {
            return Err(ExecutionError::Panic(message));
        }

        if let Some(name) = quoted_after(code, "signer.contracts.add(name: \"") {
            let hex_code = quoted_after(code, "code: \"")
                .ok_or_else(|| ExecutionError::Runtime("missing contract code".to_string()))?;
            let source = hex::decode(hex_code)
                .map_err(|e| ExecutionError::Runtime(format!("invalid hex: {e}")))?;
            let signer = ctx
                .authorizers()
                .first()
                .copied()
                .ok_or_else(|| ExecutionError::Runtime("no authorizer".to_string()))?;
            ctx.add_contract(&signer, name, source)?;
            ctx.emit_event(
                "tessera.AccountContractAdded",
                Value::Struct(tessera_types::Composite::new(
                    "tessera.AccountContractAdded",
                    vec![
                        ("address".to_string(), Value::Address(signer)),
                        ("contract".to_string(), Value::String(name.to_string())),
                    ],
                )),
            );
        }
        Ok(())
    }
}
