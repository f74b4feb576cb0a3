//! Bundled operators.
//!
//! Each module registers its operators explicitly; [`register_all`] is what
//! [`OperatorRegistry::with_stdlib`] calls.

mod branch;
mod datatype;
mod files;
mod internal;
mod math;

use std::ops::RangeInclusive;

use crate::argument::Argument;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

/// Register every bundled operator.
pub fn register_all(registry: &mut OperatorRegistry) {
    branch::register(registry);
    internal::register(registry);
    math::register(registry);
    datatype::register(registry);
    files::register(registry);
}

/// Fail unless `args.len()` is within `range`.
pub(crate) fn expect_operands(
    op: &str,
    args: &[Argument],
    range: RangeInclusive<usize>,
) -> EvalResult<()> {
    if range.contains(&args.len()) {
        return Ok(());
    }
    let expected = if range.start() == range.end() {
        range.start().to_string()
    } else if *range.end() == usize::MAX {
        format!("at least {}", range.start())
    } else {
        format!("{} to {}", range.start(), range.end())
    };
    Err(EvalError::Operator(format!(
        "'{op}' expects {expected} operand(s), got {}",
        args.len()
    )))
}

/// Resolve every operand in order.
pub(crate) fn resolve_all(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Vec<Value>> {
    args.iter_mut().map(|arg| arg.resolve(interp)).collect()
}

/// Run an operand as a body: blocks execute, operators are invoked with no
/// operands, and anything else is already a value.
pub(crate) fn run_body(interp: &mut Interpreter, arg: &mut Argument) -> EvalResult<Value> {
    match arg.resolve(interp)? {
        Value::Block(line) => interp.execute_block(&line),
        Value::Operator(handle) => handle.call(interp, &mut []),
        value => Ok(value),
    }
}

/// The operand as a string, or a type mismatch naming `op`.
pub(crate) fn string_operand(op: &str, value: &Value) -> EvalResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        EvalError::TypeMismatch(format!("'{op}' expects a string, got {}", value.type_name()))
    })
}

/// The operand as an integer, or a type mismatch naming `op`.
pub(crate) fn int_operand(op: &str, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::TypeMismatch(format!(
            "'{op}' expects an int, got {}",
            other.type_name()
        ))),
    }
}
