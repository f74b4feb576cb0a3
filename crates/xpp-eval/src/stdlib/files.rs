//! File operators: `load path` and `save path data`.

use std::fs;

use crate::argument::Argument;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

use super::{expect_operands, string_operand};

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register("load", op_load).register("save", op_save);
}

fn op_load(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("load", args, 1..=1)?;
    let path = string_operand("load", &args[0].resolve(interp)?)?;
    fs::read_to_string(&path)
        .map(Value::Str)
        .map_err(|e| EvalError::Operator(format!("cannot read '{path}': {e}")))
}

fn op_save(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("save", args, 2..=2)?;
    let path = string_operand("save", &args[0].resolve(interp)?)?;
    let data = args[1].resolve(interp)?.to_string();
    fs::write(&path, data)
        .map_err(|e| EvalError::Operator(format!("cannot write '{path}': {e}")))?;
    tracing::debug!(%path, "saved file");
    Ok(Value::Null)
}
