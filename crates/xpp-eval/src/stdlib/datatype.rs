//! Conversions and string operators.
//!
//! Conversions and case changes write their result back to a variable
//! operand. String positions are counted in characters.

use crate::argument::Argument;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

use super::{expect_operands, int_operand, string_operand};

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry
        .register("int", op_int)
        .register("str", op_str)
        .register("flt", op_flt)
        .register("len", op_len)
        .register("upr", op_upr)
        .register("lwr", op_lwr)
        .register("cap", op_cap)
        .register("chr", op_chr)
        .register("idx", op_idx);
}

/// Convert every operand in place, returning the last result.
fn convert_each(
    op: &str,
    interp: &mut Interpreter,
    args: &mut [Argument],
    convert: fn(&Value) -> EvalResult<Value>,
) -> EvalResult<Value> {
    expect_operands(op, args, 1..=usize::MAX)?;
    let mut last = Value::Null;
    for arg in args.iter_mut() {
        let converted = convert(&arg.resolve(interp)?)?;
        if arg.is_bound() {
            arg.set(interp, converted.clone())?;
        }
        last = converted;
    }
    Ok(last)
}

fn op_int(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("int", interp, args, to_int)
}

fn op_str(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("str", interp, args, |v| Ok(Value::Str(v.to_string())))
}

fn op_flt(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("flt", interp, args, to_float)
}

fn op_upr(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("upr", interp, args, |v| Ok(string_operand("upr", v)?.to_uppercase().into()))
}

fn op_lwr(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("lwr", interp, args, |v| Ok(string_operand("lwr", v)?.to_lowercase().into()))
}

fn op_cap(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    convert_each("cap", interp, args, |v| Ok(capitalize(&string_operand("cap", v)?).into()))
}

/// `len string`
fn op_len(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("len", args, 1..=1)?;
    let text = string_operand("len", &args[0].resolve(interp)?)?;
    Ok(Value::Int(text.chars().count() as i64))
}

/// `chr string index [stop]`: characters `index..stop`, or the one at
/// `index`. Negative positions count from the end.
fn op_chr(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("chr", args, 2..=3)?;
    let text = string_operand("chr", &args[0].resolve(interp)?)?;
    let start = int_operand("chr", &args[1].resolve(interp)?)?;
    let stop = match args.get_mut(2) {
        Some(arg) => int_operand("chr", &arg.resolve(interp)?)?,
        None if start == -1 => i64::MAX,
        None => start.saturating_add(1),
    };
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let clamp = |i: i64| {
        let i = if i < 0 { i + len } else { i };
        i.clamp(0, len) as usize
    };
    let (from, to) = (clamp(start), clamp(stop));
    Ok(Value::Str(chars.get(from..to.max(from)).unwrap_or(&[]).iter().collect()))
}

/// `idx string substring`: character position of the first match.
fn op_idx(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("idx", args, 2..=2)?;
    let text = string_operand("idx", &args[0].resolve(interp)?)?;
    let needle = string_operand("idx", &args[1].resolve(interp)?)?;
    let byte = text
        .find(&needle)
        .ok_or_else(|| EvalError::Operator(format!("substring '{needle}' not found")))?;
    Ok(Value::Int(text[..byte].chars().count() as i64))
}

// ── Conversions ───────────────────────────────────────────────────────────

fn to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            EvalError::Operator(format!("invalid literal for int: '{s}'"))
        }),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot convert {} to int",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalError::Operator(format!("invalid literal for float: '{s}'"))
        }),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot convert {} to float",
            other.type_name()
        ))),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
