//! Arithmetic: `add sub mul div pow` fold left over their operands;
//! `inc` and `dec` step each operand and write it back. `rnd` rounds in
//! place and `rng` draws a random integer.

use rand::Rng;

use crate::argument::Argument;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

use super::{expect_operands, int_operand, resolve_all};

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry
        .register("add", op_add)
        .register("sub", op_sub)
        .register("mul", op_mul)
        .register("div", op_div)
        .register("pow", op_pow)
        .register("inc", op_inc)
        .register("dec", op_dec)
        .register("rnd", op_rnd)
        .register("rng", op_rng);
}

type Binary = fn(&Value, &Value) -> EvalResult<Value>;

fn fold(
    op: &str,
    interp: &mut Interpreter,
    args: &mut [Argument],
    apply: Binary,
) -> EvalResult<Value> {
    expect_operands(op, args, 1..=usize::MAX)?;
    let mut values = resolve_all(interp, args)?.into_iter();
    let first = values.next().unwrap_or(Value::Null);
    values.try_fold(first, |acc, next| apply(&acc, &next))
}

fn op_add(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    fold("add", interp, args, add)
}

fn op_sub(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    fold("sub", interp, args, sub)
}

fn op_mul(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    fold("mul", interp, args, mul)
}

fn op_div(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    fold("div", interp, args, div)
}

fn op_pow(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    fold("pow", interp, args, pow)
}

fn op_inc(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    step("inc", interp, args, 1)
}

fn op_dec(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    step("dec", interp, args, -1)
}

fn step(op: &str, interp: &mut Interpreter, args: &mut [Argument], by: i64) -> EvalResult<Value> {
    expect_operands(op, args, 1..=usize::MAX)?;
    let mut last = Value::Null;
    for arg in args.iter_mut() {
        let next = add(&arg.resolve(interp)?, &Value::Int(by))?;
        arg.set(interp, next.clone())?;
        last = next;
    }
    Ok(last)
}

/// `rnd value [places]`: round half to even and write back. Without
/// `places` the result is an int.
fn op_rnd(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("rnd", args, 1..=2)?;
    let places = match args.get_mut(1) {
        Some(arg) => Some(int_operand("rnd", &arg.resolve(interp)?)?),
        None => None,
    };
    let target = &mut args[0];
    let rounded = round(&target.resolve(interp)?, places)?;
    if target.is_bound() {
        target.set(interp, rounded.clone())?;
    }
    Ok(rounded)
}

/// `rng min max`: a random integer in `min..=max`.
fn op_rng(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("rng", args, 2..=2)?;
    let values = resolve_all(interp, args)?;
    let min = int_operand("rng", &values[0])?;
    let max = int_operand("rng", &values[1])?;
    if max < min {
        return Err(EvalError::Operator(format!(
            "'rng' range is empty: {min} > {max}"
        )));
    }
    Ok(Value::Int(rand::thread_rng().gen_range(min..=max)))
}

fn round(value: &Value, places: Option<i64>) -> EvalResult<Value> {
    let places = i32::try_from(places.unwrap_or(0))
        .map_err(|_| EvalError::Operator("'rnd' places out of range".to_string()))?;
    match value {
        Value::Int(n) if places >= 0 => Ok(Value::Int(*n)),
        Value::Int(n) => {
            let scale = 10f64.powi(places.saturating_neg());
            float_to_int(((*n as f64) / scale).round_ties_even() * scale)
        }
        Value::Float(x) if places == 0 => float_to_int(x.round_ties_even()),
        Value::Float(x) => {
            let scale = 10f64.powi(places);
            Ok(Value::Float((x * scale).round_ties_even() / scale))
        }
        other => Err(EvalError::TypeMismatch(format!(
            "'rnd' expects a number, got {}",
            other.type_name()
        ))),
    }
}

fn float_to_int(x: f64) -> EvalResult<Value> {
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(Value::Int(x as i64))
    } else {
        Err(overflow("rnd"))
    }
}

// ── Binary operations ─────────────────────────────────────────────────────

fn mismatch(op: &str, a: &Value, b: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "cannot {op} {} and {}",
        a.type_name(),
        b.type_name()
    ))
}

fn overflow(op: &str) -> EvalError {
    EvalError::Operator(format!("integer overflow in '{op}'"))
}

fn numeric(
    op: &str,
    a: &Value,
    b: &Value,
    ints: fn(i64, i64) -> Option<i64>,
    floats: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => ints(*x, *y).map(Value::Int).ok_or_else(|| overflow(op)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(floats(x, y))),
            _ => Err(mismatch(op, a, b)),
        },
    }
}

fn add(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        _ => numeric("add", a, b, i64::checked_add, |x, y| x + y),
    }
}

fn sub(a: &Value, b: &Value) -> EvalResult<Value> {
    numeric("sub", a, b, i64::checked_sub, |x, y| x - y)
}

fn mul(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat(usize::try_from(*n).unwrap_or(0))))
        }
        _ => numeric("mul", a, b, i64::checked_mul, |x, y| x * y),
    }
}

/// Division always produces a float.
fn div(a: &Value, b: &Value) -> EvalResult<Value> {
    let (x, y) = a.as_f64().zip(b.as_f64()).ok_or_else(|| mismatch("div", a, b))?;
    if y == 0.0 {
        return Err(EvalError::Operator("division by zero".to_string()));
    }
    Ok(Value::Float(x / y))
}

fn pow(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) if *y >= 0 => {
            let exp = u32::try_from(*y).map_err(|_| overflow("pow"))?;
            x.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow("pow"))
        }
        _ => {
            let (x, y) = a.as_f64().zip(b.as_f64()).ok_or_else(|| mismatch("pow", a, b))?;
            Ok(Value::Float(x.powf(y)))
        }
    }
}
