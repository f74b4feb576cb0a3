//! Comparison triples: `(left op right)`.

use std::cmp::Ordering;

use xpp_types::ast::Comparator;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Apply `op` to two resolved operands.
///
/// `||` and `&&` return one of their operands rather than a bool; both
/// operands have already been evaluated.
pub fn compare(op: Comparator, left: &Value, right: &Value) -> EvalResult<Value> {
    let result = match op {
        Comparator::Eq => left.loose_eq(right),
        Comparator::Ne => !left.loose_eq(right),
        Comparator::Or => {
            let pick = if left.is_truthy() { left } else { right };
            return Ok(pick.clone());
        }
        Comparator::And => {
            let pick = if left.is_truthy() { right } else { left };
            return Ok(pick.clone());
        }
        Comparator::Gt => order(op, left, right)? == Ordering::Greater,
        Comparator::Lt => order(op, left, right)? == Ordering::Less,
        Comparator::Ge => order(op, left, right)? != Ordering::Less,
        Comparator::Le => order(op, left, right)? != Ordering::Greater,
    };
    Ok(Value::Bool(result))
}

fn order(op: Comparator, left: &Value, right: &Value) -> EvalResult<Ordering> {
    let mismatch = || {
        EvalError::TypeMismatch(format!(
            "cannot compare {} {op} {}",
            left.type_name(),
            right.type_name()
        ))
    };
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => {
            let (a, b) = left.as_f64().zip(right.as_f64()).ok_or_else(mismatch)?;
            a.partial_cmp(&b).ok_or_else(mismatch)
        }
    }
}
