//! Control flow: `if`, `while`, `repeat`, `try`.
//!
//! Bodies arrive as unevaluated blocks and run only when chosen.

use crate::argument::Argument;
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

use super::{expect_operands, int_operand, run_body};

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry
        .register("if", op_if)
        .register("while", op_while)
        .register("whl", op_while)
        .register("repeat", op_repeat)
        .register("rep", op_repeat)
        .register("try", op_try);
}

/// `if cond body [cond body ...] [else]`
fn op_if(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("if", args, 2..=usize::MAX)?;
    for pair in args.chunks_mut(2) {
        match pair {
            [cond, body] => {
                if cond.resolve(interp)?.is_truthy() {
                    return run_body(interp, body);
                }
            }
            [otherwise] => return run_body(interp, otherwise),
            _ => {}
        }
    }
    Ok(Value::Null)
}

/// `while cond body`: the condition is re-read after every pass.
fn op_while(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("while", args, 2..=2)?;
    let [cond, body] = args else {
        return Ok(Value::Null);
    };
    let mut last = Value::Null;
    while cond.resolve(interp)?.is_truthy() {
        last = run_body(interp, body)?;
        cond.refresh(interp)?;
    }
    Ok(last)
}

/// `repeat count body`
fn op_repeat(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("repeat", args, 2..=2)?;
    let [count, body] = args else {
        return Ok(Value::Null);
    };
    let count = int_operand("repeat", &count.resolve(interp)?)?;
    let mut last = Value::Null;
    for _ in 0..count.max(0) {
        last = run_body(interp, body)?;
    }
    Ok(last)
}

/// `try body [catch]`
fn op_try(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("try", args, 1..=2)?;
    let depth = interp.depth();
    let (body, catch) = match args {
        [body] => (body, None),
        [body, catch] => (body, Some(catch)),
        _ => return Ok(Value::Null),
    };
    match (run_body(interp, body), catch) {
        (Err(err), Some(catch)) => {
            tracing::debug!(%err, "fault caught by try");
            interp.unwind_to(depth);
            run_body(interp, catch)
        }
        (result, _) => result,
    }
}
