//! Core operators: output, input, assignment, calls and faults.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::argument::Argument;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::registry::OperatorRegistry;
use crate::value::Value;

use super::{expect_operands, resolve_all};

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry
        .register("prt", op_prt)
        .register("inp", op_inp)
        .register("set", op_set)
        .register("ret", op_ret)
        .register("jmp", op_jmp)
        .register("thw", op_thw)
        .register("hlt", op_hlt);
}

/// `prt values...`: print the operands separated by spaces.
fn op_prt(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    let text = resolve_all(interp, args)?
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interp.print(text);
    Ok(Value::Null)
}

/// `inp [prompt]`: read one line from stdin, without its line ending.
fn op_inp(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("inp", args, 0..=1)?;
    let prompt = match args.first_mut() {
        Some(arg) => arg.resolve(interp)?.to_string(),
        None => String::new(),
    };
    let line = read_line(&mut io::stdin().lock(), &mut io::stdout().lock(), &prompt)?;
    Ok(Value::Str(line))
}

fn read_line(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> EvalResult<String> {
    let failed = |e: io::Error| EvalError::Operator(format!("'inp' failed: {e}"));
    output.write_all(prompt.as_bytes()).map_err(failed)?;
    output.flush().map_err(failed)?;

    let mut line = String::new();
    if input.read_line(&mut line).map_err(failed)? == 0 {
        return Err(EvalError::Operator("'inp' reached end of input".to_string()));
    }
    let text = line.strip_suffix('\n').unwrap_or(&line);
    Ok(text.strip_suffix('\r').unwrap_or(text).to_string())
}

/// `set variable value`
fn op_set(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("set", args, 2..=2)?;
    let [variable, data] = args else {
        return Ok(Value::Null);
    };
    let value = data.resolve(interp)?;
    variable.set(interp, value)?;
    Ok(Value::Null)
}

/// `ret [value]`: fill the return slot. Execution carries on.
fn op_ret(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("ret", args, 0..=1)?;
    let value = match args.first_mut() {
        Some(arg) => arg.resolve(interp)?,
        None => Value::Null,
    };
    interp.set_return(value.clone())?;
    Ok(value)
}

/// `jmp target args...`
///
/// The target is a method name, a string holding one, or an operator value,
/// which is invoked with the remaining operands.
fn op_jmp(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("jmp", args, 1..=usize::MAX)?;
    let Some((target, rest)) = args.split_first_mut() else {
        return Ok(Value::Null);
    };
    let name = match target.resolve(interp)? {
        Value::Operator(handle) => return handle.call(interp, rest),
        Value::Str(name) => name,
        _ => target
            .name()
            .map(str::to_string)
            .ok_or_else(|| EvalError::TypeMismatch("'jmp' expects a method name".to_string()))?,
    };
    let values = resolve_all(interp, rest)?;
    interp.call(&name, values)
}

/// `thw [message]`
fn op_thw(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("thw", args, 0..=1)?;
    let message = match args.first_mut() {
        Some(arg) => arg.resolve(interp)?.to_string(),
        None => "exception thrown in xpp thread".to_string(),
    };
    Err(EvalError::Operator(message))
}

/// `hlt seconds`
fn op_hlt(interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    expect_operands("hlt", args, 1..=1)?;
    let value = args[0].resolve(interp)?;
    let seconds = value.as_f64().ok_or_else(|| {
        EvalError::TypeMismatch(format!("'hlt' expects a number, got {}", value.type_name()))
    })?;
    let delay = Duration::try_from_secs_f64(seconds)
        .map_err(|e| EvalError::Operator(format!("'hlt' cannot wait {seconds}s: {e}")))?;
    std::thread::sleep(delay);
    Ok(Value::Null)
}
