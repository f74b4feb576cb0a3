//! Integration tests for the xpp execution engine.
//!
//! Tests key engine features:
//! - scope resolution and write-back
//! - lazy control-flow bodies
//! - loop condition refresh
//! - method calls, arity and return slots
//! - recursion with per-frame locals
//! - fault frames and `try`
//! - bundled operators

use xpp_eval::{
    Argument, EvalError, EvalResult, Fault, Interpreter, InterpreterConfig, OperatorRegistry,
    Value,
};
use xpp_parser::parse_program;
use xpp_types::SourceFile;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn quiet() -> InterpreterConfig {
    InterpreterConfig {
        echo_output: false,
        ..InterpreterConfig::default()
    }
}

/// Compile `source` against `registry` (panics on syntax faults).
fn interpreter_with(
    source: &str,
    registry: OperatorRegistry,
    config: InterpreterConfig,
) -> Interpreter {
    let sf = SourceFile::new("test.xpp", source);
    let program = parse_program(&sf, &registry).unwrap_or_else(|e| panic!("syntax fault: {e}"));
    Interpreter::with_config(program, registry, config)
}

fn interpreter(source: &str) -> Interpreter {
    interpreter_with(source, OperatorRegistry::with_stdlib(), quiet())
}

/// Run `_main` to completion (panics on runtime faults).
fn run(source: &str) -> Interpreter {
    let mut interp = interpreter(source);
    if let Err(fault) = interp.run_main() {
        panic!("runtime fault: {fault}");
    }
    interp
}

fn output(source: &str) -> Vec<String> {
    run(source).output().to_vec()
}

/// Run `_main`, expecting a fault.
fn fault(source: &str) -> Fault {
    let mut interp = interpreter(source);
    match interp.run_main() {
        Ok(value) => panic!("expected a fault, got {value:?}"),
        Err(fault) => fault,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Variables and scopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn prt_joins_operands_with_spaces() {
    assert_eq!(
        output("prt \"hello\" 1 2.5 true none\n"),
        vec!["hello 1 2.5 true none"]
    );
}

#[test]
fn set_then_read_local() {
    assert_eq!(output("set x 5\nprt x\n"), vec!["5"]);
}

#[test]
fn unbound_variable_reads_none() {
    assert_eq!(output("prt missing\n"), vec!["none"]);
}

#[test]
fn three_scopes_are_independent() {
    let interp = run("\
:class C
    :func m()
        set x \"local\"
        set .x \"static\"
        set @x \"global\"
        prt x .x @x
jmp C.m
prt x @x
");
    assert_eq!(interp.output(), ["local static global", "none global"]);
    assert_eq!(interp.static_var("C", "x"), Some(&Value::from("static")));
    assert_eq!(interp.global("x"), Some(&Value::from("global")));
}

#[test]
fn static_write_is_visible_to_sibling_method_only_as_static() {
    let out = output("\
:class C
    :func write()
        set count 1
        set .count 7
    :func read()
        prt .count count
jmp C.write
jmp C.read
");
    assert_eq!(out, vec!["7 none"]);
}

#[test]
fn globals_are_statics_of_the_global_class() {
    let out = output("\
:func bump()
    inc @n
set @n 1
jmp bump
jmp bump
prt @n .n
");
    assert_eq!(out, vec!["3 3"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn if_runs_only_the_else_body() {
    let out = output("\
set x 0
if (x == 1) {thw \"untaken body ran\"} {prt \"else\"}
");
    assert_eq!(out, vec!["else"]);
}

#[test]
fn if_stops_at_first_truthy_condition() {
    let out = output("\
if (1 > 2) {prt \"a\"} (2 > 1) {prt \"b\"} (3 > 1) {prt \"c\"} {prt \"d\"}
if 0 {prt \"zero\"}
");
    assert_eq!(out, vec!["b"]);
}

#[test]
fn if_accepts_plain_values_as_conditions() {
    let out = output("\
set flag \"yes\"
if flag {prt \"truthy\"}
if (flag) {prt \"grouped\"}
");
    assert_eq!(out, vec!["truthy", "grouped"]);
}

#[test]
fn nested_comparisons() {
    let out = output("\
if ((1 < 2) && (3 > 2)) {prt \"both\"}
if ((1 > 2) || (\"a\" == \"a\")) {prt \"either\"}
");
    assert_eq!(out, vec!["both", "either"]);
}

#[test]
fn while_refreshes_its_condition() {
    let out = output("\
set x 0
set passes 0
while (x < 3) {inc x passes}
prt x passes
");
    assert_eq!(out, vec!["3 3"]);
}

#[test]
fn whl_is_an_alias() {
    assert_eq!(
        output("set x 5\nwhl (x > 0) {dec x}\nprt x\n"),
        vec!["0"]
    );
}

#[test]
fn repeat_runs_a_fixed_count() {
    assert_eq!(output("set n 0\nrep 4 {inc n}\nprt n\n"), vec!["4"]);
    assert_eq!(output("set n 0\nrepeat 0 {inc n}\nprt n\n"), vec!["0"]);
}

#[test]
fn try_runs_catch_after_a_fault() {
    let interp = run("\
:func boom()
    set @hits 1
    thw \"no\"
try {jmp boom} {prt \"caught\" @hits}
prt \"after\"
");
    assert_eq!(interp.output(), ["caught 1", "after"]);
    assert!(interp.frames().is_empty());
}

#[test]
fn try_without_catch_propagates() {
    let f = fault("try {thw \"bad\"}\n");
    assert_eq!(f.error, EvalError::Operator("bad".into()));
}

// ══════════════════════════════════════════════════════════════════════════════
// Methods
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arguments_bind_to_parameters() {
    let out = output("\
:func add3(a b c)
    ret (add a b c)
set r (jmp add3 1 2 3)
prt r
");
    assert_eq!(out, vec!["6"]);
}

#[test]
fn ret_fills_the_slot_without_returning() {
    let out = output("\
:func f()
    ret 1
    prt \"after\"
    ret 2
prt (jmp f)
");
    assert_eq!(out, vec!["after", "2"]);
}

#[test]
fn method_without_ret_returns_none() {
    assert_eq!(output(":func f()\n    set x 1\nprt (jmp f)\n"), vec!["none"]);
}

#[test]
fn bare_names_resolve_in_the_callers_class_first() {
    let out = output("\
:class A
    :func helper()
        ret \"A\"
    :func run()
        prt (jmp helper) (jmp .helper)
:func helper()
    ret \"global\"
jmp A.run
prt (jmp helper)
");
    assert_eq!(out, vec!["A A", "global"]);
}

#[test]
fn string_targets_are_method_names() {
    let out = output("\
:class A
    :func hi(name)
        prt \"hi\" name
set target \"A.hi\"
jmp target \"bob\"
");
    assert_eq!(out, vec!["hi bob"]);
}

#[test]
fn recursion_keeps_locals_per_frame() {
    let out = output("\
:func fact(n)
    set r 1
    if (n > 1) {set r (jmp fact (sub n 1))}
    ret (mul n r)
prt (jmp fact 5)
");
    assert_eq!(out, vec!["120"]);
}

#[test]
fn arity_mismatch_is_a_fault_at_the_call_site() {
    let f = fault("\
:func two(a b)
    ret a
prt \"start\"
jmp two 1
");
    assert_eq!(
        f.error,
        EvalError::Arity {
            method: "_global.two".into(),
            expected: 2,
            found: 1,
        }
    );
    assert_eq!(f.frames.len(), 1);
    assert_eq!(f.frames[0].method, "_main");
    assert_eq!(f.frames[0].line_index, 1);
}

#[test]
fn unknown_method_is_a_fault() {
    let f = fault("jmp nowhere\n");
    assert_eq!(f.error, EvalError::UnknownMethod("_global.nowhere".into()));
}

#[test]
fn call_depth_is_limited() {
    let mut interp = interpreter_with(
        ":func spin()\n    jmp spin\njmp spin\n",
        OperatorRegistry::with_stdlib(),
        InterpreterConfig {
            max_call_depth: 10,
            echo_output: false,
        },
    );
    let f = interp.run_main().unwrap_err();
    assert_eq!(f.error, EvalError::CallDepthExceeded(10));
    assert_eq!(f.frames.len(), 10);
}

#[test]
fn fault_keeps_frames_in_call_order() {
    let f = fault("\
:class Foo
    :func bar()
        prt \"in bar\"
        thw \"broken\"
prt \"start\"
jmp Foo.bar
");
    assert_eq!(f.error, EvalError::Operator("broken".into()));
    let shape: Vec<_> = f
        .frames
        .iter()
        .map(|fr| (fr.class.as_str(), fr.method.as_str(), fr.line_index))
        .collect();
    assert_eq!(shape, vec![("_global", "_main", 1), ("Foo", "bar", 1)]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators as values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn operators_pass_as_values() {
    let out = output("\
set f add
prt (jmp f 2 3) (jmp mul 2 3)
");
    assert_eq!(out, vec!["5 6"]);
}

#[test]
fn operator_names_work_as_variables() {
    let out = output("\
set len 5
prt len
set x 1
if (x < len) {prt \"lt\"} {prt \"ge\"}
prt (len \"abc\")
");
    assert_eq!(out, vec!["5", "lt", "3"]);
}

#[test]
fn unbound_operator_name_reads_as_the_operator() {
    assert_eq!(output("prt len\n"), vec!["<operator len>"]);
}

fn peek(_: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
    let arg = args.first().ok_or(EvalError::Operator("peek needs one operand".into()))?;
    Ok(Value::from(format!(
        "{}|{}",
        arg.name().unwrap_or("-"),
        arg.indexed_args().unwrap_or("-")
    )))
}

#[test]
fn indexed_calls_reach_operators_verbatim() {
    let mut registry = OperatorRegistry::with_stdlib();
    registry.register("peek", peek);
    let mut interp = interpreter_with(
        "prt (peek items[1 2]) (peek plain) items[x]\n",
        registry,
        quiet(),
    );
    interp.run_main().unwrap();
    assert_eq!(interp.output(), ["items|1 2 plain|- none"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Bundled operators
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arithmetic_folds_left() {
    assert_eq!(
        output("prt (add 1 2 3) (sub 10 4) (mul 2 3) (div 7 2) (pow 2 8) (add \"a\" \"b\")\n"),
        vec!["6 6 6 3.5 256 ab"]
    );
}

#[test]
fn type_mismatch_is_a_fault() {
    let f = fault("prt (sub \"a\" 1)\n");
    assert!(matches!(f.error, EvalError::TypeMismatch(_)));
}

#[test]
fn string_operators() {
    let out = output("\
set s \"hello\"
upr s
prt s (len s) (chr s 1) (chr s 1 3) (chr s -1) (idx s \"LL\")
set t \"mIxEd\"
cap t
prt t
");
    assert_eq!(out, vec!["HELLO 5 E EL O 2", "Mixed"]);
}

#[test]
fn conversions_write_back() {
    let out = output("\
set n \"42\"
int n
prt (add n 1)
flt n
str n
prt n
");
    assert_eq!(out, vec!["43", "42.0"]);
}

#[test]
fn rnd_rounds_in_place() {
    let out = output("\
set x 2.567
rnd x 2
set y 2.5
rnd y
prt x y (rnd 3.7)
");
    assert_eq!(out, vec!["2.57 2 4"]);
}

#[test]
fn rng_stays_within_bounds() {
    let out = output("\
set lo 1
repeat 20 {set r (rng lo 3)}
prt (rng 5 5)
if ((r >= 1) && (r <= 3)) {prt \"in range\"}
");
    assert_eq!(out, vec!["5", "in range"]);
}

#[test]
fn rng_with_empty_range_is_a_fault() {
    let f = fault("prt (rng 3 1)\n");
    assert!(matches!(f.error, EvalError::Operator(_)));
}

#[test]
fn assigning_to_a_literal_is_a_fault() {
    let f = fault("set 1 2\n");
    assert!(matches!(f.error, EvalError::TypeMismatch(_)));
}

#[test]
fn save_then_load_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let path = path.to_str().unwrap();
    let out = output(&format!(
        "save \"{path}\" \"stored text\"\nprt (load \"{path}\")\n"
    ));
    assert_eq!(out, vec!["stored text"]);
}

#[test]
fn load_missing_file_is_an_operator_fault() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.txt");
    let f = fault(&format!("prt (load \"{}\")\n", path.display()));
    assert!(matches!(f.error, EvalError::Operator(_)));
}
