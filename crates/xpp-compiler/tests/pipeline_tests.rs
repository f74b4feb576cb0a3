//! End-to-end tests: compile cache behaviour, fault reports and the
//! run entry points.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use xpp_compiler::{
    compile_source, load_program, registry_digest, run_file, run_source, CompileError,
    CompilerConfig, FaultReport, ProgramCache, RunError, CACHE_DIR_NAME,
};
use xpp_eval::{Argument, EvalResult, Interpreter, OperatorRegistry, Value};
use xpp_types::ErrorCode;

// ──────────────────────────────────────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────────────────────────────────────

const FAULTING: &str = "\
:class Foo
    :func bar()
        prt \"in bar\"
        thw \"broken\"
prt \"start\"
jmp Foo.bar
";

fn quiet() -> CompilerConfig {
    CompilerConfig {
        echo_output: false,
        ..CompilerConfig::default()
    }
}

/// Write `source` to `main.xpp` inside a fresh temp dir.
fn source_file(source: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.xpp");
    fs::write(&path, source).unwrap();
    (dir, path)
}

/// Push the source's mtime past any artifact written so far.
fn touch_future(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(120);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}

fn noop(_: &mut Interpreter, _: &mut [Argument]) -> EvalResult<Value> {
    Ok(Value::Null)
}

fn fault_report(result: Result<xpp_compiler::RunOutcome, RunError>) -> FaultReport {
    match result {
        Err(RunError::Fault(report)) => report,
        other => panic!("expected a runtime fault, got {other:?}"),
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Running
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn run_source_collects_output_and_return_value() {
    let outcome = run_source(
        "prt \"hi\"\nset x (add 2 3)\nprt x\nret x\n",
        Path::new("main.xpp"),
        &quiet(),
    )
    .unwrap();
    assert_eq!(outcome.output, vec!["hi", "5"]);
    assert_eq!(outcome.value, Value::Int(5));
    assert!(!outcome.from_cache);
}

#[test]
fn run_file_reads_from_disk() {
    let (_dir, path) = source_file(":func sq(n)\n    ret (mul n n)\nprt (jmp sq 7)\n");
    let outcome = run_file(&path, &quiet().without_cache()).unwrap();
    assert_eq!(outcome.output, vec!["49"]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_file(&dir.path().join("absent.xpp"), &quiet()).unwrap_err();
    assert!(matches!(err, RunError::Compile(CompileError::Io { .. })));
    assert!(err.to_string().contains("absent.xpp"));
}

#[test]
fn structural_faults_stop_before_running() {
    let err = run_source("prt 1\nfrobnicate 2\n", Path::new("main.xpp"), &quiet()).unwrap_err();
    match err {
        RunError::Compile(CompileError::Syntax(fault)) => {
            assert_eq!(fault.code, ErrorCode::UNKNOWN_OPERATOR);
            assert_eq!(fault.span.start_line, 2);
        }
        other => panic!("expected a syntax fault, got {other:?}"),
    }
}

#[test]
fn configured_indent_width_reaches_the_parser() {
    let config = CompilerConfig {
        indent_width: 2,
        ..quiet()
    };
    let outcome = run_source(
        ":class A\n  :func f()\n    prt \"two\"\njmp A.f\n",
        Path::new("main.xpp"),
        &config,
    )
    .unwrap();
    assert_eq!(outcome.output, vec!["two"]);
}

#[test]
fn call_depth_limit_comes_from_config() {
    let config = CompilerConfig {
        max_call_depth: 5,
        ..quiet()
    };
    let report = fault_report(run_source(
        ":func loop()\n    jmp loop\njmp loop\n",
        Path::new("main.xpp"),
        &config,
    ));
    assert!(report.message.contains('5'));
}

// ──────────────────────────────────────────────────────────────────────────────
// Compile cache
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn second_load_uses_the_cache() {
    let (dir, path) = source_file("prt \"cached\"\n");
    let registry = OperatorRegistry::with_stdlib();
    let config = quiet();

    let first = load_program(&path, &registry, &config).unwrap();
    assert!(!first.from_cache);
    assert!(dir.path().join(CACHE_DIR_NAME).is_dir());

    let second = load_program(&path, &registry, &config).unwrap();
    assert!(second.from_cache);
    assert_eq!(first.program, second.program);
}

#[test]
fn cached_and_uncached_programs_are_identical() {
    let (_dir, path) = source_file(FAULTING);
    let registry = OperatorRegistry::with_stdlib();

    let cached = load_program(&path, &registry, &quiet()).unwrap();
    let fresh = load_program(&path, &registry, &quiet().without_cache()).unwrap();
    assert!(!fresh.from_cache);
    assert_eq!(cached.program, fresh.program);
}

#[test]
fn disabled_cache_writes_nothing() {
    let (dir, path) = source_file("prt 1\n");
    let registry = OperatorRegistry::with_stdlib();
    load_program(&path, &registry, &quiet().without_cache()).unwrap();
    assert!(!dir.path().join(CACHE_DIR_NAME).exists());
}

#[test]
fn newer_source_is_recompiled() {
    let (_dir, path) = source_file("prt \"old\"\n");
    let registry = OperatorRegistry::with_stdlib();
    let config = quiet();
    load_program(&path, &registry, &config).unwrap();

    fs::write(&path, "prt \"new\"\n").unwrap();
    touch_future(&path);

    let reloaded = load_program(&path, &registry, &config).unwrap();
    assert!(!reloaded.from_cache);
    let outcome = run_file(&path, &config).unwrap();
    assert_eq!(outcome.output, vec!["new"]);
}

#[test]
fn different_operator_set_is_recompiled() {
    let (_dir, path) = source_file("prt 1\n");
    let config = quiet();
    let stdlib = OperatorRegistry::with_stdlib();
    load_program(&path, &stdlib, &config).unwrap();

    let mut extended = OperatorRegistry::with_stdlib();
    extended.register("nop", noop);
    assert_ne!(
        registry_digest(stdlib.names()),
        registry_digest(extended.names())
    );
    let reloaded = load_program(&path, &extended, &config).unwrap();
    assert!(!reloaded.from_cache);

    // The artifact now belongs to the extended set.
    assert!(load_program(&path, &extended, &config).unwrap().from_cache);
}

#[test]
fn corrupt_artifact_is_replaced() {
    let (_dir, path) = source_file("prt 1\n");
    let registry = OperatorRegistry::with_stdlib();
    let config = quiet();
    load_program(&path, &registry, &config).unwrap();

    let artifact = ProgramCache::for_source(&path, &config.cache).artifact_path(&path);
    fs::write(&artifact, "{ not json").unwrap();

    assert!(!load_program(&path, &registry, &config).unwrap().from_cache);
    assert!(load_program(&path, &registry, &config).unwrap().from_cache);
}

#[test]
fn configured_cache_dir_is_used() {
    let (dir, path) = source_file("prt 1\n");
    let cache_dir = dir.path().join("artifacts");
    let mut config = quiet();
    config.cache.dir = Some(cache_dir.clone());

    load_program(&path, &OperatorRegistry::with_stdlib(), &config).unwrap();
    assert!(ProgramCache::new(&cache_dir).artifact_path(&path).is_file());
    assert!(!dir.path().join(CACHE_DIR_NAME).exists());
}

#[test]
fn unwritable_cache_dir_is_ignored() {
    let (dir, path) = source_file("prt \"still runs\"\n");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let mut config = quiet();
    config.cache.dir = Some(blocker.join("cache"));

    let outcome = run_file(&path, &config).unwrap();
    assert_eq!(outcome.output, vec!["still runs"]);
    assert!(!outcome.from_cache);
}

#[test]
fn run_file_reports_cache_hits() {
    let (_dir, path) = source_file("prt \"twice\"\n");
    let config = quiet();
    assert!(!run_file(&path, &config).unwrap().from_cache);
    let again = run_file(&path, &config).unwrap();
    assert!(again.from_cache);
    assert_eq!(again.output, vec!["twice"]);
}

// ──────────────────────────────────────────────────────────────────────────────
// Fault reports
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn fault_report_maps_every_frame_to_its_line() {
    let report = fault_report(run_source(FAULTING, Path::new("main.xpp"), &quiet()));
    assert_eq!(report.message, "broken");
    assert_eq!(report.entries.len(), 2);

    let outer = &report.entries[0];
    assert_eq!(outer.file, "main.xpp");
    assert_eq!(outer.line, Some(6));
    assert_eq!(outer.location, "the global scope");
    assert_eq!(outer.source.as_deref(), Some("jmp Foo.bar"));

    let inner = report.innermost().unwrap();
    assert_eq!(inner.line, Some(4));
    assert_eq!(inner.location, "main.Foo.bar");
    assert_eq!(inner.source.as_deref(), Some("thw \"broken\""));
}

#[test]
fn fault_report_display() {
    let report = fault_report(run_source(FAULTING, Path::new("main.xpp"), &quiet()));
    let expected = "\
xpp | Instruction Fault
----------------------------------------
File 'main.xpp', line 6, in the global scope:
  > jmp Foo.bar
File 'main.xpp', line 4, in main.Foo.bar:
  > thw \"broken\"
Fault: broken";
    assert_eq!(report.to_string(), expected);
}

#[test]
fn fault_report_skips_method_bodies_for_main_lines() {
    let source = "\
prt 1
:func helper()
    prt 2
    prt 3
prt 4
thw \"late\"
";
    let report = fault_report(run_source(source, Path::new("main.xpp"), &quiet()));
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].line, Some(6));
    assert_eq!(report.entries[0].source.as_deref(), Some("thw \"late\""));
}

#[test]
fn fault_report_counts_continuations_as_one_line() {
    let source = "\
:func f(a b)
    prt a \\
        b
    thw \"after\"
jmp f 1 2
";
    let report = fault_report(run_source(source, Path::new("lib.xpp"), &quiet()));
    assert_eq!(report.entries[1].location, "lib._global.f");
    assert_eq!(report.entries[1].line, Some(4));
}

#[test]
fn fault_report_treats_colon_continuations_like_the_parser() {
    let source = "\
prt 1 \\
    :x
prt 2
thw \"boom\"
";
    let report = fault_report(run_source(source, Path::new("main.xpp"), &quiet()));
    assert_eq!(report.entries[0].line, Some(4));
    assert_eq!(report.entries[0].source.as_deref(), Some("thw \"boom\""));
}

#[test]
fn fault_report_from_disk() {
    let (_dir, path) = source_file(FAULTING);
    let report = fault_report(run_file(&path, &quiet()));
    assert_eq!(report.entries[0].file, path.display().to_string());
    assert_eq!(report.innermost().unwrap().line, Some(4));
}

#[test]
fn cached_program_reports_the_path_it_was_loaded_through() {
    let (dir, path) = source_file(FAULTING);
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let roundabout = sub.join("..").join("main.xpp");

    let first = fault_report(run_file(&roundabout, &quiet()));
    assert_eq!(first.entries[0].file, roundabout.display().to_string());
    fs::remove_dir(&sub).unwrap();

    let loaded = load_program(&path, &OperatorRegistry::with_stdlib(), &quiet()).unwrap();
    assert!(loaded.from_cache);
    assert!(loaded.program.classes.values().all(|class| class.file == path));

    let cached = run_file(&path, &quiet());
    let fresh = fault_report(run_file(&path, &quiet().without_cache()));
    let cached = fault_report(cached);
    assert_eq!(cached, fresh);
    assert_eq!(cached.entries[0].file, path.display().to_string());
    assert_eq!(cached.innermost().unwrap().line, Some(4));
}

#[test]
fn unreadable_source_degrades_to_unknown_line() {
    let registry = OperatorRegistry::with_stdlib();
    let program = compile_source(FAULTING, Path::new("gone.xpp"), &registry, &quiet()).unwrap();
    let mut interp = Interpreter::with_config(program.clone(), registry, quiet().interpreter());
    let fault = interp.run_main().unwrap_err();

    let report = FaultReport::new(&program, &fault, |_| None);
    assert_eq!(report.entries.len(), 2);
    assert!(report.entries.iter().all(|e| e.line.is_none() && e.source.is_none()));
    assert!(report
        .to_string()
        .contains("File 'gone.xpp', unknown line, in gone.Foo.bar:"));
}

#[test]
fn fault_report_serializes() {
    let report = fault_report(run_source(FAULTING, Path::new("main.xpp"), &quiet()));
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["message"], "broken");
    assert_eq!(value["entries"][1]["line"], 4);
    assert_eq!(value["entries"][0]["location"], "the global scope");
}
