//! xpp compiler: orchestrates the full pipeline.
//!
//! ```text
//! source → Lexer → Structural Parser + Classifier → Program → Engine
//!                                                     │          │
//!                                               compile cache   FaultReport
//! ```

mod cache;
mod config;
mod error;
mod report;

use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Once;

use xpp_eval::{Interpreter, OperatorRegistry, Value};
use xpp_parser::Parser;
use xpp_types::ast::Program;
use xpp_types::SourceFile;

pub use cache::{registry_digest, CacheArtifact, ProgramCache, CACHE_DIR_NAME};
pub use config::{CacheConfig, CompilerConfig};
pub use error::{CompileError, CompileResult, RunError};
pub use report::{FaultReport, TraceEntry};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=xpp_compiler=debug`,
/// or `RUST_LOG=xpp_eval=trace` to see every operator dispatch.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// A compiled program and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub program: Program,
    pub from_cache: bool,
}

/// A program that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// `_main`'s return slot.
    pub value: Value,
    /// Everything `prt` wrote.
    pub output: Vec<String>,
    pub from_cache: bool,
}

/// Parse and classify `source`. `path` names the file in faults and in
/// each class's `file`.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn compile_source(
    source: &str,
    path: &Path,
    registry: &OperatorRegistry,
    config: &CompilerConfig,
) -> CompileResult<Program> {
    let source_file = SourceFile::new(path.display().to_string(), source);
    let program = Parser::new(&source_file, registry)
        .with_indent_width(config.indent_width)
        .parse()?;
    Ok(program)
}

/// Compile the file at `path`, reusing a valid cache artifact when caching
/// is enabled and refreshing it otherwise.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_program(
    path: &Path,
    registry: &OperatorRegistry,
    config: &CompilerConfig,
) -> CompileResult<Compiled> {
    let digest = registry_digest(registry.names());
    let cache = config
        .cache
        .enabled
        .then(|| ProgramCache::for_source(path, &config.cache));

    if let Some(mut program) = cache.as_ref().and_then(|c| c.load(path, &digest)) {
        tracing::debug!("using cached program");
        // The artifact may have been written through another spelling of
        // the same path.
        program.set_file(path.display().to_string());
        return Ok(Compiled {
            program,
            from_cache: true,
        });
    }

    let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let program = compile_source(&source, path, registry, config)?;

    if let Some(cache) = &cache {
        match cache.store(path, &digest, &program) {
            Ok(artifact) => tracing::debug!(artifact = %artifact.display(), "cached program"),
            Err(e) => tracing::warn!(error = %e, "could not write cache artifact"),
        }
    }
    Ok(Compiled {
        program,
        from_cache: false,
    })
}

/// Compile and run the file at `path` with the bundled operators.
pub fn run_file(path: &Path, config: &CompilerConfig) -> Result<RunOutcome, RunError> {
    let registry = Rc::new(OperatorRegistry::with_stdlib());
    let Compiled {
        program,
        from_cache,
    } = load_program(path, &registry, config)?;
    execute(program, registry, config, from_cache, |file| {
        fs::read_to_string(file).ok()
    })
}

/// Compile and run in-memory `source` as if it were the file at `path`.
/// Nothing is cached.
pub fn run_source(source: &str, path: &Path, config: &CompilerConfig) -> Result<RunOutcome, RunError> {
    let registry = Rc::new(OperatorRegistry::with_stdlib());
    let program = compile_source(source, path, &registry, config)?;
    execute(program, registry, config, false, |file| {
        (file == path).then(|| source.to_string())
    })
}

fn execute(
    program: Program,
    registry: Rc<OperatorRegistry>,
    config: &CompilerConfig,
    from_cache: bool,
    load: impl FnMut(&Path) -> Option<String>,
) -> Result<RunOutcome, RunError> {
    let program = Rc::new(program);
    let mut interp = Interpreter::with_config(Rc::clone(&program), registry, config.interpreter());
    match interp.run_main() {
        Ok(value) => Ok(RunOutcome {
            value,
            output: interp.output().to_vec(),
            from_cache,
        }),
        Err(fault) => {
            tracing::debug!(error = %fault.error, frames = fault.frames.len(), "uncaught fault");
            Err(RunError::Fault(FaultReport::new(&program, &fault, load)))
        }
    }
}
