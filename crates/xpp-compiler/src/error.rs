//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;
use xpp_types::SyntaxFault;

use crate::report::FaultReport;

/// Errors that stop a program from being compiled.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxFault),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors from compiling and running a program.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// An uncaught runtime fault, mapped back to source lines.
    #[error("{0}")]
    Fault(FaultReport),
}
