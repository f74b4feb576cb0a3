//! Runtime error types for the xpp engine.

use thiserror::Error;

/// Faults raised while a program runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A method was called with the wrong number of arguments.
    #[error("{method} expects {expected} argument(s), got {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },

    /// Raised by operator code, passed through unchanged.
    #[error("{0}")]
    Operator(String),

    /// A line or body head that names no registered operator.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A call target that resolves to no method.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// Operand types an operator or comparator cannot combine.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Method calls nested deeper than the configured limit.
    #[error("call depth exceeded the limit of {0}")]
    CallDepthExceeded(usize),

    /// Frame-relative access with an empty call stack.
    #[error("no active frame")]
    NoActiveFrame,
}

/// Result alias for engine operations.
pub type EvalResult<T> = Result<T, EvalError>;
