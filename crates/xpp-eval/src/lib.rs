//! xpp execution engine.
//!
//! Runs a compiled [`Program`](xpp_types::ast::Program) against an explicit
//! frame stack. Operators come from an [`OperatorRegistry`] built once up
//! front; control-flow operators receive their bodies unevaluated and decide
//! when to run them.

mod argument;
mod env;
mod error;
mod expr;
mod interpreter;
mod registry;
pub mod stdlib;
mod value;

pub use argument::{Argument, Binding, Scope};
pub use env::{Frame, Store};
pub use error::{EvalError, EvalResult};
pub use expr::compare;
pub use interpreter::{Fault, Interpreter, InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
pub use registry::{OperatorFn, OperatorHandle, OperatorRegistry};
pub use value::Value;
