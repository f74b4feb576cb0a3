//! Shared types for the xpp interpreter.
//!
//! This crate defines the compiled program tree, source spans, the
//! compile-time fault type, and the executable-line rule shared by the
//! structural parser and the fault reporter.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, SyntaxFault};
pub use span::{executable_lines, is_blank_or_comment, ExecutableLine, SourceFile, Span};

/// Result type used by every compile-time stage.
pub type Result<T> = std::result::Result<T, SyntaxFault>;

/// Name of the class that holds top-level code and `@` variables.
pub const GLOBAL_CLASS: &str = "_global";

/// Name of the method that holds top-level code.
pub const MAIN_METHOD: &str = "_main";

/// Read-only view of the operator registry used during classification.
///
/// The classifier only needs to know which words name operators; the
/// callables themselves live in the engine.
pub trait OperatorNames {
    /// Returns `true` if `name` is a registered operator.
    fn is_operator(&self, name: &str) -> bool;
}

impl OperatorNames for [&str] {
    fn is_operator(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

impl<const N: usize> OperatorNames for [&str; N] {
    fn is_operator(&self, name: &str) -> bool {
        self.contains(&name)
    }
}
