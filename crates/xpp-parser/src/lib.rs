//! xpp parser: turns source text into a [`Program`](xpp_types::ast::Program).
//!
//! The structural parser tracks directives and indentation, the lexer splits
//! each line into words, and the classifier gives every word its role.

mod classify;
mod parser;
mod patterns;

pub use classify::{ClassifyError, Classifier, Context};
pub use parser::{parse_program, ParseResult, Parser, DEFAULT_INDENT_WIDTH};
pub use patterns::Directive;
