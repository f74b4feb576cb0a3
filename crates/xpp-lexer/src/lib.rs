//! xpp lexer: splits one logical source line into raw words.

pub mod lexer;

pub use lexer::{split_line, Delimiter, LexError, LexResult, Lexer};
