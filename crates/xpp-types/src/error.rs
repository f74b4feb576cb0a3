use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fault category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Raised while splitting a line into words.
    Lexical,
    /// Raised while tracking directives and indentation.
    Structure,
    /// Raised while assigning roles to words.
    Classification,
}

/// Numeric error code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical faults (E100–E199) ──
    pub const UNTERMINATED_DELIMITER: Self = Self(100);
    pub const UNBALANCED_NESTING: Self = Self(101);

    // ── Structure faults (E200–E299) ──
    pub const DUPLICATE_CLASS: Self = Self(200);
    pub const DUPLICATE_METHOD: Self = Self(201);
    pub const MISPLACED_CLASS: Self = Self(202);
    pub const MISPLACED_FUNC: Self = Self(203);
    pub const UNKNOWN_DIRECTIVE: Self = Self(204);
    pub const STATEMENT_OUTSIDE_METHOD: Self = Self(205);

    // ── Classification faults (E300–E399) ──
    pub const MISSING_OPERATOR: Self = Self(300);
    pub const INVALID_LITERAL: Self = Self(301);
    pub const UNKNOWN_OPERATOR: Self = Self(302);
    pub const MALFORMED_COMPARISON: Self = Self(303);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Structure,
            _ => ErrorCategory::Classification,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Structure => write!(f, "structure"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

/// A structured compile-time fault.
///
/// Every fault aborts compilation: no partial program is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxFault {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E302).
    pub code: ErrorCode,
    /// Fault category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, untrimmed.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SyntaxFault {
    /// Create a new fault.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for SyntaxFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for SyntaxFault {}
