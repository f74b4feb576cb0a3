use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// All line/column values are 1-based for human-readable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Span covering the first `len` columns of a line.
    pub fn line(line: u32, len: usize) -> Self {
        let end = u32::try_from(len).unwrap_or(u32::MAX).max(1);
        Self::new(line, 1, line, end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Holds the source text for error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, usually the path as given.
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Executable lines
// ══════════════════════════════════════════════════════════════════════════════

/// One logical, executable source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableLine {
    /// 1-based number of the physical line the logical line starts on.
    pub number: u32,
    /// The line with surrounding whitespace removed.
    pub text: String,
    /// Whether the raw line starts with whitespace.
    pub indented: bool,
}

/// Returns `true` for blank lines and `::` comments, which are ignored
/// everywhere, even between continuation lines.
pub fn is_blank_or_comment(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("::")
}

/// Collect the executable lines of `source` in order.
///
/// Blank lines, comments and directives are skipped. A line whose text ends
/// in `\` swallows the following lines it continues, including ones that
/// start with `:`, so every entry corresponds to exactly one compiled line.
pub fn executable_lines(source: &str) -> Vec<ExecutableLine> {
    let mut lines = Vec::new();
    let mut continuing = false;
    for (index, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if is_blank_or_comment(trimmed) {
            continue;
        }
        if continuing {
            continuing = trimmed.ends_with('\\');
            continue;
        }
        if trimmed.starts_with(':') {
            continue;
        }
        continuing = trimmed.ends_with('\\');
        lines.push(ExecutableLine {
            number: u32::try_from(index + 1).unwrap_or(u32::MAX),
            text: trimmed.to_string(),
            indented: raw.starts_with([' ', '\t']),
        });
    }
    lines
}
