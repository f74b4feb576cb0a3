//! Character-level scanner for one logical line.
//!
//! Rules:
//! - Words are separated by spaces or tabs outside any open delimiter
//! - `(` `)`, `{` `}`, `[` `]`, `"` `"` and `'` `'` open a delimited run that
//!   may contain separators; a repeated opening character nests
//! - `\` outside a delimiter makes the next character literal
//! - A word starting with `::` ends the line (inline comment)

use thiserror::Error;

/// The delimiter pairs that group text into a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Paren,
    Brace,
    Bracket,
    DoubleQuote,
    SingleQuote,
}

impl Delimiter {
    /// The delimiter opened by `ch`, if any.
    pub fn from_open(ch: char) -> Option<Self> {
        match ch {
            '(' => Some(Self::Paren),
            '{' => Some(Self::Brace),
            '[' => Some(Self::Bracket),
            '"' => Some(Self::DoubleQuote),
            '\'' => Some(Self::SingleQuote),
            _ => None,
        }
    }

    pub fn open(self) -> char {
        match self {
            Self::Paren => '(',
            Self::Brace => '{',
            Self::Bracket => '[',
            Self::DoubleQuote => '"',
            Self::SingleQuote => '\'',
        }
    }

    pub fn close(self) -> char {
        match self {
            Self::Paren => ')',
            Self::Brace => '}',
            Self::Bracket => ']',
            Self::DoubleQuote => '"',
            Self::SingleQuote => '\'',
        }
    }
}

/// Errors raised while splitting a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A delimiter was still open at end of line.
    #[error("expected a closing '{close}' for '{open}', found end of line")]
    UnterminatedDelimiter { open: char, close: char },

    /// Same-character nesting did not return to zero.
    #[error("unbalanced nesting: {depth} '{open}' group(s) left open at end of line")]
    UnbalancedNesting { open: char, depth: u32 },
}

/// Lexer result alias.
pub type LexResult<T> = Result<T, LexError>;

/// Single-pass word splitter.
pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    /// The delimiter currently open, if any.
    mode: Option<Delimiter>,
    /// Nesting depth of `mode`'s opening character.
    depth: u32,
    /// The word being built.
    buffer: String,
    words: Vec<String>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over one line. Surrounding whitespace is ignored.
    pub fn new(line: &'src str) -> Self {
        Self {
            chars: line.trim().chars().peekable(),
            mode: None,
            depth: 0,
            buffer: String::new(),
            words: Vec::new(),
        }
    }

    /// Split the line into raw words.
    pub fn tokenize(mut self) -> LexResult<Vec<String>> {
        while let Some(ch) = self.chars.next() {
            match self.mode {
                Some(delimiter) => self.scan_delimited(delimiter, ch),
                None => {
                    if self.scan_open(ch) {
                        break;
                    }
                }
            }
        }

        if let Some(delimiter) = self.mode {
            return Err(if self.depth > 1 {
                LexError::UnbalancedNesting {
                    open: delimiter.open(),
                    depth: self.depth,
                }
            } else {
                LexError::UnterminatedDelimiter {
                    open: delimiter.open(),
                    close: delimiter.close(),
                }
            });
        }

        self.end_word();
        Ok(self.words)
    }

    /// Handle a character inside a delimited run.
    fn scan_delimited(&mut self, delimiter: Delimiter, ch: char) {
        self.buffer.push(ch);
        // Close is tested first so quote pairs never nest.
        if ch == delimiter.close() {
            self.depth -= 1;
            if self.depth == 0 {
                self.mode = None;
            }
        } else if ch == delimiter.open() {
            self.depth += 1;
        }
    }

    /// Handle a character outside any delimiter.
    ///
    /// Returns `true` when the rest of the line is a comment.
    fn scan_open(&mut self, ch: char) -> bool {
        match ch {
            ' ' | '\t' => self.end_word(),
            '\\' => {
                if let Some(escaped) = self.chars.next() {
                    self.buffer.push(escaped);
                }
            }
            ':' if self.buffer.is_empty() && self.chars.peek() == Some(&':') => return true,
            _ => {
                if let Some(delimiter) = Delimiter::from_open(ch) {
                    self.mode = Some(delimiter);
                    self.depth = 1;
                }
                self.buffer.push(ch);
            }
        }
        false
    }

    fn end_word(&mut self) {
        if !self.buffer.is_empty() {
            self.words.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Split one line into raw words.
pub fn split_line(line: &str) -> LexResult<Vec<String>> {
    Lexer::new(line).tokenize()
}
