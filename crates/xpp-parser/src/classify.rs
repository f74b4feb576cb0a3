//! Token classifier: raw words → typed tokens.
//!
//! Classification is context-sensitive. The same word can be an invocable
//! operator at the head of a line and plain data inside a `{...}` body, so
//! the context is threaded explicitly through the recursion.

use thiserror::Error;
use xpp_lexer::{split_line, LexError};
use xpp_types::ast::{Comparator, Line, Literal, OperatorRef, Reference, Token};
use xpp_types::{ErrorCode, OperatorNames};

use crate::patterns::{indexed_call, is_float, is_integer};

/// Where the words being classified sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// A source line: the head must be a registered operator.
    TopLevel,
    /// The inside of `( ... )`: the head may be an operator.
    NestedOperator,
    /// The inside of `{ ... }`: operator names stay plain references.
    NestedReference,
}

/// Errors raised while classifying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// A nested group failed to lex.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A line or group does not start with an operator.
    #[error("expected an operator, found '{0}'")]
    MissingOperator(String),

    /// The head names no registered operator.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A word looks like a literal but is not a valid one.
    #[error("invalid literal '{word}': {reason}")]
    InvalidLiteral { word: String, reason: &'static str },

    /// A three-word group whose middle word is not a comparator.
    #[error("unknown comparison operator '{op}' in '({text})'")]
    MalformedComparison { op: String, text: String },
}

impl ClassifyError {
    /// The syntax fault code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lex(LexError::UnterminatedDelimiter { .. }) => ErrorCode::UNTERMINATED_DELIMITER,
            Self::Lex(LexError::UnbalancedNesting { .. }) => ErrorCode::UNBALANCED_NESTING,
            Self::MissingOperator(_) => ErrorCode::MISSING_OPERATOR,
            Self::UnknownOperator(_) => ErrorCode::UNKNOWN_OPERATOR,
            Self::InvalidLiteral { .. } => ErrorCode::INVALID_LITERAL,
            Self::MalformedComparison { .. } => ErrorCode::MALFORMED_COMPARISON,
        }
    }
}

type ClassifyResult<T> = Result<T, ClassifyError>;

/// Assigns roles to raw words, consulting the operator registry by name.
pub struct Classifier<'a> {
    operators: &'a dyn OperatorNames,
}

impl<'a> Classifier<'a> {
    pub fn new(operators: &'a dyn OperatorNames) -> Self {
        Self { operators }
    }

    /// Classify the words of one source line.
    pub fn classify_line(&self, words: &[String]) -> ClassifyResult<Line> {
        let line = self.classify_words(words, Context::TopLevel)?;
        match line.head() {
            Some(Token::Operator(_)) => Ok(line),
            Some(Token::Reference(Reference::Name(name))) => {
                Err(ClassifyError::UnknownOperator(name.clone()))
            }
            _ => Err(ClassifyError::MissingOperator(
                words.first().cloned().unwrap_or_default(),
            )),
        }
    }

    fn classify_words(&self, words: &[String], context: Context) -> ClassifyResult<Line> {
        let tokens = words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                let head = index == 0 && context != Context::NestedReference;
                self.classify_word(word, head)
            })
            .collect::<ClassifyResult<Vec<_>>>()?;
        Ok(Line::new(tokens))
    }

    /// Classify one word. Only a `head` word may become an operator; any
    /// other name stays a reference and falls back to the operator handle
    /// when it is resolved unbound.
    fn classify_word(&self, word: &str, head: bool) -> ClassifyResult<Token> {
        if is_integer(word) {
            return word
                .parse()
                .map(|n| Token::Literal(Literal::Int(n)))
                .map_err(|_| invalid(word, "integer out of range"));
        }

        if let Some(quote) = word.chars().next().filter(|c| matches!(c, '"' | '\'')) {
            return unwrap(word, quote, quote)
                .map(|s| Token::Literal(Literal::Str(s.to_string())))
                .ok_or_else(|| invalid(word, "text after closing quote"));
        }

        if is_float(word) {
            return word
                .parse()
                .map(|f| Token::Literal(Literal::Float(f)))
                .map_err(|_| invalid(word, "malformed float"));
        }

        match word {
            "true" => return Ok(Token::Literal(Literal::Bool(true))),
            "false" => return Ok(Token::Literal(Literal::Bool(false))),
            "none" => return Ok(Token::Literal(Literal::None)),
            _ => {}
        }

        if let Some((name, args)) = indexed_call(word) {
            return Ok(Token::IndexedCall {
                name: name.to_string(),
                args: args.to_string(),
            });
        }

        if word.starts_with('{') {
            let interior = unwrap(word, '{', '}').ok_or_else(|| invalid(word, "text after '}'"))?;
            let line = self.classify_words(&split_line(interior)?, Context::NestedReference)?;
            return Ok(Token::Reference(Reference::Block(line)));
        }

        if word.starts_with('(') {
            let interior = unwrap(word, '(', ')').ok_or_else(|| invalid(word, "text after ')'"))?;
            return self.classify_group(interior);
        }

        if head && self.operators.is_operator(word) {
            return Ok(Token::Operator(OperatorRef::new(word)));
        }
        Ok(Token::Reference(Reference::Name(word.to_string())))
    }

    /// Classify the inside of `( ... )`.
    ///
    /// Three value-like words around a name form a comparison; a group
    /// headed by an operator is a nested call; a lone value is passed
    /// through. Anything else cannot be evaluated.
    fn classify_group(&self, interior: &str) -> ClassifyResult<Token> {
        let words = split_line(interior)?;
        let line = self.classify_words(&words, Context::NestedOperator)?;

        if let [left, Token::Reference(Reference::Name(op)), right] = line.tokens.as_slice() {
            if left.is_value_like() && right.is_value_like() {
                let op = Comparator::from_symbol(op).ok_or_else(|| {
                    ClassifyError::MalformedComparison {
                        op: op.clone(),
                        text: interior.to_string(),
                    }
                })?;
                return Ok(Token::Comparison {
                    left: Box::new(left.clone()),
                    op,
                    right: Box::new(right.clone()),
                });
            }
        }

        match line.head() {
            Some(Token::Operator(_)) => Ok(Token::Reference(Reference::Group(line))),
            Some(_) if line.len() == 1 => Ok(Token::Reference(Reference::Group(line))),
            Some(Token::Reference(Reference::Name(name))) => {
                Err(ClassifyError::UnknownOperator(name.clone()))
            }
            _ => Err(ClassifyError::MissingOperator(format!("({interior})"))),
        }
    }
}

/// Strip a matching `open`/`close` pair from both ends of `word`.
fn unwrap(word: &str, open: char, close: char) -> Option<&str> {
    let inner = word.strip_prefix(open)?;
    inner.strip_suffix(close)
}

fn invalid(word: &str, reason: &'static str) -> ClassifyError {
    ClassifyError::InvalidLiteral {
        word: word.to_string(),
        reason,
    }
}
