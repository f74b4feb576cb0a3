//! The compiled program tree.
//!
//! A [`Program`] is produced once by the structural parser and then only
//! read by the engine. Every node is serialisable so a compiled program can
//! be cached on disk. Maps are [`BTreeMap`]s so serialised output is stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::{GLOBAL_CLASS, MAIN_METHOD};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A compiled program: class name → class.
///
/// Always contains `_global` with a `_main` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub classes: BTreeMap<String, Class>,
}

impl Program {
    /// Create a program holding only an empty `_global._main`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let mut global = Class::new(GLOBAL_CLASS, file);
        global
            .methods
            .insert(MAIN_METHOD.to_string(), Method::new(MAIN_METHOD, Vec::new(), 0));
        let mut classes = BTreeMap::new();
        classes.insert(GLOBAL_CLASS.to_string(), global);
        Self { classes }
    }

    /// Look up a class by name.
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    /// Look up a method by class and method name.
    pub fn method(&self, class: &str, method: &str) -> Option<&Method> {
        self.classes.get(class)?.methods.get(method)
    }

    /// The entry point, `_global._main`.
    pub fn main(&self) -> Option<&Method> {
        self.method(GLOBAL_CLASS, MAIN_METHOD)
    }

    /// Point every class at `file`.
    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        let file = file.into();
        for class in self.classes.values_mut() {
            class.file = file.clone();
        }
    }
}

/// `:class NAME` and everything declared under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub methods: BTreeMap<String, Method>,
    /// The file the class was declared in.
    pub file: PathBuf,
}

impl Class {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
            file: file.into(),
        }
    }
}

/// `:func NAME(params)` and its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    pub lines: Vec<Line>,
    /// Number of executable source lines preceding the first body line.
    pub offset: usize,
}

impl Method {
    pub fn new(name: impl Into<String>, params: Vec<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            params,
            lines: Vec::new(),
            offset,
        }
    }

    /// Whether this is the `_main` method of a file.
    pub fn is_main(&self) -> bool {
        self.name == MAIN_METHOD
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Lines & Tokens
// ══════════════════════════════════════════════════════════════════════════════

/// An ordered sequence of classified tokens.
///
/// Token 0 of an executable line is always an [`Token::Operator`]. Inside a
/// deferred body it may instead be a [`Reference::Name`] naming an operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub tokens: Vec<Token>,
}

impl Line {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// The first token, if any.
    pub fn head(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// Every token after the head.
    pub fn operands(&self) -> &[Token] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// A classified word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    /// A constant value written in the source.
    Literal(Literal),
    /// A variable name or a nested group.
    Reference(Reference),
    /// A registered operator, by name.
    Operator(OperatorRef),
    /// `(left op right)`.
    Comparison {
        left: Box<Token>,
        op: Comparator,
        right: Box<Token>,
    },
    /// `name[args]`, kept verbatim for operators that understand it.
    IndexedCall { name: String, args: String },
}

impl Token {
    /// Literals, references and comparisons can stand in a comparison operand.
    pub fn is_value_like(&self) -> bool {
        matches!(
            self,
            Token::Literal(_) | Token::Reference(_) | Token::Comparison { .. }
        )
    }

    /// The bare name of a [`Reference::Name`] token.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Token::Reference(Reference::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Constant values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

/// What a [`Token::Reference`] points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    /// A variable, possibly scoped with `@` or `.`.
    Name(String),
    /// `( ... )`: evaluated as soon as it is passed.
    Group(Line),
    /// `{ ... }`: a deferred body, passed around unevaluated.
    Block(Line),
}

/// Stable handle to a registry operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorRef {
    pub name: String,
}

impl OperatorRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Comparators allowed in the middle of a comparison triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Or,
    And,
}

impl Comparator {
    /// Every comparator, in the order they are matched.
    pub const ALL: [Comparator; 8] = [
        Comparator::Eq,
        Comparator::Ge,
        Comparator::Le,
        Comparator::Ne,
        Comparator::Or,
        Comparator::And,
        Comparator::Gt,
        Comparator::Lt,
    ];

    /// Parse a comparator from its source spelling.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.symbol() == symbol)
    }

    /// The source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Or => "||",
            Comparator::And => "&&",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
