//! Argument resolution: a typed token seen at dispatch time.
//!
//! Named references remember where they were read from so an operator can
//! write back to exactly that scope, or re-read it after a loop body ran.

use std::rc::Rc;

use xpp_types::ast::{Reference, Token};
use xpp_types::GLOBAL_CLASS;

use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Which store a named reference lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A class's static store. `_global`'s is the `@` scope.
    Static(String),
    /// The locals of the frame at this stack index.
    Local(usize),
}

/// A resolved variable location: store plus key, prefix stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub scope: Scope,
    pub key: String,
}

impl Binding {
    /// Resolve a raw name by its prefix: `@name` is global, `.name` is the
    /// current class, anything else is local to the current frame.
    pub fn resolve(interp: &Interpreter, raw: &str) -> EvalResult<Self> {
        if let Some(key) = raw.strip_prefix('@') {
            return Ok(Self {
                scope: Scope::Static(GLOBAL_CLASS.to_string()),
                key: key.to_string(),
            });
        }
        let frame = interp.current_frame().ok_or(EvalError::NoActiveFrame)?;
        if let Some(key) = raw.strip_prefix('.') {
            return Ok(Self {
                scope: Scope::Static(frame.class.clone()),
                key: key.to_string(),
            });
        }
        Ok(Self {
            scope: Scope::Local(interp.depth() - 1),
            key: raw.to_string(),
        })
    }
}

/// One operand as an operator sees it.
#[derive(Debug, Clone)]
pub struct Argument {
    token: Option<Token>,
    binding: Option<Binding>,
    /// `None` until first resolved; comparisons start out pending.
    value: Option<Value>,
}

impl Argument {
    /// Build an argument from a classified token.
    ///
    /// Groups are executed immediately. Blocks and operators become values
    /// without running anything. Comparisons are left pending until an
    /// operator asks for their value.
    pub fn from_token(interp: &mut Interpreter, token: &Token) -> EvalResult<Self> {
        let binding = match token {
            Token::Reference(Reference::Name(raw)) => Some(Binding::resolve(interp, raw)?),
            _ => None,
        };
        let mut arg = Self {
            token: Some(token.clone()),
            binding,
            value: None,
        };
        if !matches!(token, Token::Comparison { .. }) {
            arg.refresh(interp)?;
        }
        Ok(arg)
    }

    /// A transient argument holding `value`, with no token behind it.
    pub fn from_value(value: Value) -> Self {
        Self {
            token: None,
            binding: None,
            value: Some(value),
        }
    }

    /// The current value, evaluating a pending comparison once.
    pub fn resolve(&mut self, interp: &mut Interpreter) -> EvalResult<Value> {
        match &self.value {
            Some(value) => Ok(value.clone()),
            None => self.refresh(interp),
        }
    }

    /// Re-read the live value: named references read their store again,
    /// groups and comparisons are evaluated again.
    pub fn refresh(&mut self, interp: &mut Interpreter) -> EvalResult<Value> {
        let value = match (&self.token, &self.binding) {
            (Some(Token::Reference(Reference::Name(raw))), Some(binding)) => {
                match interp.read(binding) {
                    Some(value) => value.clone(),
                    None => interp
                        .operator(raw)
                        .map(|handle| Value::Operator(handle.clone()))
                        .unwrap_or(Value::Null),
                }
            }
            (Some(token), _) => evaluate(interp, token)?,
            (None, _) => self.value.clone().unwrap_or(Value::Null),
        };
        self.value = Some(value.clone());
        Ok(value)
    }

    /// Write `value` back to the variable this argument was read from.
    pub fn set(&mut self, interp: &mut Interpreter, value: Value) -> EvalResult<()> {
        let binding = self.binding.as_ref().ok_or_else(|| {
            EvalError::TypeMismatch(format!("cannot assign to {}", self.describe()))
        })?;
        interp.write(binding, value.clone())?;
        self.value = Some(value);
        Ok(())
    }

    /// Whether [`set`](Self::set) has a variable to write to.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The raw source name of a named reference or indexed call.
    pub fn name(&self) -> Option<&str> {
        match &self.token {
            Some(Token::Reference(Reference::Name(raw))) => Some(raw),
            Some(Token::IndexedCall { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// The raw text between the brackets of an indexed call.
    pub fn indexed_args(&self) -> Option<&str> {
        match &self.token {
            Some(Token::IndexedCall { args, .. }) => Some(args),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match (&self.token, &self.value) {
            (Some(Token::Literal(_)), Some(value)) => format!("literal {value}"),
            (Some(Token::Reference(Reference::Group(_))), _) => "a group result".to_string(),
            (Some(Token::Reference(Reference::Block(_))), _) => "a block".to_string(),
            (Some(Token::Operator(op)), _) => format!("operator '{}'", op.name),
            (Some(Token::Comparison { .. }), _) => "a comparison".to_string(),
            (Some(Token::IndexedCall { name, .. }), _) => format!("indexed call '{name}'"),
            _ => "a transient value".to_string(),
        }
    }
}

/// Evaluate a token that has no backing store.
fn evaluate(interp: &mut Interpreter, token: &Token) -> EvalResult<Value> {
    match token {
        Token::Literal(literal) => Ok(Value::from(literal)),
        Token::Operator(op) => interp
            .operator(&op.name)
            .map(|handle| Value::Operator(handle.clone()))
            .ok_or_else(|| EvalError::UnknownOperator(op.name.clone())),
        Token::Reference(Reference::Name(raw)) => {
            let binding = Binding::resolve(interp, raw)?;
            Ok(interp.read(&binding).cloned().unwrap_or(Value::Null))
        }
        Token::Reference(Reference::Group(line)) => interp.eval_group(line),
        Token::Reference(Reference::Block(line)) => Ok(Value::Block(Rc::new(line.clone()))),
        Token::Comparison { left, op, right } => interp.eval_comparison(left, *op, right),
        Token::IndexedCall { .. } => Ok(Value::Null),
    }
}
