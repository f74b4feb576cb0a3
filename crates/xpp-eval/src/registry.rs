//! Operator registry: name → callable.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use xpp_types::OperatorNames;

use crate::argument::Argument;
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::stdlib;
use crate::value::Value;

/// Signature every operator implements.
///
/// Operands arrive as [`Argument`]s so an operator can write back to a
/// variable or leave a body unevaluated.
pub type OperatorFn = fn(&mut Interpreter, &mut [Argument]) -> EvalResult<Value>;

/// An operator bound to its name. Cheap to clone; compared by name.
#[derive(Clone)]
pub struct OperatorHandle {
    name: Rc<str>,
    func: OperatorFn,
}

impl OperatorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the operator with `args`.
    pub fn call(&self, interp: &mut Interpreter, args: &mut [Argument]) -> EvalResult<Value> {
        (self.func)(interp, args)
    }
}

impl fmt::Debug for OperatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OperatorHandle").field(&self.name).finish()
    }
}

impl PartialEq for OperatorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The set of operators a program may invoke.
///
/// Built explicitly once, before compiling: the classifier consults it by
/// name and the engine dispatches through it.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: BTreeMap<String, OperatorHandle>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every bundled operator.
    pub fn with_stdlib() -> Self {
        let mut registry = Self::new();
        stdlib::register_all(&mut registry);
        registry
    }

    /// Register `func` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: &str, func: OperatorFn) -> &mut Self {
        let handle = OperatorHandle {
            name: Rc::from(name),
            func,
        };
        self.operators.insert(name.to_string(), handle);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OperatorHandle> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl OperatorNames for OperatorRegistry {
    fn is_operator(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
