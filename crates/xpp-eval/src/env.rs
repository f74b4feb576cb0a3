//! Variable stores and call-stack frames.

use std::collections::BTreeMap;

use crate::value::Value;

/// A named-variable store: frame locals or one class's statics.
pub type Store = BTreeMap<String, Value>;

/// One in-flight method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Owning class; `.name` references resolve against its statics.
    pub class: String,
    pub method: String,
    /// Index of the line currently executing in the method body.
    pub line_index: usize,
    /// Value of the last `ret` in this invocation.
    pub return_value: Value,
    /// Locals, owned by this invocation alone.
    pub locals: Store,
}

impl Frame {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            line_index: 0,
            return_value: Value::Null,
            locals: Store::new(),
        }
    }

    /// Bind `args` to `params` in order. Counts are checked by the caller.
    pub fn bind_params(&mut self, params: &[String], args: Vec<Value>) {
        for (name, value) in params.iter().zip(args) {
            self.locals.insert(name.clone(), value);
        }
    }
}
