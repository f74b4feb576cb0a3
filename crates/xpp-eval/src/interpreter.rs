//! The execution engine: frame stack, line dispatch and method calls.

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;
use xpp_types::ast::{Comparator, Line, Program, Reference, Token};
use xpp_types::{GLOBAL_CLASS, MAIN_METHOD};

use crate::argument::{Argument, Binding, Scope};
use crate::env::{Frame, Store};
use crate::error::{EvalError, EvalResult};
use crate::expr::compare;
use crate::registry::{OperatorHandle, OperatorRegistry};
use crate::value::Value;

/// Method-call nesting allowed before a run is aborted.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub max_call_depth: usize,
    /// Print `prt` output to stdout as well as capturing it.
    pub echo_output: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            echo_output: true,
        }
    }
}

/// An uncaught runtime fault and the frames that were live when it was
/// raised, outermost first.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct Fault {
    pub error: EvalError,
    pub frames: Vec<Frame>,
}

/// Runs a compiled program.
pub struct Interpreter {
    program: Rc<Program>,
    registry: Rc<OperatorRegistry>,
    frames: Vec<Frame>,
    /// Class-static stores by class name.
    statics: BTreeMap<String, Store>,
    /// Everything `prt` has written.
    output: Vec<String>,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new(program: impl Into<Rc<Program>>, registry: impl Into<Rc<OperatorRegistry>>) -> Self {
        Self::with_config(program, registry, InterpreterConfig::default())
    }

    pub fn with_config(
        program: impl Into<Rc<Program>>,
        registry: impl Into<Rc<OperatorRegistry>>,
        config: InterpreterConfig,
    ) -> Self {
        Self {
            program: program.into(),
            registry: registry.into(),
            frames: Vec::new(),
            statics: BTreeMap::new(),
            output: Vec::new(),
            config,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry point
    // ══════════════════════════════════════════════════════════════════════

    /// Run `_global._main`.
    ///
    /// On a fault the frame stack is handed over as it stood when the fault
    /// was raised, for the fault reporter.
    pub fn run_main(&mut self) -> Result<Value, Fault> {
        self.frames.clear();
        self.execute_method(GLOBAL_CLASS, MAIN_METHOD, Vec::new())
            .map_err(|error| Fault {
                error,
                frames: std::mem::take(&mut self.frames),
            })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Methods
    // ══════════════════════════════════════════════════════════════════════

    /// Call `class.method` with positional `args` and return its return slot.
    ///
    /// Frames are popped only on success; a fault leaves the stack intact.
    #[tracing::instrument(level = "debug", skip(self, args), fields(args = args.len()))]
    pub fn execute_method(
        &mut self,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let program = Rc::clone(&self.program);
        let target = program
            .method(class, method)
            .ok_or_else(|| EvalError::UnknownMethod(format!("{class}.{method}")))?;

        if args.len() != target.params.len() {
            return Err(EvalError::Arity {
                method: format!("{class}.{method}"),
                expected: target.params.len(),
                found: args.len(),
            });
        }
        if self.frames.len() >= self.config.max_call_depth {
            return Err(EvalError::CallDepthExceeded(self.config.max_call_depth));
        }

        let mut frame = Frame::new(class, method);
        frame.bind_params(&target.params, args);
        self.frames.push(frame);

        for (index, line) in target.lines.iter().enumerate() {
            self.current_frame_mut()?.line_index = index;
            self.execute_line(line)?;
        }

        let frame = self.frames.pop().ok_or(EvalError::NoActiveFrame)?;
        tracing::debug!(returned = %frame.return_value, "method finished");
        Ok(frame.return_value)
    }

    /// Call a method by name.
    ///
    /// `Class.method` names the class; `.method` means the caller's class.
    /// A bare name is looked up in the caller's class, then in `_global`.
    pub fn call(&mut self, target: &str, args: Vec<Value>) -> EvalResult<Value> {
        let caller = self
            .current_frame()
            .map(|frame| frame.class.clone())
            .unwrap_or_else(|| GLOBAL_CLASS.to_string());

        let (class, method) = match target.split_once('.') {
            Some(("", method)) => (caller, method),
            Some((class, method)) => (class.to_string(), method),
            None => {
                let method = target.strip_prefix('@').unwrap_or(target);
                if method.len() == target.len() && self.program.method(&caller, method).is_some() {
                    (caller, method)
                } else {
                    (GLOBAL_CLASS.to_string(), method)
                }
            }
        };
        self.execute_method(&class, method, args)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Lines
    // ══════════════════════════════════════════════════════════════════════

    /// Invoke the line's leading operator with the remaining tokens.
    pub fn execute_line(&mut self, line: &Line) -> EvalResult<Value> {
        match line.head() {
            None => Ok(Value::Null),
            Some(Token::Operator(op)) => self.dispatch(&op.name, line.operands()),
            Some(other) => Err(EvalError::UnknownOperator(describe(other))),
        }
    }

    /// Run a deferred `{ ... }` body.
    ///
    /// Inside a body operator names are plain references, so a head naming
    /// a registered operator is invoked. A lone value is returned as is.
    pub fn execute_block(&mut self, line: &Line) -> EvalResult<Value> {
        match line.head() {
            None => Ok(Value::Null),
            Some(Token::Operator(op)) => self.dispatch(&op.name, line.operands()),
            Some(Token::Reference(Reference::Name(name))) if self.registry.contains(name) => {
                self.dispatch(name, line.operands())
            }
            Some(token) if line.len() == 1 => Argument::from_token(self, token)?.resolve(self),
            Some(token) => Err(EvalError::UnknownOperator(describe(token))),
        }
    }

    /// Evaluate a `( ... )` group: an operator call or a single value.
    pub fn eval_group(&mut self, line: &Line) -> EvalResult<Value> {
        match line.head() {
            Some(Token::Operator(_)) | None => self.execute_line(line),
            Some(token) if line.len() == 1 => Argument::from_token(self, token)?.resolve(self),
            Some(token) => Err(EvalError::UnknownOperator(describe(token))),
        }
    }

    /// Evaluate a comparison triple, operands first.
    pub fn eval_comparison(
        &mut self,
        left: &Token,
        op: Comparator,
        right: &Token,
    ) -> EvalResult<Value> {
        let left = Argument::from_token(self, left)?.resolve(self)?;
        let right = Argument::from_token(self, right)?.resolve(self)?;
        compare(op, &left, &right)
    }

    fn dispatch(&mut self, name: &str, operands: &[Token]) -> EvalResult<Value> {
        let handle = self
            .operator(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownOperator(name.to_string()))?;
        let mut args = operands
            .iter()
            .map(|token| Argument::from_token(self, token))
            .collect::<EvalResult<Vec<_>>>()?;
        tracing::trace!(operator = name, operands = args.len(), "dispatch");
        handle.call(self, &mut args)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Stores
    // ══════════════════════════════════════════════════════════════════════

    /// Read a variable. Absent variables are `None`, never an error.
    pub fn read(&self, binding: &Binding) -> Option<&Value> {
        match &binding.scope {
            Scope::Static(class) => self.statics.get(class)?.get(&binding.key),
            Scope::Local(index) => self.frames.get(*index)?.locals.get(&binding.key),
        }
    }

    pub fn write(&mut self, binding: &Binding, value: Value) -> EvalResult<()> {
        let store = match &binding.scope {
            Scope::Static(class) => self.statics.entry(class.clone()).or_default(),
            Scope::Local(index) => {
                &mut self
                    .frames
                    .get_mut(*index)
                    .ok_or(EvalError::NoActiveFrame)?
                    .locals
            }
        };
        store.insert(binding.key.clone(), value);
        Ok(())
    }

    /// A `@name` variable.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.static_var(GLOBAL_CLASS, name)
    }

    /// A class-static variable.
    pub fn static_var(&self, class: &str, name: &str) -> Option<&Value> {
        self.statics.get(class)?.get(name)
    }

    /// Set the current frame's return slot.
    pub fn set_return(&mut self, value: Value) -> EvalResult<()> {
        self.current_frame_mut()?.return_value = value;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Frames
    // ══════════════════════════════════════════════════════════════════════

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn current_frame_mut(&mut self) -> EvalResult<&mut Frame> {
        self.frames.last_mut().ok_or(EvalError::NoActiveFrame)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop frames left behind by a fault, back down to `depth`.
    pub fn unwind_to(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Environment
    // ══════════════════════════════════════════════════════════════════════

    pub fn operator(&self, name: &str) -> Option<&OperatorHandle> {
        self.registry.get(name)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Emit one line of program output.
    pub fn print(&mut self, text: String) {
        if self.config.echo_output {
            println!("{text}");
        }
        self.output.push(text);
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Reference(Reference::Name(name)) => name.clone(),
        Token::Operator(op) => op.name.clone(),
        Token::IndexedCall { name, .. } => format!("{name}[...]"),
        Token::Literal(_) => "a literal".to_string(),
        Token::Reference(Reference::Group(_)) => "a group".to_string(),
        Token::Reference(Reference::Block(_)) => "a block".to_string(),
        Token::Comparison { .. } => "a comparison".to_string(),
    }
}
