//! glisp: a small Lisp with a tail-calling evaluator.
//!
//! This module provides the embedding API for the glisp interpreter.
//!
//! # Quick Start
//!
//! ```no_run
//! use glisp::{Interpreter, InterpreterBuilder, Value};
//!
//! let interp = InterpreterBuilder::new().build();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(result, Value::Int(3));
//! ```

use std::rc::Rc;

// Re-export core types.
pub use glisp_core::{intern, resolve, with_resolved, Env, GlispError, Value};

/// Result of evaluating a glisp expression.
pub type EvalResult = Result<Value>;

pub type Result<T> = std::result::Result<T, GlispError>;

/// Builder for configuring and constructing an [`Interpreter`].
///
/// By default the primitive library is enabled.
pub struct InterpreterBuilder {
    stdlib: bool,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self { stdlib: true }
    }

    /// Enable or disable the primitive library (default: `true`).
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    /// Disable the primitive library; only `true` and `false` stay bound.
    pub fn without_stdlib(self) -> Self {
        self.with_stdlib(false)
    }

    pub fn build(self) -> Interpreter {
        let inner = if self.stdlib {
            glisp_eval::Interpreter::new()
        } else {
            glisp_eval::Interpreter::bare()
        };
        Interpreter { inner }
    }
}

/// A glisp interpreter instance.
///
/// Use [`InterpreterBuilder`] for fine-grained control, or call
/// [`Interpreter::new`] for a default interpreter with the primitive library.
pub struct Interpreter {
    inner: glisp_eval::Interpreter,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate a single datum. Definitions (`def`) persist across calls.
    pub fn eval(&self, form: &Value) -> EvalResult {
        self.inner.eval_form(form)
    }

    /// Read and evaluate a string containing one or more glisp forms.
    ///
    /// Definitions persist across calls, so you can define a function in one
    /// call and use it in the next.
    pub fn eval_str(&self, input: &str) -> EvalResult {
        self.inner.eval_str(input)
    }

    /// Bind a host value in the global frame.
    pub fn define(&self, name: &str, value: Value) {
        self.inner.define(name, value);
    }

    /// Register a host function callable from glisp code.
    ///
    /// The call fails with an arity error before `f` runs unless it receives
    /// between `min_arity` and `max_arity` (unbounded when `None`) arguments.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use glisp::{GlispError, Interpreter, Value};
    ///
    /// let interp = Interpreter::new();
    /// interp.register_fn("square", 1, Some(1), |args: &[Value]| match &args[0] {
    ///     Value::Int(n) => Ok(Value::Int(n * n)),
    ///     other => Err(GlispError::wrong_type("square", other)),
    /// });
    /// ```
    pub fn register_fn<F>(&self, name: &str, min_arity: usize, max_arity: Option<usize>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        glisp_stdlib::register_fn(&self.inner.global_env, name, min_arity, max_arity, f);
    }

    /// Return a reference to the global environment.
    pub fn global_env(&self) -> &Rc<Env> {
        self.inner.global_env()
    }
}
