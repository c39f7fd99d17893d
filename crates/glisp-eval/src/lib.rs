mod desugar;
mod eval;

use std::rc::Rc;

use glisp_core::{
    suggest_similar, veteran_hint, Closure, Definition, DefinitionKind, Env, GlispError, Value,
};

pub use desugar::Desugarer;
pub use eval::{eval, EvalResult, Trampoline};

/// The interpreter holds the global environment and the desugaring session.
pub struct Interpreter {
    pub global_env: Rc<Env>,
    desugarer: Desugarer,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// Closures defined at top level capture the global frame that binds them.
impl Drop for Interpreter {
    fn drop(&mut self) {
        let bindings = std::mem::take(&mut *self.global_env.bindings.borrow_mut());
        drop(bindings);
    }
}

impl Interpreter {
    /// An interpreter with the primitive library loaded.
    pub fn new() -> Self {
        let interp = Self::bare();
        glisp_stdlib::register_stdlib(&interp.global_env);
        interp
    }

    /// An interpreter whose global frame holds only `true` and `false`.
    pub fn bare() -> Self {
        let env = Env::new();
        env.bind_str("true", Value::Bool(true));
        env.bind_str("false", Value::Bool(false));
        // Register the evaluator so primitives such as `map` can run closures.
        glisp_core::set_eval_callback(eval::eval);
        Interpreter {
            global_env: Rc::new(env),
            desugarer: Desugarer::new(),
        }
    }

    pub fn global_env(&self) -> &Rc<Env> {
        &self.global_env
    }

    /// Bind `name` in the global frame, replacing any previous binding.
    pub fn define(&self, name: &str, value: Value) {
        self.global_env.bind_str(name, value);
    }

    /// Evaluate one datum: a top-level `def` or an expression.
    ///
    /// A definition evaluates to the defined name as a symbol.
    pub fn eval_form(&self, form: &Value) -> EvalResult {
        tracing::trace!(%form, "eval form");
        if let Some(def) = self.desugarer.parse_def(form)? {
            return self.define_from(def).map_err(|e| self.with_unbound_hint(e));
        }
        let ast = self.desugarer.parse_expr(form)?;
        eval::eval(&ast, &self.global_env).map_err(|e| self.with_unbound_hint(e))
    }

    /// Read and evaluate every form in `input`, returning the last result
    /// (Nil when there are none).
    pub fn eval_str(&self, input: &str) -> EvalResult {
        let forms = glisp_reader::read_all(input)?;
        let mut result = Value::Nil;
        for form in &forms {
            result = self.eval_form(form)?;
        }
        Ok(result)
    }

    fn define_from(&self, def: Definition) -> EvalResult {
        let value = match def.kind {
            DefinitionKind::Value => eval::eval(&def.body, &self.global_env)?,
            DefinitionKind::Function => Value::Closure(Rc::new(Closure::new(
                def.name,
                def.params,
                def.body,
                (*self.global_env).clone(),
            ))),
        };
        glisp_core::with_resolved(def.name, |name| {
            tracing::debug!(name, kind = ?def.kind, "defined");
        });
        self.global_env.bind(def.name, value);
        Ok(Value::Symbol(def.name))
    }

    /// Attach a "did you mean" hint to an unbound identifier error.
    fn with_unbound_hint(&self, err: GlispError) -> GlispError {
        let hint = match &err {
            GlispError::Unbound(name) => veteran_hint(name).map(str::to_string).or_else(|| {
                suggest_similar(name, &self.global_env.names())
                    .map(|similar| format!("did you mean '{similar}'?"))
            }),
            _ => None,
        };
        match hint {
            Some(hint) => err.with_hint(hint),
            None => err,
        }
    }
}
