use std::rc::Rc;

use glisp_core::{Ast, Closure, Env, GlispError, Value};

/// Trampoline for tail-call optimization.
pub enum Trampoline {
    Value(Value),
    Eval(Rc<Ast>, Env),
}

pub type EvalResult = Result<Value, GlispError>;

/// Evaluate kernel syntax. Tail positions (branches of a conditional, closure
/// bodies, the result of a mutual binding) continue in this loop instead of
/// growing the Rust stack.
pub fn eval(expr: &Ast, env: &Env) -> EvalResult {
    let mut step = eval_step(expr, env)?;
    loop {
        match step {
            Trampoline::Value(v) => return Ok(v),
            Trampoline::Eval(next_expr, next_env) => {
                step = eval_step(&next_expr, &next_env)?;
            }
        }
    }
}

fn eval_step(expr: &Ast, env: &Env) -> Result<Trampoline, GlispError> {
    match expr {
        Ast::Literal(v) | Ast::Quote(v) => Ok(Trampoline::Value(v.clone())),
        Ast::Identifier(name) => env.lookup(*name).map(Trampoline::Value),
        Ast::Conditional { test, then, else_ } => {
            let branch = if eval(test, env)?.is_true() { then } else { else_ };
            Ok(Trampoline::Eval(branch.clone(), env.clone()))
        }
        Ast::Application { operator, operands } => {
            let func = eval(operator, env)?;
            let args = operands
                .iter()
                .map(|operand| eval(operand, env))
                .collect::<Result<Vec<_>, _>>()?;
            apply(&func, &args)
        }
        Ast::MutualBinding { bindings, body } => {
            let frame = Closure::bind_group(env, bindings, None);
            Ok(Trampoline::Eval(body.clone(), frame))
        }
    }
}

fn apply(func: &Value, args: &[Value]) -> Result<Trampoline, GlispError> {
    match func {
        Value::Closure(closure) => {
            let frame = closure.bind_arguments(args)?;
            Ok(Trampoline::Eval(closure.body.clone(), frame))
        }
        other => other.invoke(args).map(Trampoline::Value),
    }
}
