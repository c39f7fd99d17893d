#![allow(dead_code)]

use glisp::{GlispError, Interpreter, Value};

/// Evaluate with a fresh interpreter, panicking on error.
pub fn eval(input: &str) -> Value {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval `{input}`: {e}"))
}

pub fn eval_to_string(input: &str) -> String {
    format!("{}", eval(input))
}

/// Evaluate with a fresh interpreter, expecting an error; hints are unwrapped.
pub fn eval_err(input: &str) -> GlispError {
    let interp = Interpreter::new();
    match interp.eval_str(input) {
        Ok(v) => panic!("expected error for `{input}`, got {v}"),
        Err(e) => e.inner().clone(),
    }
}

pub fn ints(ns: &[i64]) -> Value {
    Value::list(ns.iter().map(|n| Value::Int(*n)).collect())
}
