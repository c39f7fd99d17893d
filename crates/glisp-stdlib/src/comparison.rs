use glisp_core::{Env, Value};

use crate::{expect_int, register_fn};

fn register_int_comparison(env: &Env, name: &'static str, cmp: fn(i64, i64) -> bool) {
    register_fn(env, name, 2, Some(2), move |args| {
        let a = expect_int(name, &args[0])?;
        let b = expect_int(name, &args[1])?;
        Ok(Value::Bool(cmp(a, b)))
    });
}

pub fn register(env: &Env) {
    register_fn(env, "=", 2, None, |args| {
        let first = &args[0];
        Ok(Value::Bool(args[1..].iter().all(|v| first.is_equal(v))))
    });

    register_int_comparison(env, "<", |a, b| a < b);
    register_int_comparison(env, "<=", |a, b| a <= b);
    register_int_comparison(env, ">", |a, b| a > b);
    register_int_comparison(env, ">=", |a, b| a >= b);

    register_fn(env, "not", 1, Some(1), |args| {
        Ok(Value::Bool(!args[0].is_true()))
    });
}
