use glisp_core::{Env, Value};

use crate::register_fn;

fn register_predicate(env: &Env, name: &str, pred: fn(&Value) -> bool) {
    register_fn(env, name, 1, Some(1), move |args| Ok(Value::Bool(pred(&args[0]))));
}

pub fn register(env: &Env) {
    register_fn(env, "type", 1, Some(1), |args| {
        Ok(Value::symbol(args[0].type_name()))
    });

    register_predicate(env, "empty?", Value::is_empty);
    register_predicate(env, "cons?", |v| v.as_cons().is_some());
    register_predicate(env, "list?", Value::is_list);
    register_predicate(env, "number?", |v| v.as_int().is_some());
    register_predicate(env, "ref?", |v| v.as_reference().is_some());
    register_predicate(env, "boolean?", |v| v.as_bool().is_some());
    register_predicate(env, "string?", |v| v.as_str().is_some());
    register_predicate(env, "symbol?", |v| v.as_symbol().is_some());
    register_predicate(env, "function?", Value::is_function);
    register_predicate(env, "nil?", Value::is_nil);
    register_predicate(env, "array?", |v| v.as_array().is_some());
    register_predicate(env, "dict?", |v| v.as_dict().is_some());
}
