mod arithmetic;
mod collections;
mod comparison;
mod list;
mod predicates;
mod string;

use glisp_core::{Env, GlispError, Primitive, Value};

/// Bind every primitive procedure into `env`.
pub fn register_stdlib(env: &Env) {
    let before = env.bindings.borrow().len();
    arithmetic::register(env);
    comparison::register(env);
    string::register(env);
    list::register(env);
    predicates::register(env);
    collections::register(env);
    let count = env.bindings.borrow().len() - before;
    tracing::debug!(count, "registered primitive library");
}

/// Bind a primitive. Arity is checked by the primitive itself before `f` runs,
/// so `f` may index `args` up to `min_arity` freely.
pub fn register_fn(
    env: &Env,
    name: &str,
    min_arity: usize,
    max_arity: Option<usize>,
    f: impl Fn(&[Value]) -> Result<Value, GlispError> + 'static,
) {
    env.bind(
        glisp_core::intern(name),
        Value::primitive(Primitive::new(name, min_arity, max_arity, f)),
    );
}

pub(crate) fn expect_int(name: &str, v: &Value) -> Result<i64, GlispError> {
    v.as_int().ok_or_else(|| GlispError::wrong_type(name, v))
}

pub(crate) fn expect_str<'a>(name: &str, v: &'a Value) -> Result<&'a str, GlispError> {
    v.as_str().ok_or_else(|| GlispError::wrong_type(name, v))
}

pub(crate) fn expect_function<'a>(name: &str, v: &'a Value) -> Result<&'a Value, GlispError> {
    if v.is_function() {
        Ok(v)
    } else {
        Err(GlispError::wrong_type(name, v))
    }
}

/// Elements of a proper list. Non-lists are a type error; a chain that
/// does not end in `()` is a malformed list.
pub(crate) fn expect_list(name: &str, v: &Value) -> Result<Vec<Value>, GlispError> {
    if !v.is_list() {
        return Err(GlispError::wrong_type(name, v));
    }
    v.to_vec()
        .map_err(|_| GlispError::malformed_list(format!("{name} - {v}")))
}

/// Like [`expect_list`] without collecting the elements.
pub(crate) fn check_proper_list(name: &str, v: &Value) -> Result<(), GlispError> {
    if !v.is_list() {
        return Err(GlispError::wrong_type(name, v));
    }
    let mut current = v;
    loop {
        match current {
            Value::Cons(cell) => current = &cell.tail,
            Value::Empty => return Ok(()),
            _ => return Err(GlispError::malformed_list(format!("{name} - {v}"))),
        }
    }
}
