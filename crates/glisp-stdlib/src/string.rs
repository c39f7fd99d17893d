use std::rc::Rc;

use glisp_core::Value;

use crate::{expect_int, expect_str, register_fn};

pub fn register(env: &glisp_core::Env) {
    register_fn(env, "string-append", 0, None, |args| {
        let mut result = String::new();
        for arg in args {
            result.push_str(expect_str("string-append", arg)?);
        }
        Ok(Value::String(Rc::new(result)))
    });

    register_fn(env, "string-length", 1, Some(1), |args| {
        let s = expect_str("string-length", &args[0])?;
        Ok(Value::Int(s.chars().count() as i64))
    });

    register_fn(env, "string-lower", 1, Some(1), |args| {
        let s = expect_str("string-lower", &args[0])?;
        Ok(Value::String(Rc::new(s.to_lowercase())))
    });

    register_fn(env, "string-upper", 1, Some(1), |args| {
        let s = expect_str("string-upper", &args[0])?;
        Ok(Value::String(Rc::new(s.to_uppercase())))
    });

    // (string-substring s [start [end]]): character positions, clamped to the
    // string; an inverted range is the empty string.
    register_fn(env, "string-substring", 1, Some(3), |args| {
        let s = expect_str("string-substring", &args[0])?;
        let len = s.chars().count() as i64;
        let start = match args.get(1) {
            Some(v) => expect_int("string-substring", v)?.max(0),
            None => 0,
        };
        let end = match args.get(2) {
            Some(v) => expect_int("string-substring", v)?.min(len),
            None => len,
        };
        if end <= start {
            return Ok(Value::String(Rc::new(String::new())));
        }
        let picked: String = s
            .chars()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect();
        Ok(Value::String(Rc::new(picked)))
    });
}
