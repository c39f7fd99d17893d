use std::collections::BTreeMap;

use glisp_core::{GlispError, Value};

use crate::register_fn;

pub fn register(env: &glisp_core::Env) {
    register_fn(env, "ref", 1, Some(1), |args| Ok(Value::reference(args[0].clone())));

    register_fn(env, "array", 0, None, |args| Ok(Value::array(args.to_vec())));

    // (dict '(k1 v1) '(k2 v2) ...); later pairs overwrite earlier keys
    register_fn(env, "dict", 0, None, |args| {
        let mut entries = BTreeMap::new();
        for item in args {
            let pair = match item.to_vec() {
                Ok(pair) if pair.len() == 2 => pair,
                _ => {
                    return Err(GlispError::eval(format!(
                        "dict - item is not a (key value) pair: {item}"
                    )))
                }
            };
            let key = match &pair[0] {
                Value::Symbol(s) => glisp_core::resolve(*s),
                Value::String(s) => s.to_string(),
                other => return Err(GlispError::wrong_type("dict", other)),
            };
            entries.insert(key, pair[1].clone());
        }
        Ok(Value::dict(entries))
    });
}
