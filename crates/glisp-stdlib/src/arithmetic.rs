use glisp_core::Value;

use crate::{expect_int, register_fn};

pub fn register(env: &glisp_core::Env) {
    register_fn(env, "+", 0, None, |args| {
        let mut sum: i64 = 0;
        for arg in args {
            sum = sum.wrapping_add(expect_int("+", arg)?);
        }
        Ok(Value::Int(sum))
    });

    register_fn(env, "*", 0, None, |args| {
        let mut product: i64 = 1;
        for arg in args {
            product = product.wrapping_mul(expect_int("*", arg)?);
        }
        Ok(Value::Int(product))
    });

    register_fn(env, "-", 1, None, |args| {
        let first = expect_int("-", &args[0])?;
        if args.len() == 1 {
            return Ok(Value::Int(first.wrapping_neg()));
        }
        let mut result = first;
        for arg in &args[1..] {
            result = result.wrapping_sub(expect_int("-", arg)?);
        }
        Ok(Value::Int(result))
    });
}
