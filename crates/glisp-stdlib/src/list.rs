use glisp_core::{GlispError, Value};

use crate::{check_proper_list, expect_function, expect_int, expect_list, register_fn};

/// Element-wise calls of `f` across `lists`, stopping at the shortest one.
fn zip_apply(
    name: &str,
    f: &Value,
    lists: &[Value],
    mut each: impl FnMut(Value),
) -> Result<(), GlispError> {
    let columns = lists
        .iter()
        .map(|l| expect_list(name, l))
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
    for i in 0..shortest {
        let row: Vec<Value> = columns.iter().map(|col| col[i].clone()).collect();
        each(f.invoke(&row)?);
    }
    Ok(())
}

pub fn register(env: &glisp_core::Env) {
    register_fn(env, "cons", 2, Some(2), |args| {
        Ok(Value::cons(args[0].clone(), args[1].clone()))
    });

    register_fn(env, "list", 0, None, |args| Ok(Value::list(args.to_vec())));

    register_fn(env, "head", 1, Some(1), |args| {
        check_proper_list("head", &args[0])?;
        match args[0].as_cons() {
            Some((head, _)) => Ok(head.clone()),
            None => Err(GlispError::eval("head - empty list argument")),
        }
    });

    register_fn(env, "tail", 1, Some(1), |args| {
        check_proper_list("tail", &args[0])?;
        match args[0].as_cons() {
            Some((_, tail)) => Ok(tail.clone()),
            None => Err(GlispError::eval("tail - empty list argument")),
        }
    });

    register_fn(env, "length", 1, Some(1), |args| {
        let items = expect_list("length", &args[0])?;
        Ok(Value::Int(items.len() as i64))
    });

    // (nth list index), zero-based
    register_fn(env, "nth", 2, Some(2), |args| {
        let items = expect_list("nth", &args[0])?;
        let index = expect_int("nth", &args[1])?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or(GlispError::IndexOutOfBounds {
                index,
                len: items.len(),
            })
    });

    register_fn(env, "append", 0, None, |args| {
        let mut result = Vec::new();
        for arg in args {
            result.extend(expect_list("append", arg)?);
        }
        Ok(Value::list(result))
    });

    register_fn(env, "reverse", 1, Some(1), |args| {
        let items = expect_list("reverse", &args[0])?;
        Ok(items
            .into_iter()
            .fold(Value::Empty, |acc, item| Value::cons(item, acc)))
    });

    register_fn(env, "map", 2, None, |args| {
        let f = expect_function("map", &args[0])?;
        let mut results = Vec::new();
        zip_apply("map", f, &args[1..], |v| results.push(v))?;
        Ok(Value::list(results))
    });

    register_fn(env, "for", 2, None, |args| {
        let f = expect_function("for", &args[0])?;
        zip_apply("for", f, &args[1..], drop)?;
        Ok(Value::Nil)
    });

    register_fn(env, "filter", 2, Some(2), |args| {
        let f = expect_function("filter", &args[0])?;
        let mut kept = Vec::new();
        for item in expect_list("filter", &args[1])? {
            if f.invoke(std::slice::from_ref(&item))?.is_true() {
                kept.push(item);
            }
        }
        Ok(Value::list(kept))
    });

    // (foldr f list init): (f x1 (f x2 ... (f xn init)))
    register_fn(env, "foldr", 3, Some(3), |args| {
        let f = expect_function("foldr", &args[0])?;
        let items = expect_list("foldr", &args[1])?;
        let mut acc = args[2].clone();
        for item in items.into_iter().rev() {
            acc = f.invoke(&[item, acc])?;
        }
        Ok(acc)
    });

    // (foldl f list init): (f (f (f init x1) x2) ... xn)
    register_fn(env, "foldl", 3, Some(3), |args| {
        let f = expect_function("foldl", &args[0])?;
        let items = expect_list("foldl", &args[1])?;
        let mut acc = args[2].clone();
        for item in items {
            acc = f.invoke(&[acc, item])?;
        }
        Ok(acc)
    });

    register_fn(env, "apply", 2, Some(2), |args| {
        let f = expect_function("apply", &args[0])?;
        let arguments = expect_list("apply", &args[1])?;
        f.invoke(&arguments)
    });
}
