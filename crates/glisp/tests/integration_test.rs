mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{eval, eval_err, eval_to_string, ints};
use glisp::{GlispError, Interpreter, InterpreterBuilder, Value};

#[test]
fn test_arithmetic() {
    assert_eq!(eval("(+ 1 2)"), Value::Int(3));
    assert_eq!(eval("(- 10 3)"), Value::Int(7));
    assert_eq!(eval("(- 4)"), Value::Int(-4));
    assert_eq!(eval("(* 4 5)"), Value::Int(20));
    assert_eq!(eval("(+)"), Value::Int(0));
}

#[test]
fn test_comparison() {
    assert_eq!(eval("(< 1 2)"), Value::Bool(true));
    assert_eq!(eval("(> 3 2)"), Value::Bool(true));
    assert_eq!(eval("(<= 2 2)"), Value::Bool(true));
    assert_eq!(eval("(>= 1 2)"), Value::Bool(false));
    assert_eq!(eval("(not #f)"), Value::Bool(true));
}

#[test]
fn test_if_with_strings() {
    assert_eq!(eval("(if (> 3 2) \"yes\" \"no\")"), Value::string("yes"));
    assert_eq!(eval_to_string("(if (< 3 2) \"yes\" \"no\")"), "\"no\"");
}

#[test]
fn test_anonymous_function_application() {
    assert_eq!(eval("((fn (x y) (+ x y)) 3 4)"), Value::Int(7));
    assert_eq!(eval("((fn () 9))"), Value::Int(9));
}

#[test]
fn test_named_recursive_function() {
    assert_eq!(
        eval("((fn fact (n) (if (= n 0) 1 (* n (fact (- n 1))))) 5)"),
        Value::Int(120)
    );
}

#[test]
fn test_let_uses_outer_scope_for_initializers() {
    assert!(matches!(
        eval_err("(let ((x 1) (y x)) y)"),
        GlispError::Unbound(name) if name == "x"
    ));
    assert_eq!(eval("(let ((x 5)) (let ((x 1) (y x)) y))"), Value::Int(5));
}

#[test]
fn test_let_star_is_sequential() {
    assert_eq!(eval("(let* ((x 1) (y x)) y)"), Value::Int(1));
    assert_eq!(eval("(let* ((x 1) (y (+ x 1)) (z (* y 10))) z)"), Value::Int(20));
}

#[test]
fn test_letrec_mutual_recursion() {
    let program = |call: &str| {
        format!(
            "(letrec ((even? (n) (if (= n 0) #t (odd? (- n 1)))) \
                      (odd? (n) (if (= n 0) #f (even? (- n 1))))) \
               {call})"
        )
    };
    assert_eq!(eval(&program("(even? 10)")), Value::Bool(true));
    assert_eq!(eval(&program("(odd? 7)")), Value::Bool(true));
    assert_eq!(eval(&program("(even? 7)")), Value::Bool(false));
    assert_eq!(eval(&program("(odd? 0)")), Value::Bool(false));
}

#[test]
fn test_million_tail_calls() {
    assert_eq!(
        eval("(letrec ((count (n) (if (= n 0) 'done (count (- n 1))))) (count 1000000))"),
        Value::symbol("done")
    );
}

#[test]
fn test_tail_call_through_definition() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def (loop n acc) (if (= n 0) acc (loop (- n 1) (+ acc 1))))")
        .unwrap();
    assert_eq!(interp.eval_str("(loop 200000 0)").unwrap(), Value::Int(200_000));
}

#[test]
fn test_do_sequences_effects() {
    assert_eq!(eval("(do)"), Value::Nil);
    assert_eq!(eval("(let ((r (ref 0))) (do (r 5) (r (+ (r) 1)) (r)))"), Value::Int(6));
}

#[test]
fn test_equality() {
    assert_eq!(eval("(= (list 1 2 3) (list 1 2 3))"), Value::Bool(true));
    assert_eq!(eval("(= (array 1 2 3) (array 1 2 3))"), Value::Bool(false));
    assert_eq!(eval("(let ((a (array 1))) (= a a))"), Value::Bool(true));
    assert_eq!(eval("(= '() (list))"), Value::Bool(true));
    assert_eq!(eval("(= \"ab\" (string-append \"a\" \"b\"))"), Value::Bool(true));
    assert_eq!(eval("(= 'a 'a 'b)"), Value::Bool(false));
}

#[test]
fn test_closure_arity() {
    assert!(matches!(
        eval_err("((fn (x y) x) 1)"),
        GlispError::Arity { got: 1, .. }
    ));
    assert!(matches!(
        eval_err("((fn (x y) x) 1 2 3)"),
        GlispError::Arity { got: 3, .. }
    ));
    let interp = Interpreter::new();
    interp.eval_str("(def (f x y) x)").unwrap();
    let err = interp.eval_str("(f 1)").unwrap_err();
    assert_eq!(err.to_string(), "Arity error: f expects 2 args, got 1");
}

#[test]
fn test_host_primitive_arity_checked_before_body() {
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    let interp = Interpreter::new();
    interp.register_fn("bounded", 1, Some(3), move |args| {
        seen.set(seen.get() + 1);
        Ok(Value::Int(args.len() as i64))
    });
    assert!(matches!(
        interp.eval_str("(bounded)").unwrap_err(),
        GlispError::Arity { .. }
    ));
    assert!(matches!(
        interp.eval_str("(bounded 1 2 3 4)").unwrap_err(),
        GlispError::Arity { .. }
    ));
    assert_eq!(calls.get(), 0);
    assert_eq!(interp.eval_str("(bounded 1 2)").unwrap(), Value::Int(2));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_improper_lists_are_malformed() {
    for program in [
        "(length (cons 1 2))",
        "(map (fn (x) x) (cons 1 2))",
        "(head (cons 1 2))",
    ] {
        assert!(
            matches!(eval_err(program), GlispError::MalformedList(_)),
            "expected malformed list from {program}"
        );
    }
    assert_eq!(eval_to_string("(cons 1 2)"), "(1 . 2)");
}

#[test]
fn test_list_operations() {
    assert_eq!(eval("(list 1 2 3)"), ints(&[1, 2, 3]));
    assert_eq!(eval("(cons 0 '(1))"), ints(&[0, 1]));
    assert_eq!(eval("(head '(7 8))"), Value::Int(7));
    assert_eq!(eval("(tail '(7 8))"), ints(&[8]));
    assert_eq!(eval("(nth '(7 8 9) 1)"), Value::Int(8));
    assert_eq!(eval("(append '(1) '(2 3))"), ints(&[1, 2, 3]));
    assert_eq!(eval("(reverse '(1 2 3))"), ints(&[3, 2, 1]));
    assert_eq!(eval("(length '())"), Value::Int(0));
}

#[test]
fn test_higher_order_primitives_with_closures() {
    assert_eq!(eval("(map (fn (x) (* x x)) '(1 2 3))"), ints(&[1, 4, 9]));
    assert_eq!(eval("(map + '(1 2) '(10 20 30))"), ints(&[11, 22]));
    assert_eq!(eval("(filter (fn (x) (> x 1)) '(1 2 3))"), ints(&[2, 3]));
    assert_eq!(
        eval("(foldl (fn (acc x) (cons x acc)) '(1 2 3) '())"),
        ints(&[3, 2, 1])
    );
    assert_eq!(eval("(foldr cons '(1 2 3) '())"), ints(&[1, 2, 3]));
    assert_eq!(eval("(apply (fn (a b) (- a b)) '(10 4))"), Value::Int(6));
    assert_eq!(
        eval("(let ((total (ref 0))) (do (for (fn (x) (total (+ (total) x))) '(1 2 3)) (total)))"),
        Value::Int(6)
    );
}

#[test]
fn test_closures_capture_definitions() {
    assert_eq!(
        eval("(let ((n 10)) (map (fn (x) (+ x n)) '(1 2)))"),
        ints(&[11, 12])
    );
}

#[test]
fn test_strings() {
    assert_eq!(eval("(string-length \"hello\")"), Value::Int(5));
    assert_eq!(eval("(string-upper \"abc\")"), Value::string("ABC"));
    assert_eq!(eval("(string-substring \"hello\" 1 3)"), Value::string("el"));
    assert_eq!(eval_to_string("(string-append \"a\" \"b\")"), "\"ab\"");
}

#[test]
fn test_references() {
    assert_eq!(eval("(let ((r (ref 1))) (r))"), Value::Int(1));
    assert_eq!(eval("(let ((r (ref 1))) (r 2))"), Value::Nil);
    assert_eq!(eval_to_string("(ref 3)"), "#<ref 3>");
}

#[test]
fn test_arrays() {
    assert_eq!(eval("((array 10 20) 1)"), Value::Int(20));
    assert_eq!(eval("(let ((a (array 1 2))) (do (a 0 9) (a 0)))"), Value::Int(9));
    assert_eq!(eval_to_string("(array 1 'b \"c\")"), "#[1 b \"c\"]");
    assert!(matches!(
        eval_err("((array 1 2) 5)"),
        GlispError::IndexOutOfBounds { index: 5, len: 2 }
    ));
    assert!(matches!(
        eval_err("((array 1 2) 'x)"),
        GlispError::WrongArgumentType { .. }
    ));
}

#[test]
fn test_dicts() {
    assert_eq!(eval("((dict '(a 1) '(b 2)) 'b)"), Value::Int(2));
    assert_eq!(
        eval("(let ((d (dict))) (do (d 'k 3) (d 'k)))"),
        Value::Int(3)
    );
    assert_eq!(eval_to_string("(dict '(b 2) '(a 1))"), "#((a 1) (b 2))");
    assert!(matches!(
        eval_err("((dict '(a 1)) 'z)"),
        GlispError::KeyNotFound(key) if key == "z"
    ));
}

#[test]
fn test_non_applicable_values() {
    assert!(matches!(eval_err("(1 2)"), GlispError::NotApplicable(_)));
    assert!(matches!(eval_err("(\"f\")"), GlispError::NotApplicable(_)));
}

#[test]
fn test_type_and_predicates() {
    assert_eq!(eval("(type 1)"), Value::symbol("int"));
    assert_eq!(eval("(type '())"), Value::symbol("list"));
    assert_eq!(eval("(type (fn (x) x))"), Value::symbol("fun"));
    assert_eq!(eval("(type (do))"), Value::symbol("nil"));
    assert_eq!(eval("(function? head)"), Value::Bool(true));
    assert_eq!(eval("(empty? '())"), Value::Bool(true));
    assert_eq!(eval("(nil? '())"), Value::Bool(false));
    assert_eq!(eval("(symbol? 'a)"), Value::Bool(true));
}

#[test]
fn test_display_forms() {
    assert_eq!(eval_to_string("#T"), "#t");
    assert_eq!(eval_to_string("'()"), "()");
    assert_eq!(eval_to_string("(do)"), "#nil");
    assert_eq!(eval_to_string("(fn (x y) x)"), "#<fun x y ...>");
    assert_eq!(eval_to_string("+"), "#<prim +>");
    assert_eq!(eval_to_string("'(a (b \"c\") 1)"), "(a (b \"c\") 1)");
}

#[test]
fn test_definitions_persist() {
    let interp = Interpreter::new();
    assert_eq!(interp.eval_str("(def x 10)").unwrap(), Value::symbol("x"));
    assert_eq!(interp.eval_str("(def (add-x n) (+ n x))").unwrap(), Value::symbol("add-x"));
    assert_eq!(interp.eval_str("(add-x 5)").unwrap(), Value::Int(15));
    interp.eval_str("(def x 20)").unwrap();
    assert_eq!(interp.eval_str("(add-x 5)").unwrap(), Value::Int(25));
}

#[test]
fn test_eval_str_returns_last_form() {
    assert_eq!(eval("(def a 1) (def b 2) (+ a b)"), Value::Int(3));
}

#[test]
fn test_error_kinds_by_stage() {
    assert!(matches!(eval_err("(+ 1 2"), GlispError::Read(_)));
    assert!(matches!(eval_err("(if 1 2)"), GlispError::Parse(_)));
    assert!(matches!(eval_err("(let ((x)) x)"), GlispError::Parse(_)));
    assert!(matches!(eval_err("(+ 1 'a)"), GlispError::WrongArgumentType { .. }));
}

#[test]
fn test_unbound_hints() {
    let interp = Interpreter::new();
    let err = interp.eval_str("(lambda (x) x)").unwrap_err();
    assert!(err.hint().unwrap().contains("'fn'"));
    let err = interp.eval_str("(revers '(1 2))").unwrap_err();
    assert_eq!(err.hint(), Some("did you mean 'reverse'?"));
}

#[test]
fn test_builder_without_stdlib() {
    let interp = InterpreterBuilder::new().without_stdlib().build();
    assert_eq!(interp.eval_str("true").unwrap(), Value::Bool(true));
    assert!(matches!(
        interp.eval_str("(+ 1 2)").unwrap_err().inner(),
        GlispError::Unbound(_)
    ));
    assert_eq!(interp.eval_str("((fn (x) x) 4)").unwrap(), Value::Int(4));
}

#[test]
fn test_host_define_and_register() {
    let interp = Interpreter::new();
    interp.define("limit", Value::Int(3));
    interp.register_fn("double", 1, Some(1), |args| match &args[0] {
        Value::Int(n) => Ok(Value::Int(n * 2)),
        other => Err(GlispError::wrong_type("double", other)),
    });
    assert_eq!(interp.eval_str("(double limit)").unwrap(), Value::Int(6));
    assert_eq!(
        interp.eval_str("(map double '(1 2))").unwrap(),
        ints(&[2, 4])
    );
}

#[test]
fn test_eval_single_form() {
    let interp = Interpreter::new();
    let form = Value::list(vec![Value::symbol("+"), Value::Int(2), Value::Int(3)]);
    assert_eq!(interp.eval(&form).unwrap(), Value::Int(5));
}

#[test]
fn test_loop_frames_do_not_accumulate() {
    let interp = Interpreter::new();
    let tracked = Value::array(vec![Value::Int(0)]);
    interp.define("tracked", tracked.clone());
    let baseline = Rc::strong_count(tracked.as_array().unwrap());
    interp
        .eval_str(
            "(def (spin n) \
               (if (= n 0) 'done \
                 (let ((m (- n 1)) (keep tracked) (peek (fn () tracked))) \
                   (do (peek) \
                       (letrec ((go (k) (if (= k 0) keep (go (- k 1))))) (go 2)) \
                       (spin m)))))",
        )
        .unwrap();
    assert_eq!(interp.eval_str("(spin 10000)").unwrap(), Value::symbol("done"));
    assert_eq!(Rc::strong_count(tracked.as_array().unwrap()), baseline);
}

#[test]
fn test_recursive_closure_identity() {
    assert_eq!(eval("(letrec ((f () f)) (= (f) f))"), Value::Bool(true));
}

#[test]
fn test_deeply_nested_quoted_data() {
    let depth = 100_000;
    let source = format!("'{}{}", "(".repeat(depth), ")".repeat(depth));
    let text = eval_to_string(&source);
    assert_eq!(text.len(), 2 * depth);
    let twice = format!("(= {source} {source})");
    assert_eq!(eval(&twice), Value::Bool(true));
}

#[test]
fn test_deeply_nested_code_is_a_parse_error() {
    let source = format!("{}1{}", "(+ 1 ".repeat(5_000), ")".repeat(5_000));
    assert!(matches!(eval_err(&source), GlispError::Parse(_)));
}

#[test]
fn test_self_referential_array_display() {
    assert_eq!(
        eval_to_string("(let ((a (array 0))) (do (a 0 a) a))"),
        "#[#<cycle>]"
    );
}
