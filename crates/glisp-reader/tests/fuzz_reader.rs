use glisp_core::Value;
use glisp_reader::{read, read_all};
use proptest::prelude::*;

proptest! {
    #[test]
    fn reader_never_panics(input in "\\PC*") {
        // Any arbitrary string should produce Ok or Err, never panic
        let _ = read(&input);
    }

    #[test]
    fn read_all_never_panics(input in "\\PC*") {
        let _ = read_all(&input);
    }
}

fn canonical_atom() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-zA-Z0-9 _]{1,20}".prop_map(|s| Value::string(&s)),
        "[a-z][a-z0-9?!*<>=+-]{0,10}".prop_map(|s| Value::symbol(&s)),
    ]
}

fn canonical_value() -> impl Strategy<Value = Value> {
    canonical_atom().prop_recursive(3, 32, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Value::list)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn printed_literals_read_back(value in canonical_value()) {
        let printed = value.to_string();
        let (back, rest) = read(&printed).unwrap_or_else(|e| {
            panic!("Failed to read printed value: {printed:?}\nError: {e}")
        });
        prop_assert_eq!(back, value);
        prop_assert_eq!(rest, "");
    }

    #[test]
    fn read_all_counts_forms(values in prop::collection::vec(canonical_value(), 1..6)) {
        let input = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let forms = read_all(&input).unwrap_or_else(|e| {
            panic!("Failed to read: {input:?}\nError: {e}")
        });
        prop_assert_eq!(forms.len(), values.len());
    }
}

proptest! {
    #[test]
    fn delimiter_soup_never_panics(
        input in prop::collection::vec(
            prop_oneof![
                Just("("),
                Just(")"),
                Just("'"),
                Just("\""),
                Just("#"),
                Just("#t"),
                Just(" "),
                Just("\n"),
                Just("-"),
                Just("1"),
                Just("foo"),
            ],
            0..50
        ).prop_map(|v| v.join(""))
    ) {
        let _ = read_all(&input);
    }

    #[test]
    fn numeric_strings_never_panic(
        input in prop_oneof![
            "-?[0-9]{1,18}",
            "-?[0-9]{19,25}",
        ]
    ) {
        let _ = read(&input);
    }
}
