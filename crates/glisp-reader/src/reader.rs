use glisp_core::{GlispError, Value};

/// Characters that end a symbol.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '#')
}

/// Open constructs waiting for their next completed datum.
enum Frame {
    List(Vec<Value>),
    Quote,
}

fn snippet(s: &str) -> String {
    let head: String = s.chars().take(20).collect();
    if head.len() < s.len() {
        format!("{head}...")
    } else {
        head
    }
}

fn read_integer(s: &str) -> Result<Option<(Value, &str)>, GlispError> {
    let digits_start = usize::from(s.starts_with('-'));
    let digits = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Ok(None);
    }
    let end = digits_start + digits;
    let text = &s[..end];
    let n = text
        .parse::<i64>()
        .map_err(|_| GlispError::read(format!("integer literal out of range: {text}")))?;
    Ok(Some((Value::Int(n), &s[end..])))
}

fn read_symbol(s: &str) -> Option<(Value, &str)> {
    let end = s.find(is_delimiter).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((Value::symbol(&s[..end]), &s[end..]))
}

/// `"` one or more characters other than newline or `"`, then `"`. No escapes.
fn read_string(s: &str) -> Option<(Value, &str)> {
    let body = s.strip_prefix('"')?;
    let end = body.find(['"', '\n'])?;
    if end == 0 || !body[end..].starts_with('"') {
        return None;
    }
    Some((Value::string(&body[..end]), &body[end + 1..]))
}

fn read_boolean(s: &str) -> Option<(Value, &str)> {
    let rest = s.strip_prefix('#')?;
    match rest.chars().next()? {
        't' | 'T' => Some((Value::Bool(true), &rest[1..])),
        'f' | 'F' => Some((Value::Bool(false), &rest[1..])),
        _ => None,
    }
}

/// Atoms in priority order; the first alternative that matches wins.
fn read_atom(s: &str) -> Result<Option<(Value, &str)>, GlispError> {
    if let Some(found) = read_integer(s)? {
        return Ok(Some(found));
    }
    Ok(read_symbol(s)
        .or_else(|| read_string(s))
        .or_else(|| read_boolean(s)))
}

/// Where input ran out before a datum was complete.
enum Ended {
    InsideList,
    Early,
}

/// Read one datum from the front of `input`.
///
/// Returns the datum and the text following it. Leading whitespace is
/// skipped; anything after the datum is left untouched. Nesting is tracked
/// on an explicit stack, so deeply nested input cannot exhaust the call stack.
pub fn read(input: &str) -> Result<(Value, &str), GlispError> {
    match read_form(input)? {
        Ok(found) => Ok(found),
        Err(Ended::InsideList) => Err(GlispError::read("missing closing parenthesis")),
        Err(Ended::Early) => Err(GlispError::read("unexpected end of input")),
    }
}

/// Like [`read`], but input that stops before its first datum is complete
/// (an open list, a dangling quote, only whitespace) is `Ok(None)`.
pub fn read_partial(input: &str) -> Result<Option<(Value, &str)>, GlispError> {
    read_form(input).map(Result::ok)
}

fn read_form(input: &str) -> Result<Result<(Value, &str), Ended>, GlispError> {
    let mut rest = input;
    let mut stack: Vec<Frame> = Vec::new();
    loop {
        rest = rest.trim_start();
        let mut value = match read_atom(rest)? {
            Some((atom, after)) => {
                rest = after;
                atom
            }
            None => match rest.chars().next() {
                Some('\'') => {
                    rest = &rest[1..];
                    stack.push(Frame::Quote);
                    continue;
                }
                Some('(') => {
                    rest = &rest[1..];
                    stack.push(Frame::List(Vec::new()));
                    continue;
                }
                Some(')') => match stack.pop() {
                    Some(Frame::List(items)) => {
                        rest = &rest[1..];
                        Value::list(items)
                    }
                    _ => return Err(GlispError::read(format!("unexpected ')' at {}", snippet(rest)))),
                },
                None if stack.iter().any(|f| matches!(f, Frame::List(_))) => {
                    return Ok(Err(Ended::InsideList))
                }
                None => return Ok(Err(Ended::Early)),
                Some(_) => {
                    return Err(GlispError::read(format!("cannot read input at {}", snippet(rest))))
                }
            },
        };
        loop {
            match stack.pop() {
                None => return Ok(Ok((value, rest))),
                Some(Frame::Quote) => value = Value::list(vec![Value::symbol("quote"), value]),
                Some(Frame::List(mut items)) => {
                    items.push(value);
                    stack.push(Frame::List(items));
                    break;
                }
            }
        }
    }
}

/// Read consecutive data until only whitespace remains.
pub fn read_all(input: &str) -> Result<Vec<Value>, GlispError> {
    let mut forms = Vec::new();
    let mut rest = input;
    while !rest.trim_start().is_empty() {
        let (form, after) = read(rest)?;
        forms.push(form);
        rest = after;
    }
    Ok(forms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(input: &str) -> Value {
        let (v, rest) = read(input).unwrap();
        assert_eq!(rest.trim(), "", "unexpected leftover input");
        v
    }

    #[test]
    fn test_read_int() {
        assert_eq!(read_one("42"), Value::Int(42));
        assert_eq!(read_one("-7"), Value::Int(-7));
        assert_eq!(read_one("  007"), Value::Int(7));
    }

    #[test]
    fn test_integer_prefix_wins() {
        let (v, rest) = read("12abc").unwrap();
        assert_eq!(v, Value::Int(12));
        assert_eq!(rest, "abc");
    }

    #[test]
    fn test_minus_alone_is_symbol() {
        assert_eq!(read_one("-"), Value::symbol("-"));
        assert_eq!(read_one("-x"), Value::symbol("-x"));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        assert!(read("99999999999999999999").is_err());
        assert_eq!(
            read_one("-9223372036854775808"),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn test_read_symbol() {
        assert_eq!(read_one("foo"), Value::symbol("foo"));
        assert_eq!(read_one("string-append"), Value::symbol("string-append"));
        assert_eq!(read_one("empty?"), Value::symbol("empty?"));
        assert_eq!(read_one("<="), Value::symbol("<="));
    }

    #[test]
    fn test_read_string() {
        assert_eq!(read_one("\"hello world\""), Value::string("hello world"));
        assert_eq!(read_one("\"a\\n\""), Value::string("a\\n"));
    }

    #[test]
    fn test_string_needs_content_and_one_line() {
        assert!(read("\"\"").is_err());
        assert!(read("\"ab\ncd\"").is_err());
        assert!(read("\"open").is_err());
    }

    #[test]
    fn test_read_bool() {
        assert_eq!(read_one("#t"), Value::Bool(true));
        assert_eq!(read_one("#T"), Value::Bool(true));
        assert_eq!(read_one("#f"), Value::Bool(false));
        assert_eq!(read_one("#F"), Value::Bool(false));
        assert!(read("#x").is_err());
    }

    #[test]
    fn test_read_list() {
        assert_eq!(
            read_one("(+ 1 2)"),
            Value::list(vec![Value::symbol("+"), Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_read_nested_list() {
        assert_eq!(
            read_one("(* (+ 1 2) 3)"),
            Value::list(vec![
                Value::symbol("*"),
                Value::list(vec![Value::symbol("+"), Value::Int(1), Value::Int(2)]),
                Value::Int(3)
            ])
        );
    }

    #[test]
    fn test_read_empty_list() {
        assert_eq!(read_one("()"), Value::Empty);
        assert_eq!(read_one("( )"), Value::Empty);
    }

    #[test]
    fn test_read_quote() {
        assert_eq!(
            read_one("'x"),
            Value::list(vec![Value::symbol("quote"), Value::symbol("x")])
        );
        assert_eq!(
            read_one("'(1 'a)"),
            Value::list(vec![
                Value::symbol("quote"),
                Value::list(vec![
                    Value::Int(1),
                    Value::list(vec![Value::symbol("quote"), Value::symbol("a")]),
                ]),
            ])
        );
    }

    #[test]
    fn test_delimiters_split_symbols() {
        assert_eq!(
            read_one("(a'b)"),
            Value::list(vec![
                Value::symbol("a"),
                Value::list(vec![Value::symbol("quote"), Value::symbol("b")]),
            ])
        );
        assert_eq!(
            read_one("(x\"s\")"),
            Value::list(vec![Value::symbol("x"), Value::string("s")])
        );
    }

    #[test]
    fn test_remaining_text() {
        let (v, rest) = read("(a b) (c)").unwrap();
        assert_eq!(v, Value::list(vec![Value::symbol("a"), Value::symbol("b")]));
        assert_eq!(rest, " (c)");
    }

    #[test]
    fn test_missing_close_paren() {
        let err = read("(1 2").unwrap_err();
        assert!(err.to_string().contains("missing closing parenthesis"));
        assert!(read("((1)").is_err());
    }

    #[test]
    fn test_stray_close_paren() {
        assert!(read(")").is_err());
        assert!(read("(')").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(read("").is_err());
        assert!(read("   \n").is_err());
        assert!(read("'").is_err());
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 100_000;
        let input = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        let (v, rest) = read(&input).unwrap();
        assert!(rest.is_empty());
        assert!(v.as_cons().is_some());
    }

    #[test]
    fn test_read_all() {
        let forms = read_all("(def x 1)\n x  'y ").unwrap();
        assert_eq!(forms.len(), 3);
        assert_eq!(forms[1], Value::symbol("x"));
        assert!(read_all("  ").unwrap().is_empty());
        assert!(read_all("1 (").is_err());
    }

    #[test]
    fn partial_input_waits_for_more() {
        assert!(read_partial("(+ 1").unwrap().is_none());
        assert!(read_partial("'").unwrap().is_none());
        assert!(read_partial("  \n").unwrap().is_none());
        assert!(read_partial("(a (b c)").unwrap().is_none());

        let (v, rest) = read_partial("(+ 1 2) (tail").unwrap().unwrap();
        assert_eq!(v.to_string(), "(+ 1 2)");
        assert_eq!(rest, " (tail");

        assert!(read_partial(")").is_err());
        assert!(read_partial("(a \"\")").is_err());
    }
}
