use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::ast::{Ast, FunctionBinding};
use crate::env::Env;
use crate::error::GlispError;

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
    static EVAL_FN: RefCell<Option<EvalCallback>> = const { RefCell::new(None) };
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// Evaluator entry point used when host code invokes a closure.
pub type EvalCallback = Box<dyn Fn(&Ast, &Env) -> Result<Value, GlispError>>;

/// Register the evaluator that runs closure bodies for [`Value::invoke`].
pub fn set_eval_callback(f: impl Fn(&Ast, &Env) -> Result<Value, GlispError> + 'static) {
    EVAL_FN.with(|eval| {
        *eval.borrow_mut() = Some(Box::new(f));
    });
}

fn full_eval(body: &Ast, env: &Env) -> Result<Value, GlispError> {
    EVAL_FN.with(|eval_fn| match eval_fn.borrow().as_ref() {
        Some(f) => f(body, env),
        None => Err(GlispError::eval(
            "no evaluator registered to run closure bodies",
        )),
    })
}

/// A host-supplied procedure.
pub type PrimitiveFn = dyn Fn(&[Value]) -> Result<Value, GlispError>;

pub struct Primitive {
    pub name: String,
    pub min_arity: usize,
    pub max_arity: Option<usize>,
    pub func: Box<PrimitiveFn>,
}

impl Primitive {
    pub fn new(
        name: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        f: impl Fn(&[Value]) -> Result<Value, GlispError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            min_arity,
            max_arity,
            func: Box::new(f),
        }
    }

    fn expected_arity(&self) -> String {
        match self.max_arity {
            Some(max) if max == self.min_arity => max.to_string(),
            Some(max) => format!("{}-{max}", self.min_arity),
            None => format!("{}+", self.min_arity),
        }
    }

    pub fn check_arity(&self, got: usize) -> Result<(), GlispError> {
        let too_many = self.max_arity.is_some_and(|max| got > max);
        if got < self.min_arity || too_many {
            return Err(GlispError::arity(&self.name, self.expected_arity(), got));
        }
        Ok(())
    }

    /// Check arity once, then run the primitive body.
    pub fn call(&self, args: &[Value]) -> Result<Value, GlispError> {
        self.check_arity(args.len())?;
        (self.func)(args)
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive[{}]", self.name)
    }
}

/// A user-defined function together with the frame it was created in.
///
/// Functions defined together by one mutual binding share `group`. The frame
/// naming the group is rebuilt around every call instead of being stored, so
/// no frame ever owns a closure that owns that same frame.
pub struct Closure {
    pub name: Spur,
    pub params: Rc<[Spur]>,
    pub body: Rc<Ast>,
    pub env: Env,
    pub group: Option<Rc<[FunctionBinding]>>,
}

impl Closure {
    /// A closure over `env` with no group; its name resolves through `env`.
    pub fn new(name: Spur, params: Rc<[Spur]>, body: Rc<Ast>, env: Env) -> Self {
        Closure {
            name,
            params,
            body,
            env,
            group: None,
        }
    }

    /// Child frame of `env` binding every member of `group` to a closure over
    /// `env`. The member named like `current` is bound to `current` itself.
    pub fn bind_group(
        env: &Env,
        group: &Rc<[FunctionBinding]>,
        current: Option<&Rc<Closure>>,
    ) -> Env {
        let names: Vec<Spur> = group.iter().map(|b| b.name).collect();
        let members = group
            .iter()
            .map(|binding| match current {
                Some(c) if c.name == binding.name => Value::Closure(c.clone()),
                _ => Value::Closure(Rc::new(Closure {
                    name: binding.name,
                    params: binding.params.clone(),
                    body: binding.body.clone(),
                    env: env.clone(),
                    group: Some(group.clone()),
                })),
            })
            .collect();
        env.extend(&names, members)
    }

    fn label(&self) -> String {
        with_resolved(self.name, |name| {
            if name.starts_with("__temp_") {
                "anonymous fn".to_string()
            } else {
                name.to_string()
            }
        })
    }

    /// Build the call frame for `args`, failing on a parameter count mismatch.
    pub fn bind_arguments(self: &Rc<Self>, args: &[Value]) -> Result<Env, GlispError> {
        if args.len() != self.params.len() {
            return Err(GlispError::arity(
                self.label(),
                self.params.len().to_string(),
                args.len(),
            ));
        }
        let scope = match &self.group {
            Some(group) => Closure::bind_group(&self.env, group, Some(self)),
            None => self.env.clone(),
        };
        Ok(scope.extend(&self.params, args.to_vec()))
    }

    pub fn apply(self: &Rc<Self>, args: &[Value]) -> Result<Value, GlispError> {
        let frame = self.bind_arguments(args)?;
        full_eval(&self.body, &frame)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure[[")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            with_resolved(*p, |n| write!(f, "{n}"))?;
        }
        write!(f, "] {}]", self.body)
    }
}

/// A pair. Proper lists are chains of these ending in [`Value::Empty`].
pub struct Cons {
    pub head: Value,
    pub tail: Value,
}

impl Drop for Cons {
    // Uniquely owned child cells are unlinked onto a worklist so that long or
    // deeply nested lists drop without recursing once per cell.
    fn drop(&mut self) {
        let mut pending: Vec<Rc<Cons>> = Vec::new();
        take_cons_children(self, &mut pending);
        while let Some(rc) = pending.pop() {
            if let Ok(mut cell) = Rc::try_unwrap(rc) {
                take_cons_children(&mut cell, &mut pending);
            }
        }
    }
}

fn take_cons_children(cell: &mut Cons, pending: &mut Vec<Rc<Cons>>) {
    for slot in [&mut cell.head, &mut cell.tail] {
        if matches!(slot, Value::Cons(_)) {
            if let Value::Cons(rc) = std::mem::replace(slot, Value::Empty) {
                pending.push(rc);
            }
        }
    }
}

/// The core Value type for all glisp data.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(Rc<String>),
    Symbol(Spur),
    /// "No useful result"; distinct from the empty list.
    Nil,
    /// The empty list.
    Empty,
    Cons(Rc<Cons>),
    Closure(Rc<Closure>),
    Primitive(Rc<Primitive>),
    Reference(Rc<RefCell<Value>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<BTreeMap<String, Value>>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Nil => "nil",
            Value::Empty | Value::Cons(_) => "list",
            Value::Closure(_) | Value::Primitive(_) => "fun",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }

    /// Everything is true except `#f`.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Primitive(_))
    }

    /// Empty or a Cons cell; does not check the terminator.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::Empty | Value::Cons(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Spur> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_symbol_str(&self) -> Option<String> {
        match self {
            Value::Symbol(s) => Some(resolve(*s)),
            _ => None,
        }
    }

    pub fn as_cons(&self) -> Option<(&Value, &Value)> {
        match self {
            Value::Cons(cell) => Some((&cell.head, &cell.tail)),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Rc<Closure>> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Rc<Primitive>> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Rc<RefCell<Value>>> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Rc<RefCell<BTreeMap<String, Value>>>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(intern(s))
    }

    pub fn string(s: &str) -> Value {
        Value::String(Rc::new(s.to_string()))
    }

    pub fn cons(head: Value, tail: Value) -> Value {
        Value::Cons(Rc::new(Cons { head, tail }))
    }

    /// Build a proper list, preserving order.
    pub fn list(items: Vec<Value>) -> Value {
        items
            .into_iter()
            .rev()
            .fold(Value::Empty, |tail, head| Value::cons(head, tail))
    }

    pub fn reference(v: Value) -> Value {
        Value::Reference(Rc::new(RefCell::new(v)))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn dict(entries: BTreeMap<String, Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn primitive(p: Primitive) -> Value {
        Value::Primitive(Rc::new(p))
    }

    /// Collect a proper list into a Vec; any other terminator is a MalformedList.
    pub fn to_vec(&self) -> Result<Vec<Value>, GlispError> {
        let mut items = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Cons(cell) => {
                    items.push(cell.head.clone());
                    current = &cell.tail;
                }
                Value::Empty => return Ok(items),
                _ => {
                    return Err(GlispError::malformed_list(format!(
                        "{self} does not end in ()"
                    )))
                }
            }
        }
    }

    /// Structural for data, identity for closures, primitives and mutable containers.
    pub fn is_equal(&self, other: &Value) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            let same = match pair {
                (Value::Cons(x), Value::Cons(y)) => {
                    pending.push((&x.tail, &y.tail));
                    pending.push((&x.head, &y.head));
                    true
                }
                (Value::Int(a), Value::Int(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::String(a), Value::String(b)) => a == b,
                (Value::Symbol(a), Value::Symbol(b)) => a == b,
                (Value::Nil, Value::Nil) => true,
                (Value::Empty, Value::Empty) => true,
                (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
                (Value::Primitive(a), Value::Primitive(b)) => Rc::ptr_eq(a, b),
                (Value::Reference(a), Value::Reference(b)) => Rc::ptr_eq(a, b),
                (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
                (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
                _ => false,
            };
            if !same {
                return false;
            }
        }
        true
    }

    /// Call this value with already-evaluated arguments.
    ///
    /// Closures and primitives run their bodies; references, arrays and dicts
    /// read with one fewer argument than they write with.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, GlispError> {
        match self {
            Value::Closure(c) => c.apply(args),
            Value::Primitive(p) => p.call(args),
            Value::Reference(cell) => match args {
                [] => Ok(cell.borrow().clone()),
                [v] => {
                    *cell.borrow_mut() = v.clone();
                    Ok(Value::Nil)
                }
                _ => Err(GlispError::arity("reference", "0-1", args.len())),
            },
            Value::Array(items) => invoke_array(items, args),
            Value::Dict(entries) => invoke_dict(entries, args),
            other => Err(GlispError::NotApplicable(format!(
                "{other} ({})",
                other.type_name()
            ))),
        }
    }
}

fn invoke_array(items: &RefCell<Vec<Value>>, args: &[Value]) -> Result<Value, GlispError> {
    if args.is_empty() || args.len() > 2 {
        return Err(GlispError::arity("array", "1-2", args.len()));
    }
    let index = args[0]
        .as_int()
        .ok_or_else(|| GlispError::wrong_type("array", &args[0]))?;
    let len = items.borrow().len();
    let slot = usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(GlispError::IndexOutOfBounds { index, len })?;
    if let Some(v) = args.get(1) {
        items.borrow_mut()[slot] = v.clone();
        return Ok(Value::Nil);
    }
    Ok(items.borrow()[slot].clone())
}

/// Dict keys are names; symbols and strings both address them.
fn dict_key(v: &Value) -> Option<String> {
    match v {
        Value::Symbol(s) => Some(resolve(*s)),
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn invoke_dict(
    entries: &RefCell<BTreeMap<String, Value>>,
    args: &[Value],
) -> Result<Value, GlispError> {
    if args.is_empty() || args.len() > 2 {
        return Err(GlispError::arity("dict", "1-2", args.len()));
    }
    let key = dict_key(&args[0]).ok_or_else(|| GlispError::wrong_type("dict", &args[0]))?;
    if let Some(v) = args.get(1) {
        entries.borrow_mut().insert(key, v.clone());
        return Ok(Value::Nil);
    }
    let found = entries.borrow().get(&key).cloned();
    found.ok_or(GlispError::KeyNotFound(key))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

/// One pending step of rendering a value.
enum Piece {
    Value(Value),
    Text(&'static str),
    Owned(String),
    /// A container's contents are finished.
    Leave,
}

#[derive(Clone, Copy, PartialEq)]
enum Style {
    User,
    Diagnostic,
}

/// Render `root` with an explicit work stack. Containers currently being
/// rendered are tracked by identity; meeting one again prints `#<cycle>`.
fn render(root: &Value, f: &mut fmt::Formatter<'_>, style: Style) -> fmt::Result {
    let mut work = vec![Piece::Value(root.clone())];
    let mut open: Vec<*const ()> = Vec::new();
    while let Some(piece) = work.pop() {
        match piece {
            Piece::Text(text) => f.write_str(text)?,
            Piece::Owned(text) => f.write_str(&text)?,
            Piece::Leave => {
                open.pop();
            }
            Piece::Value(v) => render_one(&v, f, style, &mut work, &mut open)?,
        }
    }
    Ok(())
}

/// Push `items` so that they pop in order, separated by single spaces.
fn push_spaced(work: &mut Vec<Piece>, items: Vec<Value>) {
    for (i, item) in items.into_iter().enumerate().rev() {
        work.push(Piece::Value(item));
        if i > 0 {
            work.push(Piece::Text(" "));
        }
    }
}

fn render_one(
    v: &Value,
    f: &mut fmt::Formatter<'_>,
    style: Style,
    work: &mut Vec<Piece>,
    open: &mut Vec<*const ()>,
) -> fmt::Result {
    let user = style == Style::User;
    let identity = match v {
        Value::Reference(r) => Some(Rc::as_ptr(r) as *const ()),
        Value::Array(a) => Some(Rc::as_ptr(a) as *const ()),
        Value::Dict(d) => Some(Rc::as_ptr(d) as *const ()),
        _ => None,
    };
    if let Some(id) = identity {
        if open.contains(&id) {
            return f.write_str("#<cycle>");
        }
        open.push(id);
        work.push(Piece::Leave);
    }
    match v {
        Value::Int(n) if user => write!(f, "{n}"),
        Value::Int(n) => write!(f, "Int({n})"),
        Value::Bool(b) if user => f.write_str(if *b { "#t" } else { "#f" }),
        Value::Bool(b) => write!(f, "Bool({b})"),
        Value::String(s) if user => write!(f, "\"{s}\""),
        Value::String(s) => write!(f, "String({s:?})"),
        Value::Symbol(s) if user => with_resolved(*s, |name| f.write_str(name)),
        Value::Symbol(s) => with_resolved(*s, |name| write!(f, "Symbol({name})")),
        Value::Nil => f.write_str(if user { "#nil" } else { "Nil" }),
        Value::Empty => f.write_str(if user { "()" } else { "Empty" }),
        Value::Cons(cell) if user => {
            let mut items = vec![cell.head.clone()];
            let mut rest = &cell.tail;
            while let Value::Cons(next) = rest {
                items.push(next.head.clone());
                rest = &next.tail;
            }
            work.push(Piece::Text(")"));
            if !rest.is_empty() {
                work.push(Piece::Value(rest.clone()));
                work.push(Piece::Text(" . "));
            }
            push_spaced(work, items);
            f.write_str("(")
        }
        Value::Cons(cell) => {
            work.push(Piece::Text(")"));
            work.push(Piece::Value(cell.tail.clone()));
            work.push(Piece::Text(", "));
            work.push(Piece::Value(cell.head.clone()));
            f.write_str("Cons(")
        }
        Value::Closure(c) if user => {
            f.write_str("#<fun")?;
            for p in c.params.iter() {
                with_resolved(*p, |n| write!(f, " {n}"))?;
            }
            f.write_str(" ...>")
        }
        Value::Closure(c) => write!(f, "{c:?}"),
        Value::Primitive(p) if user => write!(f, "#<prim {}>", p.name),
        Value::Primitive(p) => write!(f, "{p:?}"),
        Value::Reference(cell) => {
            work.push(Piece::Text(if user { ">" } else { "]" }));
            work.push(Piece::Value(cell.borrow().clone()));
            f.write_str(if user { "#<ref " } else { "Reference[" })
        }
        Value::Array(items) => {
            work.push(Piece::Text("]"));
            push_spaced(work, items.borrow().clone());
            f.write_str(if user { "#[" } else { "Array[" })
        }
        Value::Dict(entries) => {
            let (open_entry, close_entry) = if user { ("(", ")") } else { ("[", "]") };
            work.push(Piece::Text(if user { ")" } else { "]" }));
            let entries: Vec<(String, Value)> = entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (i, (key, value)) in entries.into_iter().enumerate().rev() {
                work.push(Piece::Text(close_entry));
                work.push(Piece::Value(value));
                work.push(Piece::Owned(format!("{open_entry}{key} ")));
                if i > 0 {
                    work.push(Piece::Text(" "));
                }
            }
            f.write_str(if user { "#(" } else { "Dict[" })
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, Style::User)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, Style::Diagnostic)
    }
}
