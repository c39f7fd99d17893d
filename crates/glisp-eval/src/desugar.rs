use std::cell::Cell;
use std::rc::Rc;

use glisp_core::{intern, Ast, Definition, DefinitionKind, FunctionBinding, GlispError, Spur, Value};

/// Deepest expression nesting the desugarer accepts. Quoted data is not
/// counted; it is never walked.
pub const MAX_NESTING: usize = 512;

/// Pre-interned names of the derived and kernel forms.
struct FormSpurs {
    def: Spur,
    do_: Spur,
    fn_: Spur,
    if_: Spur,
    let_: Spur,
    let_star: Spur,
    letrec: Spur,
    quote: Spur,
}

impl FormSpurs {
    fn init() -> Self {
        Self {
            def: intern("def"),
            do_: intern("do"),
            fn_: intern("fn"),
            if_: intern("if"),
            let_: intern("let"),
            let_star: intern("let*"),
            letrec: intern("letrec"),
            quote: intern("quote"),
        }
    }
}

/// Operands of a special form, checked against its fixed arity.
fn form_operands(form: &str, rest: &Value, expected: usize) -> Result<Vec<Value>, GlispError> {
    let operands = rest
        .to_vec()
        .map_err(|_| GlispError::parse(format!("malformed {form} form")))?;
    if operands.len() < expected {
        return Err(GlispError::parse(format!("too few arguments to {form}")));
    }
    if operands.len() > expected {
        return Err(GlispError::parse(format!("too many arguments to {form}")));
    }
    Ok(operands)
}

/// A parameter list: a proper list of symbols.
fn parse_symbols(form: &str, sexp: &Value) -> Result<Rc<[Spur]>, GlispError> {
    if !sexp.is_list() {
        return Err(GlispError::parse(format!(
            "expected parameter list in {form}, got {sexp}"
        )));
    }
    let items = sexp
        .to_vec()
        .map_err(|_| GlispError::parse(format!("malformed parameter list in {form}")))?;
    items
        .iter()
        .map(|item| {
            item.as_symbol().ok_or_else(|| {
                GlispError::parse(format!("expected symbol in parameter list of {form}, got {item}"))
            })
        })
        .collect()
}

/// Rewrites reader data into kernel [`Ast`].
///
/// Owns the counter behind generated `__temp_N` names, so two desugarers
/// never share numbering.
pub struct Desugarer {
    counter: Cell<usize>,
    depth: Cell<usize>,
    forms: FormSpurs,
}

/// Leaves one level of expression nesting when dropped.
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl Default for Desugarer {
    fn default() -> Self {
        Self::new()
    }
}

impl Desugarer {
    pub fn new() -> Self {
        Desugarer {
            counter: Cell::new(0),
            depth: Cell::new(0),
            forms: FormSpurs::init(),
        }
    }

    /// A name no source program is expected to spell: `__temp_0`, `__temp_1`, ...
    pub fn fresh(&self) -> Spur {
        let id = self.counter.get();
        self.counter.set(id + 1);
        intern(&format!("__temp_{id}"))
    }

    /// Recognize a top-level `def`. Anything not headed by `def` is `Ok(None)`.
    pub fn parse_def(&self, sexp: &Value) -> Result<Option<Definition>, GlispError> {
        let Some((head, rest)) = sexp.as_cons() else {
            return Ok(None);
        };
        if head.as_symbol() != Some(self.forms.def) {
            return Ok(None);
        }
        let operands = rest
            .to_vec()
            .map_err(|_| GlispError::parse("malformed def"))?;
        let Some(target) = operands.first() else {
            return Err(GlispError::parse("too few arguments to def"));
        };
        let (name, kind, params) = match target {
            Value::Symbol(name) => (*name, DefinitionKind::Value, Rc::<[Spur]>::from(Vec::new())),
            Value::Cons(cell) => {
                let name = cell
                    .head
                    .as_symbol()
                    .ok_or_else(|| GlispError::parse("definition name not a symbol"))?;
                let params = parse_symbols("def", &cell.tail)?;
                (name, DefinitionKind::Function, params)
            }
            _ => return Err(GlispError::parse("malformed def")),
        };
        let operands = form_operands("def", rest, 2)?;
        let body = self.parse_expr(&operands[1])?;
        Ok(Some(Definition {
            name,
            kind,
            params,
            body,
        }))
    }

    /// Desugar one expression.
    pub fn parse_expr(&self, sexp: &Value) -> Result<Rc<Ast>, GlispError> {
        let depth = self.depth.get() + 1;
        if depth > MAX_NESTING {
            return Err(GlispError::parse(format!(
                "expression nested too deeply (max depth: {MAX_NESTING})"
            )));
        }
        self.depth.set(depth);
        let _guard = DepthGuard(&self.depth);

        let (head, rest) = match sexp {
            Value::Symbol(name) => return Ok(Ast::identifier(*name)),
            Value::Cons(cell) => (&cell.head, &cell.tail),
            atom => return Ok(Ast::literal(atom.clone())),
        };
        if let Value::Symbol(keyword) = head {
            let k = *keyword;
            let forms = &self.forms;
            if k == forms.quote {
                let operands = form_operands("quote", rest, 1)?;
                return Ok(Rc::new(Ast::Quote(operands[0].clone())));
            }
            if k == forms.if_ {
                return self.parse_if(rest);
            }
            if k == forms.fn_ {
                return self.parse_fn(rest);
            }
            if k == forms.let_ {
                let (names, inits, body) = self.parse_let_form("let", rest)?;
                return Ok(self.make_let(names, inits, body));
            }
            if k == forms.let_star {
                let (names, inits, body) = self.parse_let_form("let*", rest)?;
                return Ok(names
                    .into_iter()
                    .zip(inits)
                    .rev()
                    .fold(body, |acc, (name, init)| {
                        self.make_let(vec![name], vec![init], acc)
                    }));
            }
            if k == forms.letrec {
                return self.parse_letrec(rest);
            }
            if k == forms.do_ {
                return self.parse_do(rest);
            }
        }
        self.parse_application(head, rest)
    }

    fn parse_if(&self, rest: &Value) -> Result<Rc<Ast>, GlispError> {
        let operands = form_operands("if", rest, 3)?;
        Ok(Rc::new(Ast::Conditional {
            test: self.parse_expr(&operands[0])?,
            then: self.parse_expr(&operands[1])?,
            else_: self.parse_expr(&operands[2])?,
        }))
    }

    /// `(fn (params...) body)` or the self-recursive `(fn name (params...) body)`.
    fn parse_fn(&self, rest: &Value) -> Result<Rc<Ast>, GlispError> {
        let named = matches!(rest.as_cons(), Some((Value::Symbol(_), _)));
        if named {
            let operands = form_operands("fn", rest, 3)?;
            let name = operands[0]
                .as_symbol()
                .ok_or_else(|| GlispError::parse("fn name not a symbol"))?;
            let params = parse_symbols("fn", &operands[1])?;
            let body = self.parse_expr(&operands[2])?;
            return Ok(make_function(name, params, body));
        }
        let operands = form_operands("fn", rest, 2)?;
        let params = parse_symbols("fn", &operands[0])?;
        let body = self.parse_expr(&operands[1])?;
        Ok(make_function(self.fresh(), params, body))
    }

    /// `(let ((name init)...) body)`; shared by `let` and `let*`.
    #[allow(clippy::type_complexity)]
    fn parse_let_form(
        &self,
        form: &str,
        rest: &Value,
    ) -> Result<(Vec<Spur>, Vec<Rc<Ast>>, Rc<Ast>), GlispError> {
        let operands = form_operands(form, rest, 2)?;
        let bindings = operands[0]
            .to_vec()
            .map_err(|_| GlispError::parse(format!("malformed binding list in {form}")))?;
        let mut names = Vec::with_capacity(bindings.len());
        let mut inits = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            let parts = binding.to_vec().map_err(|_| {
                GlispError::parse(format!("expected binding (name expr) in {form}, got {binding}"))
            })?;
            let name = parts
                .first()
                .and_then(Value::as_symbol)
                .ok_or_else(|| GlispError::parse(format!("expected name in binding of {form}")))?;
            match parts.len() {
                1 => {
                    return Err(GlispError::parse(format!("expected expr in binding of {form}")))
                }
                2 => {}
                _ => {
                    return Err(GlispError::parse(format!(
                        "too many elements in binding of {form}"
                    )))
                }
            }
            names.push(name);
            inits.push(self.parse_expr(&parts[1])?);
        }
        let body = self.parse_expr(&operands[1])?;
        Ok((names, inits, body))
    }

    /// `(letrec ((name (params...) body)...) result)`
    fn parse_letrec(&self, rest: &Value) -> Result<Rc<Ast>, GlispError> {
        let operands = form_operands("letrec", rest, 2)?;
        let entries = operands[0]
            .to_vec()
            .map_err(|_| GlispError::parse("malformed binding list in letrec"))?;
        let mut bindings = Vec::with_capacity(entries.len());
        for entry in &entries {
            let parts = entry.to_vec().map_err(|_| {
                GlispError::parse(format!(
                    "expected binding (name (params...) expr) in letrec, got {entry}"
                ))
            })?;
            let name = parts
                .first()
                .and_then(Value::as_symbol)
                .ok_or_else(|| GlispError::parse("expected name in binding of letrec"))?;
            match parts.len() {
                1 => return Err(GlispError::parse("expected params in binding of letrec")),
                2 => return Err(GlispError::parse("expected expr in binding of letrec")),
                3 => {}
                _ => return Err(GlispError::parse("too many elements in binding of letrec")),
            }
            bindings.push(FunctionBinding {
                name,
                params: parse_symbols("letrec", &parts[1])?,
                body: self.parse_expr(&parts[2])?,
            });
        }
        let body = self.parse_expr(&operands[1])?;
        Ok(Rc::new(Ast::MutualBinding {
            bindings: bindings.into(),
            body,
        }))
    }

    /// `(do e1 ... en)`: each non-final expression is bound to a discarded
    /// fresh name; `(do)` is Nil.
    fn parse_do(&self, rest: &Value) -> Result<Rc<Ast>, GlispError> {
        let items = rest
            .to_vec()
            .map_err(|_| GlispError::parse("malformed do form"))?;
        let mut exprs = items
            .iter()
            .map(|item| self.parse_expr(item))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(last) = exprs.pop() else {
            return Ok(Ast::literal(Value::Nil));
        };
        Ok(exprs.into_iter().rev().fold(last, |acc, expr| {
            self.make_let(vec![self.fresh()], vec![expr], acc)
        }))
    }

    fn parse_application(&self, head: &Value, rest: &Value) -> Result<Rc<Ast>, GlispError> {
        let operator = self.parse_expr(head)?;
        let operands = rest
            .to_vec()
            .map_err(|_| GlispError::parse("malformed expression list"))?
            .iter()
            .map(|operand| self.parse_expr(operand))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rc::new(Ast::Application { operator, operands }))
    }

    /// `let` is an immediately applied anonymous function.
    fn make_let(&self, names: Vec<Spur>, inits: Vec<Rc<Ast>>, body: Rc<Ast>) -> Rc<Ast> {
        let function = make_function(self.fresh(), Rc::from(names), body);
        Rc::new(Ast::Application {
            operator: function,
            operands: inits,
        })
    }
}

/// A single-function mutual binding whose result is the function itself.
fn make_function(name: Spur, params: Rc<[Spur]>, body: Rc<Ast>) -> Rc<Ast> {
    Rc::new(Ast::MutualBinding {
        bindings: Rc::from(vec![FunctionBinding { name, params, body }]),
        body: Ast::identifier(name),
    })
}
