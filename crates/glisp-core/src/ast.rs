use std::fmt;
use std::rc::Rc;

use lasso::Spur;

use crate::value::{with_resolved, Value};

/// Kernel syntax understood directly by the evaluator.
///
/// Every derived form (`fn`, `let`, `let*`, `letrec`, `do`) is rewritten into
/// these nodes by the desugarer. Children are `Rc` so the evaluator can hand a
/// tail expression back to its loop without borrowing from a closure.
#[derive(Debug, Clone)]
pub enum Ast {
    /// Self-evaluating constant.
    Literal(Value),
    /// Variable reference.
    Identifier(Spur),
    /// if-then-else; both branches are tail positions.
    Conditional {
        test: Rc<Ast>,
        then: Rc<Ast>,
        else_: Rc<Ast>,
    },
    /// Call: operator and operands evaluated left to right.
    Application {
        operator: Rc<Ast>,
        operands: Vec<Rc<Ast>>,
    },
    /// Quoted datum.
    Quote(Value),
    /// A group of functions bound in one frame, then `body` evaluated there.
    MutualBinding {
        bindings: Rc<[FunctionBinding]>,
        body: Rc<Ast>,
    },
}

/// One `name (params...) body` entry of a mutual binding group.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    pub name: Spur,
    pub params: Rc<[Spur]>,
    pub body: Rc<Ast>,
}

impl Ast {
    pub fn literal(value: Value) -> Rc<Ast> {
        Rc::new(Ast::Literal(value))
    }

    pub fn identifier(name: Spur) -> Rc<Ast> {
        Rc::new(Ast::Identifier(name))
    }
}

/// Whether a top-level definition binds a computed value or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// `(def name expr)`: `body` is evaluated once, immediately.
    Value,
    /// `(def (name params...) body)`: bound as a closure without evaluation.
    Function,
}

/// A top-level `def` form.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: Spur,
    pub kind: DefinitionKind,
    pub params: Rc<[Spur]>,
    pub body: Rc<Ast>,
}

fn write_names(f: &mut fmt::Formatter<'_>, names: &[Spur]) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        with_resolved(*name, |n| write!(f, "{n}"))?;
    }
    Ok(())
}

/// Diagnostic rendering, e.g. `Apply[Id[+] Literal[1] Literal[2]]`.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Literal(v) => write!(f, "Literal[{v:?}]"),
            Ast::Identifier(name) => with_resolved(*name, |n| write!(f, "Id[{n}]")),
            Ast::Conditional { test, then, else_ } => write!(f, "If[{test} {then} {else_}]"),
            Ast::Application { operator, operands } => {
                write!(f, "Apply[{operator}")?;
                for operand in operands {
                    write!(f, " {operand}")?;
                }
                write!(f, "]")
            }
            Ast::Quote(v) => write!(f, "Quote[{v:?}]"),
            Ast::MutualBinding { bindings, body } => {
                write!(f, "LetRec[")?;
                for binding in bindings.iter() {
                    with_resolved(binding.name, |n| write!(f, "[{n} ["))?;
                    write_names(f, &binding.params)?;
                    write!(f, "] {}] ", binding.body)?;
                }
                write!(f, "{body}]")
            }
        }
    }
}
