pub mod ast;
pub mod env;
pub mod error;
pub mod value;

pub use ast::{Ast, Definition, DefinitionKind, FunctionBinding};
pub use env::Env;
pub use error::{suggest_similar, veteran_hint, GlispError};
pub use lasso::Spur;
pub use value::{
    intern, resolve, set_eval_callback, with_resolved, Closure, Cons, Primitive, Value,
};

pub type Result<T> = std::result::Result<T, GlispError>;
