pub mod ast;
pub mod parser;
pub mod simplify;

pub use ast::{Atom, CaseMode, Predicate};
pub use parser::parse_query;
pub use simplify::simplify;
