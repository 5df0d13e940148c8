#![warn(missing_docs)]

//! Qualified names and namespace bookkeeping shared by the lexer, parser
//! and evaluator.

mod name;
mod namespaces;

pub use name::Name;
pub use namespaces::{NamespaceLookup, Namespaces, ARRAY_NAMESPACE, FN_NAMESPACE, MAP_NAMESPACE, MATH_NAMESPACE, XS_NAMESPACE};
