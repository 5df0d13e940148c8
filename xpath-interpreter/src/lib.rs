//! The dynamic half of the engine (spec.md §3–§7): the [`node::Node`]
//! adapter trait, the [`context::DynamicContext`] it runs under, the
//! [`function::FunctionRegistry`] of built-ins, the [`eval`] tree-walking
//! evaluator, the [`cache::ExpressionCache`], and the closed
//! [`error::Error`] taxonomy. Parsing a source string into
//! [`xpath_ast::ast::XPath`] lives upstream in `xpath-ast`; this crate only
//! runs the result against a host document.

pub mod atomic;
pub mod cache;
pub mod coerce;
pub mod context;
pub mod error;
pub mod eval;
pub mod function;
pub mod item;
pub mod node;
pub mod sequence;
#[cfg(any(test, feature = "test-util"))]
pub mod testtree;
pub mod warning;

pub use context::DynamicContext;
pub use error::{Error, SpannedError};
pub use eval::evaluate;
pub use function::FunctionRegistry;
pub use item::Item;
pub use node::Node;
pub use sequence::Sequence;
