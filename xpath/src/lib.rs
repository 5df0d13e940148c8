//! Public facade for the engine: `compile(source, options) -> Expression`
//! and `Expression::evaluate(context) -> Sequence` (spec.md §6). Combines
//! `xpath-ast`'s versioned lexer+parser, `xpath-interpreter`'s function
//! registry, evaluator, cache, and error/warning model into the one entry
//! point a host embeds. Grounded on the teacher's `xee-xpath`/
//! `xee-xpath-compiler` crates, which play the same role atop
//! `xee-xpath-ast`/`xee-interpreter`.

mod compile;
mod options;

pub use xpath_ast::context::StaticContext;
pub use xpath_interpreter::atomic::AtomicValue;
pub use xpath_interpreter::cache::{CacheOptions, CacheStatistics, EvictionPolicy, ExpressionCache};
pub use xpath_interpreter::context::{CancelSignal, DynamicContext, Variables};
pub use xpath_interpreter::error::{Error, SpannedError};
pub use xpath_interpreter::function::{Callable, FunctionRegistry};
pub use xpath_interpreter::item::{ArrayItem, FunctionItem, Item, MapItem};
pub use xpath_interpreter::node::{AxisDirection, Node, NodeKind};
pub use xpath_interpreter::sequence::Sequence;
pub use xpath_interpreter::warning::{Category, Severity, Warning, WarningChannel};
pub use xpath_lexer::Version;
pub use xpath_name::{Name, Namespaces};

pub use crate::compile::{compile, Expression};
pub use crate::options::{CacheMode, ExtensionFunction, Options};

/// Build a new expression cache with the given eviction policy and
/// capacity (spec.md §6 `new-cache(max-size, ttl?, policy)`).
pub fn new_cache(options: CacheOptions) -> ExpressionCache {
    ExpressionCache::new(options)
}
