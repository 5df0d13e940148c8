//! Configuration accepted by [`crate::compile`] (spec.md §6 "Configuration
//! options"). Mirrors the teacher's `xee-xpath`'s builder-style options
//! structs: plain data, `Default`-able, no config-file loading — this is an
//! embedded library, not a service.

use std::rc::Rc;

use xpath_interpreter::cache::ExpressionCache;
use xpath_interpreter::function::Callable;
use xpath_interpreter::node::Node;
use xpath_lexer::Version;
use xpath_name::{Name, Namespaces};

/// A single host extension registration: `{name, min-arity, max-arity?,
/// callable, description?}` (spec.md §6).
pub struct ExtensionFunction<N: Node> {
    pub name: Name,
    pub min_arity: usize,
    pub max_arity: Option<usize>,
    pub callable: Callable<N>,
    pub description: Option<String>,
}

impl<N: Node> ExtensionFunction<N> {
    pub fn new(name: Name, arity: usize, callable: Callable<N>) -> Self {
        Self {
            name,
            min_arity: arity,
            max_arity: Some(arity),
            callable,
            description: None,
        }
    }

    pub fn with_arity_range(mut self, min_arity: usize, max_arity: Option<usize>) -> Self {
        self.min_arity = min_arity;
        self.max_arity = max_arity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `cache ∈ {true, false, cache-instance}` (spec.md §6).
#[derive(Clone)]
pub enum CacheMode {
    Disabled,
    Enabled,
    Shared(Rc<ExpressionCache>),
}

impl Default for CacheMode {
    fn default() -> Self {
        CacheMode::Disabled
    }
}

/// The recognized configuration set of spec.md §6, generic over the host's
/// node type since extension callables close over it.
pub struct Options<N: Node> {
    pub version: Version,
    /// `false` by default for 2.0+ per spec.md §6; the `namespace::` axis
    /// is otherwise unreachable to the parser/evaluator.
    pub enable_namespace_axis: bool,
    pub static_namespaces: Namespaces,
    pub extensions: Vec<ExtensionFunction<N>>,
    pub cache: CacheMode,
}

impl<N: Node> Options<N> {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            // spec.md §6: the `namespace::` axis defaults to enabled only
            // under legacy XPath 1.0.
            enable_namespace_axis: version == Version::V1_0,
            static_namespaces: Namespaces::default(),
            extensions: Vec::new(),
            cache: CacheMode::Disabled,
        }
    }

    /// Register a single-arity extension function (spec.md §6
    /// `register-function(name, callable, arity-set)`).
    pub fn register_function(&mut self, name: Name, arity: usize, callable: Callable<N>) {
        self.extensions.push(ExtensionFunction::new(name, arity, callable));
    }

    pub(crate) fn extension_names_for_lexer(&self) -> Vec<String> {
        self.extensions.iter().map(|ext| ext.name.local_name().to_string()).collect()
    }
}

impl<N: Node> Default for Options<N> {
    fn default() -> Self {
        Self::new(Version::default())
    }
}
