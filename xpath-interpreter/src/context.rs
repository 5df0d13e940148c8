//! The dynamic context (spec.md §3 "Context"): externally supplied,
//! read-only for a single evaluation; `for`/`let`/`some`/`every` extend it
//! only through cheap shadowing (a new binding layered on top), never by
//! mutating the caller's context. Grounded on the teacher's
//! `xee-interpreter::context::dynamic_context` (which keeps a `Cow` over a
//! shared `AHashMap` of variables); this crate goes one step further and
//! makes every field `Rc`-shared so a whole `DynamicContext` is cheap to
//! clone into a captured inline-function closure (spec.md §4.6 "Function
//! item").

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use ahash::AHashMap;

use xpath_lexer::Version;
use xpath_name::Name;

use crate::error::Error;
use crate::function::FunctionRegistry;
use crate::item::Item;
use crate::node::Node;
use crate::sequence::Sequence;
use crate::warning::WarningChannel;

/// A cooperative cancellation signal checked at step/predicate/call
/// boundaries (spec.md §5 "Cancellation").
#[derive(Clone)]
pub enum CancelSignal {
    Deadline(Instant),
    Token(Arc<AtomicBool>),
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        match self {
            CancelSignal::Deadline(at) => Instant::now() >= *at,
            CancelSignal::Token(flag) => flag.load(AtomicOrdering::Relaxed),
        }
    }
}

/// One `let`/`for`/`some`/`every`/inline-function-parameter binding,
/// chained to its enclosing scope so lookups walk a linked list rather than
/// copying a map per binding (spec.md invariant: "new bindings extend
/// [the context] via cheap shadowing").
struct Scope<N: Node> {
    name: Name,
    value: Sequence<N>,
    parent: Option<Rc<Scope<N>>>,
}

#[derive(Clone)]
pub struct Variables<N: Node>(Option<Rc<Scope<N>>>);

impl<N: Node> Variables<N> {
    pub fn new() -> Self {
        Variables(None)
    }

    pub fn get(&self, name: &Name) -> Option<&Sequence<N>> {
        let mut current = self.0.as_ref();
        while let Some(scope) = current {
            if &scope.name == name {
                return Some(&scope.value);
            }
            current = scope.parent.as_ref();
        }
        None
    }

    pub fn shadowed(&self, name: Name, value: Sequence<N>) -> Self {
        Variables(Some(Rc::new(Scope {
            name,
            value,
            parent: self.0.clone(),
        })))
    }
}

impl<N: Node> Default for Variables<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// `{context-item, context-position, context-size, variables, functions,
/// collections, documents, system-properties, keys, document-loader?,
/// xpath-version, static-base-uri?}` (spec.md §3).
#[derive(Clone)]
pub struct DynamicContext<N: Node> {
    pub context_item: Option<Item<N>>,
    pub context_position: usize,
    pub context_size: usize,
    pub variables: Variables<N>,
    pub functions: Rc<FunctionRegistry<N>>,
    pub collections: Rc<AHashMap<String, Sequence<N>>>,
    pub documents: Rc<AHashMap<String, Option<N>>>,
    pub system_properties: Rc<AHashMap<String, String>>,
    pub keys: Rc<AHashMap<String, AHashMap<String, Sequence<N>>>>,
    pub document_loader: Option<Rc<dyn Fn(&str) -> Option<N>>>,
    pub xpath_version: Version,
    pub static_base_uri: Option<String>,
    pub cancel: Option<CancelSignal>,
    /// Recursion depth bound (spec.md §5 "Resource limits"; default 256).
    pub recursion_limit: usize,
    /// Where non-fatal diagnostics go (spec.md §7 "Warnings"). Shared
    /// (not cloned-per-scope) so a warning emitted deep inside a `for`
    /// body still reaches whatever the caller subscribed at the root.
    pub warnings: WarningChannel,
}

/// spec.md §5: "Recursion depth is bounded (implementation default >= 256)".
pub const DEFAULT_RECURSION_LIMIT: usize = 256;

impl<N: Node> DynamicContext<N> {
    pub fn new(functions: Rc<FunctionRegistry<N>>, xpath_version: Version) -> Self {
        Self {
            context_item: None,
            context_position: 1,
            context_size: 1,
            variables: Variables::new(),
            functions,
            collections: Rc::new(AHashMap::new()),
            documents: Rc::new(AHashMap::new()),
            system_properties: Rc::new(AHashMap::new()),
            keys: Rc::new(AHashMap::new()),
            document_loader: None,
            xpath_version,
            static_base_uri: None,
            cancel: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            warnings: WarningChannel::new(),
        }
    }

    /// As [`Self::new`], but sharing an existing [`WarningChannel`] (so a
    /// host can subscribe once per [`crate::function::FunctionRegistry`]
    /// lifetime rather than per evaluation).
    pub fn with_warnings(functions: Rc<FunctionRegistry<N>>, xpath_version: Version, warnings: WarningChannel) -> Self {
        let mut ctx = Self::new(functions, xpath_version);
        ctx.warnings = warnings;
        ctx
    }

    pub fn with_context_item(&self, item: Item<N>, position: usize, size: usize) -> Self {
        let mut clone = self.clone();
        clone.context_item = Some(item);
        clone.context_position = position;
        clone.context_size = size;
        clone
    }

    pub fn with_variable(&self, name: Name, value: Sequence<N>) -> Self {
        let mut clone = self.clone();
        clone.variables = clone.variables.shadowed(name, value);
        clone
    }

    /// [`Error::XPDY0002`] if the context item is absent (`.` used with no
    /// focus, spec.md §7).
    pub fn require_context_item(&self) -> Result<&Item<N>, Error> {
        self.context_item.as_ref().ok_or(Error::XPDY0002)
    }

    /// Checked before each step, predicate, and function call (spec.md §5).
    pub fn check_cancelled(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(signal) if signal.is_cancelled() => Err(Error::EvalCancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testtree::TestNode;

    #[test]
    fn shadowed_variable_is_visible_and_outer_still_reachable_after_unshadowing() {
        let vars: Variables<TestNode> = Variables::new();
        let name_x = Name::unprefixed("x");
        let vars = vars.shadowed(name_x.clone(), Sequence::string("outer"));
        let inner = vars.shadowed(name_x.clone(), Sequence::string("inner"));
        assert_eq!(inner.get(&name_x).unwrap(), &Sequence::string("inner"));
        assert_eq!(vars.get(&name_x).unwrap(), &Sequence::string("outer"));
    }
}
