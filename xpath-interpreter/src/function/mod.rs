//! The function registry (spec.md §4.5): a single `qualified-name ->
//! callable(context, args...) -> value` mapping, built-ins registered per
//! selected version, extensions added via [`FunctionRegistry::register`].
//! Grounded on the teacher's `xee-interpreter::function` module family
//! (`static_function.rs`'s name+arity keyed dispatch), generalized to a
//! plain `Rc<dyn Fn>` table since this core has no bytecode compiler to
//! feed function pointers into.

mod builtins;

use std::collections::HashMap;
use std::rc::Rc;

use xpath_lexer::Version;
use xpath_name::Name;

use crate::context::DynamicContext;
use crate::error::{Error, SpannedError};
use crate::node::Node;
use crate::sequence::Sequence;

/// A registered function's implementation: already-evaluated argument
/// values in, a result sequence (or error) out (spec.md §4.5).
pub type Callable<N> = Rc<dyn Fn(&DynamicContext<N>, &[Sequence<N>]) -> Result<Sequence<N>, SpannedError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FunctionKey {
    name_key: (String, Option<String>),
    arity: usize,
}

fn key_for(name: &Name, arity: usize) -> FunctionKey {
    FunctionKey {
        name_key: (name.local_name().to_string(), name.namespace().map(str::to_string)),
        arity,
    }
}

/// Maps `(qualified-name, arity) -> Callable`. Built-ins are marked
/// reserved at registration time so host extensions attempting to shadow
/// them fail with [`Error::XPST0017`] (spec.md §4.5).
pub struct FunctionRegistry<N: Node> {
    entries: HashMap<FunctionKey, Callable<N>>,
    reserved: std::collections::HashSet<(String, Option<String>)>,
}

impl<N: Node> FunctionRegistry<N> {
    pub fn new() -> Self {
        FunctionRegistry {
            entries: HashMap::new(),
            reserved: std::collections::HashSet::new(),
        }
    }

    /// Build a registry with the built-in function library appropriate to
    /// `version` already registered and reserved (spec.md §4.5 "Built-ins
    /// are registered at construction per selected version").
    pub fn with_builtins(version: Version) -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry, version);
        registry
    }

    fn register_internal(&mut self, name: Name, arity: usize, callable: Callable<N>, reserve: bool) {
        let name_key = (name.local_name().to_string(), name.namespace().map(str::to_string));
        if reserve {
            self.reserved.insert(name_key);
        }
        self.entries.insert(key_for(&name, arity), callable);
    }

    pub(crate) fn register_builtin(&mut self, name: Name, arity: usize, callable: Callable<N>) {
        self.register_internal(name, arity, callable, true);
    }

    /// Register a host extension function for one arity. Fails with
    /// [`Error::XPST0017`] if `name` is already a reserved built-in name
    /// (spec.md §4.5: "Reserved built-in names ... must never be shadowed
    /// by extensions").
    pub fn register(&mut self, name: Name, arity: usize, callable: Callable<N>) -> Result<(), Error> {
        let name_key = (name.local_name().to_string(), name.namespace().map(str::to_string));
        if self.reserved.contains(&name_key) {
            return Err(Error::XPST0017);
        }
        self.register_internal(name, arity, callable, false);
        Ok(())
    }

    /// Register one callable across an inclusive arity range, for
    /// extensions with a `{min-arity, max-arity?}` signature (spec.md §6
    /// "Configuration options" `extensions`).
    pub fn register_arity_range(
        &mut self,
        name: Name,
        min_arity: usize,
        max_arity: usize,
        callable: Callable<N>,
    ) -> Result<(), Error> {
        for arity in min_arity..=max_arity {
            self.register(name.clone(), arity, callable.clone())?;
        }
        Ok(())
    }

    /// Dispatch by name then arity. [`Error::XPST0017`] if no arity
    /// matches (spec.md §4.5).
    pub fn resolve(&self, name: &Name, arity: usize) -> Result<Callable<N>, Error> {
        self.entries.get(&key_for(name, arity)).cloned().ok_or(Error::XPST0017)
    }

    pub fn is_registered(&self, name: &Name, arity: usize) -> bool {
        self.entries.contains_key(&key_for(name, arity))
    }
}

impl<N: Node> Default for FunctionRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testtree::TestNode;

    #[test]
    fn extension_cannot_shadow_a_reserved_builtin_name() {
        let mut registry: FunctionRegistry<TestNode> = FunctionRegistry::with_builtins(Version::V3_1);
        let name = Name::new("concat", Some(xpath_name::FN_NAMESPACE.to_string()), Some("fn".to_string()));
        let err = registry
            .register(name, 2, Rc::new(|_, _| Ok(Sequence::empty())))
            .unwrap_err();
        assert_eq!(err, Error::XPST0017);
    }

    #[test]
    fn unresolved_arity_is_xpst0017() {
        let registry: FunctionRegistry<TestNode> = FunctionRegistry::with_builtins(Version::V1_0);
        let name = Name::new("concat", Some(xpath_name::FN_NAMESPACE.to_string()), Some("fn".to_string()));
        assert_eq!(registry.resolve(&name, 200).unwrap_err(), Error::XPST0017);
    }
}
