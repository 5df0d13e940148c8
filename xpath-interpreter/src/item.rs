//! The `Item` tagged union (spec.md §3 "Result"/glossary "Item"): a node
//! handle, an atomic value, a function item, a map, or an array. Re-architects
//! the teacher's runtime-shape-checked `sequence::Item` (`xee-interpreter`)
//! as an exhaustively matched enum, per spec.md §9 "Dynamic dispatch".

use std::rc::Rc;

use xpath_ast::ast::XPath;
use xpath_name::Name;

use crate::atomic::AtomicValue;
use crate::context::DynamicContext;
use crate::error::SpannedError;
use crate::node::Node;

/// One item of a sequence.
#[derive(Debug, Clone)]
pub enum Item<N: Node> {
    Node(N),
    Atomic(AtomicValue),
    Function(Rc<FunctionItem<N>>),
    Map(Rc<MapItem<N>>),
    Array(Rc<ArrayItem<N>>),
}

impl<N: Node> PartialEq for Item<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Node(a), Item::Node(b)) => a == b,
            (Item::Atomic(a), Item::Atomic(b)) => a == b,
            (Item::Map(a), Item::Map(b)) => Rc::ptr_eq(a, b),
            (Item::Array(a), Item::Array(b)) => Rc::ptr_eq(a, b),
            (Item::Function(a), Item::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<N: Node> Item<N> {
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            Item::Atomic(a) => Some(a),
            _ => None,
        }
    }
}

/// A captured closure: a user-defined inline function, a named-function
/// reference (`name#arity`), or a host-registered built-in bound as an
/// item via `#` (spec.md §4.6 "Function item").
pub struct FunctionItem<N: Node> {
    pub arity: u8,
    pub kind: FunctionItemKind<N>,
}

impl<N: Node> std::fmt::Debug for FunctionItem<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionItem").field("arity", &self.arity).finish()
    }
}

pub enum FunctionItemKind<N: Node> {
    /// An inline function literal, closing over the bindings visible at the
    /// point it was written (spec.md §4.6).
    Inline {
        params: Vec<Name>,
        body: XPath,
        captured: DynamicContext<N>,
    },
    /// `name#arity`, or a host builtin bound the same way: resolved lazily
    /// against the registry at call time so registry mutations after
    /// binding are observed, matching a plain name-plus-arity handle.
    Named { name: Name },
}

/// A map item: an *ordered* sequence of key/value pairs, keys compared by
/// atomic equality (spec.md §3 "Result"). Insertion order is preserved for
/// iteration; lookup uses `atomic_eq`, not `Vec` position.
#[derive(Debug)]
pub struct MapItem<N: Node> {
    pub entries: Vec<(AtomicValue, crate::sequence::Sequence<N>)>,
}

impl<N: Node> MapItem<N> {
    pub fn get(&self, key: &AtomicValue) -> Option<&crate::sequence::Sequence<N>> {
        self.entries
            .iter()
            .find(|(k, _)| crate::eval::compare::atomic_eq(k, key).unwrap_or(false))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other`'s entries on top of `self`'s (later bindings for a
    /// duplicate key win), mirroring `map:merge`'s default
    /// `duplicates="use-last"` option.
    pub fn merged_with(&self, other: &MapItem<N>) -> MapItem<N> {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            if let Some(existing) = entries.iter_mut().find(|(k, _)| crate::eval::compare::atomic_eq(k, key).unwrap_or(false)) {
                existing.1 = value.clone();
            } else {
                entries.push((key.clone(), value.clone()));
            }
        }
        MapItem { entries }
    }
}

impl<N: Node> Clone for MapItem<N> {
    fn clone(&self) -> Self {
        MapItem {
            entries: self.entries.clone(),
        }
    }
}

/// A 1-indexed array item (spec.md §4.6 "Maps and arrays").
#[derive(Debug, Clone)]
pub struct ArrayItem<N: Node> {
    pub members: Vec<crate::sequence::Sequence<N>>,
}

impl<N: Node> ArrayItem<N> {
    /// Out-of-bounds lookups surface as [`crate::error::Error::XPTY0004`]:
    /// the W3C array-index code `FOAY0001` falls outside spec.md §6's
    /// closed error-code surface, so this core reports the closest code it
    /// carries (documented in DESIGN.md).
    pub fn get(&self, index: i64) -> Result<&crate::sequence::Sequence<N>, SpannedError> {
        if index < 1 || index as usize > self.members.len() {
            return Err(SpannedError::unspanned(crate::error::Error::XPTY0004));
        }
        Ok(&self.members[index as usize - 1])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
