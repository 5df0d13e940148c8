//! A [`Sequence`] is the engine's uniform result shape (spec.md §3
//! "Result"): zero or more [`Item`]s. XPath 1.0 node-sets and XPath 2.0+
//! sequences share this representation; the coercion rules that
//! distinguish them (spec.md §4.7) live in the evaluator, not here.

use xpath_lexer::Version;

use crate::atomic::AtomicValue;
use crate::error::Error;
use crate::item::Item;
use crate::node::Node;
use crate::warning::{Category, Severity, Warning, WarningChannel};

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<N: Node>(Vec<Item<N>>);

impl<N: Node> Sequence<N> {
    pub fn empty() -> Self {
        Sequence(Vec::new())
    }

    pub fn single(item: Item<N>) -> Self {
        Sequence(vec![item])
    }

    pub fn from_items(items: Vec<Item<N>>) -> Self {
        Sequence(items)
    }

    pub fn from_atomic(value: AtomicValue) -> Self {
        Sequence(vec![Item::Atomic(value)])
    }

    pub fn boolean(value: bool) -> Self {
        Self::from_atomic(AtomicValue::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::from_atomic(AtomicValue::String(value.into(), xpath_schema_type::Xs::String))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item<N>> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Item<N>> {
        self.0
    }

    pub fn as_slice(&self) -> &[Item<N>] {
        &self.0
    }

    pub fn push(&mut self, item: Item<N>) {
        self.0.push(item);
    }

    pub fn extend(&mut self, other: Sequence<N>) {
        self.0.extend(other.0);
    }

    pub fn concat(sequences: impl IntoIterator<Item = Sequence<N>>) -> Self {
        let mut items = Vec::new();
        for seq in sequences {
            items.extend(seq.0);
        }
        Sequence(items)
    }

    /// `eq/ne/...` and single-value contexts require a singleton;
    /// multi-item sequences fail with [`Error::XPTY0004`].
    pub fn require_singleton(&self) -> Result<&Item<N>, Error> {
        match self.0.as_slice() {
            [item] => Ok(item),
            _ => Err(Error::XPTY0004),
        }
    }

    pub fn first(&self) -> Option<&Item<N>> {
        self.0.first()
    }

    /// Effective boolean value per spec.md §4.6: empty sequence -> false;
    /// a single boolean -> itself; a single numeric -> `not NaN and != 0`;
    /// a single string -> `length > 0`; a single node -> true; anything
    /// else -> [`Error::FORG0006`].
    pub fn effective_boolean_value(&self) -> Result<bool, Error> {
        match self.0.as_slice() {
            [] => Ok(false),
            [Item::Node(_)] => Ok(true),
            [Item::Atomic(AtomicValue::Boolean(b))] => Ok(*b),
            [Item::Atomic(AtomicValue::String(s, _))] | [Item::Atomic(AtomicValue::UntypedAtomic(s))] => {
                Ok(!s.is_empty())
            }
            [Item::Atomic(value)] if value.is_numeric() => Ok(is_nonzero_numeric(value)),
            _ => Err(Error::FORG0006),
        }
    }

    /// Effective boolean value, version-gated per spec.md §4.7: under
    /// XPath 1.0, a node-set's EBV is simply "is it non-empty", even for
    /// more than one node; under 2.0+ only a *singleton* node coerces
    /// implicitly (anything longer falls through to
    /// [`Error::FORG0006`] via [`Self::effective_boolean_value`]).
    pub fn effective_boolean_value_for_version(&self, version: Version, warnings: &WarningChannel) -> Result<bool, Error> {
        if version == Version::V1_0 && !self.0.is_empty() && self.0.iter().all(|item| matches!(item, Item::Node(_))) {
            if self.0.len() > 1 {
                warnings.emit(Warning::new(
                    Severity::Warning,
                    Category::Compatibility,
                    format!(
                        "effective boolean value of a {}-node sequence coerced to true under XPath 1.0 node-set rules",
                        self.0.len()
                    ),
                ));
            }
            return Ok(true);
        }
        self.effective_boolean_value()
    }

    /// Sorts by document order and removes duplicates by node identity
    /// (spec.md invariant ii). Panics (in debug) if a non-node item is
    /// present; callers that might mix items must check first and raise
    /// [`Error::XPTY0018`] themselves.
    pub fn into_document_order(mut self) -> Result<Self, Error> {
        let mut keys: Vec<(N::Key, usize)> = Vec::with_capacity(self.0.len());
        for (idx, item) in self.0.iter().enumerate() {
            match item {
                Item::Node(n) => keys.push((n.document_order_key(), idx)),
                _ => return Err(Error::XPTY0018),
            }
        }
        keys.sort_by_key(|(key, _)| *key);
        keys.dedup_by_key(|(key, _)| *key);
        let items = std::mem::take(&mut self.0);
        let mut items: Vec<Option<Item<N>>> = items.into_iter().map(Some).collect();
        let ordered = keys
            .into_iter()
            .map(|(_, idx)| items[idx].take().expect("index referenced once"))
            .collect();
        Ok(Sequence(ordered))
    }
}

fn is_nonzero_numeric(value: &AtomicValue) -> bool {
    match value {
        AtomicValue::Integer(i, _) => *i != ibig::IBig::from(0),
        AtomicValue::Decimal(d) => !d.is_zero(),
        AtomicValue::Float(f) => f.0 != 0.0 && !f.0.is_nan(),
        AtomicValue::Double(d) => d.0 != 0.0 && !d.0.is_nan(),
        _ => false,
    }
}

impl<N: Node> FromIterator<Item<N>> for Sequence<N> {
    fn from_iter<I: IntoIterator<Item = Item<N>>>(iter: I) -> Self {
        Sequence(iter.into_iter().collect())
    }
}

impl<N: Node> IntoIterator for Sequence<N> {
    type Item = Item<N>;
    type IntoIter = std::vec::IntoIter<Item<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testtree::TestNode;

    #[test]
    fn empty_sequence_ebv_is_false() {
        let seq: Sequence<TestNode> = Sequence::empty();
        assert_eq!(seq.effective_boolean_value(), Ok(false));
    }

    #[test]
    fn non_empty_string_ebv_is_length_based() {
        let seq: Sequence<TestNode> = Sequence::string("");
        assert_eq!(seq.effective_boolean_value(), Ok(false));
        let seq: Sequence<TestNode> = Sequence::string("x");
        assert_eq!(seq.effective_boolean_value(), Ok(true));
    }

    #[test]
    fn two_atomics_have_no_ebv() {
        let seq: Sequence<TestNode> = Sequence::from_items(vec![
            Item::Atomic(AtomicValue::Boolean(true)),
            Item::Atomic(AtomicValue::Boolean(false)),
        ]);
        assert_eq!(seq.effective_boolean_value(), Err(Error::FORG0006));
    }
}
