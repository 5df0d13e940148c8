//! Argument coercion shared by the evaluator and the built-in function
//! library (spec.md §4.5: "sequence-to-singleton coercion is performed by
//! the evaluator before the call according to the declared signature").
//! Kept separate from both `eval` and `function` so neither has to depend
//! on the other just for these helpers.

use xpath_schema_type::Xs;

use crate::atomic::AtomicValue;
use crate::context::DynamicContext;
use crate::error::{Error, SpannedError};
use crate::item::Item;
use crate::node::Node;
use crate::sequence::Sequence;

/// `fn:data()` / atomization: replace every node in the sequence with its
/// typed value (or, absent one, its string value as `xs:untypedAtomic`),
/// passing atomic items through unchanged.
pub fn atomize<N: Node>(seq: &Sequence<N>) -> Sequence<N> {
    seq.iter()
        .map(|item| match item {
            Item::Node(node) => {
                let value = node.typed_value().unwrap_or_else(|| node.string_value());
                Item::Atomic(AtomicValue::UntypedAtomic(value))
            }
            other => other.clone(),
        })
        .collect()
}

/// Atomize, then require exactly one resulting atomic item
/// ([`Error::XPTY0004`] otherwise) — the coercion a `(item()?) as xs:...`
/// parameter signature performs.
pub fn singleton_atomic<N: Node>(seq: &Sequence<N>) -> Result<AtomicValue, SpannedError> {
    let atomized = atomize(seq);
    match atomized.into_vec().as_slice() {
        [Item::Atomic(value)] => Ok(value.clone()),
        _ => Err(SpannedError::unspanned(Error::XPTY0004)),
    }
}

/// As [`singleton_atomic`], but an empty sequence is allowed and yields
/// `None` (an `xs:...?` parameter signature).
pub fn optional_singleton_atomic<N: Node>(seq: &Sequence<N>) -> Result<Option<AtomicValue>, SpannedError> {
    if seq.is_empty() {
        return Ok(None);
    }
    singleton_atomic(seq).map(Some)
}

pub fn singleton_string<N: Node>(seq: &Sequence<N>) -> Result<String, SpannedError> {
    let value = singleton_atomic(seq)?;
    value
        .cast(Xs::String)
        .map(|v| v.display_string())
        .map_err(SpannedError::unspanned)
}

pub fn optional_singleton_string<N: Node>(seq: &Sequence<N>) -> Result<Option<String>, SpannedError> {
    if seq.is_empty() {
        return Ok(None);
    }
    singleton_string(seq).map(Some)
}

pub fn singleton_double<N: Node>(seq: &Sequence<N>) -> Result<f64, SpannedError> {
    let value = singleton_atomic(seq)?;
    let cast = value.cast(Xs::Double).map_err(SpannedError::unspanned)?;
    match cast {
        AtomicValue::Double(d) => Ok(d.0),
        _ => unreachable!("cast(Xs::Double) always returns AtomicValue::Double"),
    }
}

/// Requires the singleton to already be (derived from) `xs:integer` —
/// unlike [`singleton_string`]/[`singleton_double`], this does not cast a
/// merely-castable value, since the range operator `to` (spec.md §4.6)
/// must reject a non-integer operand with `XPTY0004`, not the `FORG0001`
/// a lenient cast through a non-integral double would raise.
pub fn singleton_integer<N: Node>(seq: &Sequence<N>) -> Result<ibig::IBig, SpannedError> {
    let value = singleton_atomic(seq)?;
    if !value.schema_type().derives_from(Xs::Integer) {
        return Err(SpannedError::unspanned(Error::XPTY0004));
    }
    match value {
        AtomicValue::Integer(i, _) => Ok(i),
        _ => unreachable!("derives_from(Xs::Integer) only holds for AtomicValue::Integer"),
    }
}

/// Effective boolean value, honoring the dynamic context's XPath version
/// (spec.md §4.7: a 1.0 context treats any non-empty node sequence as
/// true, not just a singleton).
pub fn singleton_boolean<N: Node>(seq: &Sequence<N>, ctx: &DynamicContext<N>) -> Result<bool, SpannedError> {
    seq.effective_boolean_value_for_version(ctx.xpath_version, &ctx.warnings)
        .map_err(SpannedError::unspanned)
}
