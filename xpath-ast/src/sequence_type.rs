use xpath_schema_type::Xs;

use crate::node_test::KindTest;

/// `(item-type, cardinality)` (spec.md glossary "Sequence type").
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceType {
    /// `empty-sequence()`.
    Empty,
    Item {
        item_type: ItemType,
        occurrence: Occurrence,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// No suffix: exactly one.
    ExactlyOne,
    /// `?`: zero-or-one.
    ZeroOrOne,
    /// `*`: zero-or-more.
    ZeroOrMore,
    /// `+`: one-or-more.
    OneOrMore,
}

impl Occurrence {
    pub fn allows_many(&self) -> bool {
        matches!(self, Occurrence::ZeroOrMore | Occurrence::OneOrMore)
    }

    pub fn allows_zero(&self) -> bool {
        matches!(self, Occurrence::ZeroOrOne | Occurrence::ZeroOrMore)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemType {
    /// The unconstrained `item()` type.
    Item,
    AtomicOrUnion(Xs),
    Kind(KindTest),
    Function(FunctionTest),
    Map(MapTest),
    Array(ArrayTest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionTest {
    Any,
    Typed {
        parameter_types: Vec<SequenceType>,
        return_type: Box<SequenceType>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapTest {
    Any,
    Typed { key_type: Xs, value_type: Box<SequenceType> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayTest {
    Any,
    Typed(Box<SequenceType>),
}

/// `as xs:string?` etc., used by `cast`/`castable` (a single atomic type
/// plus an optional-occurrence flag, not a full [`SequenceType`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SingleType {
    pub name: Xs,
    pub optional: bool,
}
