/// Every binary operator in the precedence table of spec.md §4.2, from
/// `or` (lowest) down to union/intersect/except (highest of the binary
/// tier; unary/path/filter bind tighter still and aren't modeled as binary
/// operators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,

    GenEq,
    GenNe,
    GenLt,
    GenLe,
    GenGt,
    GenGe,
    ValueEq,
    ValueNe,
    ValueLt,
    ValueLe,
    ValueGt,
    ValueGe,
    Is,
    Precedes,
    Follows,

    Concat,

    Range,

    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,

    Union,
    Intersect,
    Except,
}

impl BinaryOperator {
    /// True for `eq/ne/lt/le/gt/ge` — singleton, typed comparisons (spec.md
    /// §4.6).
    pub fn is_value_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(self, ValueEq | ValueNe | ValueLt | ValueLe | ValueGt | ValueGe)
    }

    /// True for `=/!=/</<=/>/>=` — existential, promoting comparisons.
    pub fn is_general_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(self, GenEq | GenNe | GenLt | GenLe | GenGt | GenGe)
    }
}

/// Prefix `+`/`-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
}
