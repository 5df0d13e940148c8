use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use xpath_name::Name;

use crate::node_test::{Axis, NodeTest};
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::sequence_type::{SequenceType, SingleType};
use crate::span::Spanned;

pub type ExprS = Spanned<Expr>;
pub type ExprSingleS = Spanned<ExprSingle>;
pub type NameS = Spanned<Name>;

/// A sequence constructor: a comma-separated list of `ExprSingle`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr(pub Vec<ExprSingleS>);

/// The root of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath(pub ExprS);

/// Every expression form in spec.md §3's AST data model, minus path steps
/// (which live under [`PathExpr`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ExprSingle {
    Path(PathExpr),
    Binary(BinaryExpr),
    Unary {
        operators: Vec<UnaryOperator>,
        operand: Box<ExprSingleS>,
    },
    SimpleMap(Vec<ExprSingleS>),
    InstanceOf {
        operand: Box<ExprSingleS>,
        sequence_type: SequenceType,
    },
    TreatAs {
        operand: Box<ExprSingleS>,
        sequence_type: SequenceType,
    },
    CastAs {
        operand: Box<ExprSingleS>,
        single_type: SingleType,
    },
    CastableAs {
        operand: Box<ExprSingleS>,
        single_type: SingleType,
    },
    Arrow {
        source: Box<ExprSingleS>,
        target: ArrowTarget,
        arguments: Vec<ExprSingleS>,
    },
    For(BindingExpr),
    Let(BindingExpr),
    Quantified {
        quantifier: Quantifier,
        bindings: Vec<(NameS, ExprSingleS)>,
        satisfies: Box<ExprSingleS>,
    },
    If(IfExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowTarget {
    Name(NameS),
    VarRef(NameS),
    Parenthesized(Box<ExprSingleS>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    Every,
}

/// `for $x in E1, $y in E2 return body` / `let $x := E1, $y := E2 return
/// body`: a left-to-right list of bindings plus a body, per spec.md §4.3.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingExpr {
    pub bindings: Vec<(NameS, ExprSingleS)>,
    pub body: Box<ExprSingleS>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<ExprS>,
    pub then_branch: Box<ExprSingleS>,
    pub else_branch: Box<ExprSingleS>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<ExprSingleS>,
    pub right: Box<ExprSingleS>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    /// Whether the path is rooted (`/foo`, `//foo`); `descendant-or-self`
    /// is synthesized by the parser for a leading `//` (spec.md §4.6).
    pub rooted: bool,
    pub steps: Vec<StepExprS>,
}

pub type StepExprS = Spanned<StepExpr>;

#[derive(Debug, Clone, PartialEq)]
pub enum StepExpr {
    Axis(AxisStep),
    Postfix {
        primary: PrimaryExprS,
        postfixes: Vec<Postfix>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisStep {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<ExprS>,
}

pub type PrimaryExprS = Spanned<PrimaryExpr>;

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryExpr {
    Literal(Literal),
    VarRef(Name),
    /// `(expr)`, or `()` for the empty sequence.
    Parenthesized(Option<ExprS>),
    ContextItem,
    FunctionCall(FunctionCall),
    NamedFunctionRef { name: Name, arity: u8 },
    InlineFunction(InlineFunction),
    MapConstructor(MapConstructor),
    ArrayConstructor(ArrayConstructor),
    UnaryLookup(KeySpecifier),
    /// A backtick string template; interpolation is evaluated as the raw
    /// captured text (spec.md §9 leaves full template semantics as a
    /// project extension outside the mandatory surface).
    StringTemplate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeySpecifier {
    NCName(String),
    Integer(IBig),
    Parenthesized(Option<ExprS>),
    Star,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(IBig),
    Decimal(Decimal),
    Double(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: NameS,
    pub arguments: Vec<ExprSingleS>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFunction {
    pub params: Vec<Param>,
    pub return_type: Option<SequenceType>,
    pub body: Option<ExprS>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Name,
    pub type_: Option<SequenceType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConstructor {
    pub entries: Vec<(ExprSingleS, ExprSingleS)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayConstructor {
    /// `[a, b, c]`: each comma-separated member is one array member.
    Square(Vec<ExprSingleS>),
    /// `array { expr }`: the expression's whole sequence becomes one array
    /// member per item.
    Curly(Option<ExprS>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Postfix {
    Predicate(ExprS),
    ArgumentList(Vec<ExprSingleS>),
    Lookup(KeySpecifier),
}
