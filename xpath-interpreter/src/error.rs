//! The closed error taxonomy of spec.md §7: every fallible operation in
//! this crate returns `Result<T, SpannedError>` rather than throwing,
//! mirroring the teacher's `xee-interpreter::error` module (`strum`-derived
//! `Display`/`EnumMessage` over a flat `Error` enum, wrapped with an
//! optional span).

use strum::EnumMessage;
use strum_macros::{Display, EnumMessage};

use xpath_ast::span::Span;

/// An [`Error`] paired with the source range it occurred at, when one is
/// known. Dynamic errors raised deep inside a host function call may have
/// no span of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedError {
    pub error: Error,
    pub span: Option<Span>,
}

impl SpannedError {
    pub fn new(error: Error, span: Option<Span>) -> Self {
        Self { error, span }
    }

    pub fn spanned(error: Error, span: Span) -> Self {
        Self::new(error, Some(span))
    }

    pub fn unspanned(error: Error) -> Self {
        Self::new(error, None)
    }

    /// The W3C error code, e.g. `"XPTY0004"`.
    pub fn code(&self) -> String {
        self.error.code()
    }
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(span) => write!(f, "[{}] {} at {}..{}", self.code(), self.error, span.start, span.end),
            None => write!(f, "[{}] {}", self.code(), self.error),
        }
    }
}

impl std::error::Error for SpannedError {}

impl From<xpath_ast::error::ParseError> for SpannedError {
    /// Lexer/parser failures and evaluator failures share one W3C error
    /// code space (spec.md §7), so a host driving `compile` then
    /// `evaluate` can propagate both through the same `Result` without an
    /// intermediate enum (spec.md §6 "compile(source, version, options) ->
    /// expression").
    fn from(err: xpath_ast::error::ParseError) -> Self {
        use xpath_ast::error::ParseErrorReason::*;
        let error = match &err.reason {
            Syntax(_) | Lex(_) => Error::XPST0003,
            UnknownFunction { .. } => Error::XPST0017,
            UnresolvedName(_) => Error::XPST0008,
            UnknownAtomicType(_) => Error::XPST0051,
            UnsupportedAxis(_) => Error::XPST0010,
            InvalidCastTarget(_) => Error::XPST0080,
        };
        SpannedError::spanned(error, err.span.clone())
    }
}

/// The flat W3C/project error taxonomy (spec.md §7). Every variant's doc
/// comment is its human-readable message, surfaced through
/// [`strum::EnumMessage::get_message`].
#[derive(Debug, Clone, PartialEq, Display, EnumMessage)]
pub enum Error {
    /// a component of the static context is absent
    XPST0001,
    /// the expression does not conform to the grammar
    XPST0003,
    /// the static type of an expression is empty-sequence() where that is disallowed
    XPST0005,
    /// the name does not resolve to an in-scope declaration
    XPST0008,
    /// the namespace axis is not supported in this configuration
    XPST0010,
    /// no function with this name and arity is registered, or an extension attempted to shadow a reserved name
    XPST0017,
    /// the named atomic type is not recognized
    XPST0051,
    /// the named type can never be a cast target
    XPST0080,
    /// the dynamic context is missing a component an expression relies on
    XPDY0002,
    /// the context item is not a node in the document the expression requires
    XPDY0050,
    /// an operand's dynamic type or cardinality does not match what the operator requires
    XPTY0004,
    /// a path expression's result mixes nodes and non-nodes
    XPTY0018,
    /// a path operator's left-hand operand did not evaluate to a sequence of nodes
    XPTY0019,
    /// the context item is not a node in an axis step
    XPTY0020,
    /// the value is not castable to the target type
    FORG0001,
    /// a function argument is not a value of the expected type
    FORG0003,
    /// a function argument's zero-length string prevents the requested operation
    FORG0004,
    /// an operation requiring two operands of compatible type was given incompatible operands
    FORG0005,
    /// the effective boolean value of the operand sequence is not defined
    FORG0006,
    /// the item is not appropriate for this operation's type
    FOTY0012,
    /// an invalid duration/date/time value or overflow was encountered
    FODT0002,
    /// division by zero (integer/decimal division)
    FOAR0001,
    /// numeric operation overflow or underflow
    FOAR0002,
    /// an error raised by a host-registered extension function that was not itself a typed XPath error
    FOER0000,
    /// evaluation was aborted by a cooperative cancellation signal
    EvalCancelled,
    /// recursion depth exceeded the configured limit
    RecursionLimit,
}

impl Error {
    /// The W3C error code this variant corresponds to (its own name, for
    /// the standard codes; a project-specific tag for the two structural
    /// aborts spec.md §7 lists without a W3C code).
    pub fn code(&self) -> String {
        match self {
            Error::EvalCancelled => "eval-cancelled".to_string(),
            Error::RecursionLimit => "eval-error{recursion-limit}".to_string(),
            other => other.to_string(),
        }
    }

    /// The human-readable message from this variant's doc comment.
    pub fn message(&self) -> &str {
        self.get_documentation().unwrap_or("unspecified error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_variant_name_for_w3c_errors() {
        assert_eq!(Error::XPTY0004.code(), "XPTY0004");
        assert_eq!(Error::FOAR0001.code(), "FOAR0001");
    }

    #[test]
    fn structural_aborts_use_project_tags() {
        assert_eq!(Error::EvalCancelled.code(), "eval-cancelled");
        assert_eq!(Error::RecursionLimit.code(), "eval-error{recursion-limit}");
    }

    #[test]
    fn spanned_error_displays_code_and_range() {
        let err = SpannedError::spanned(Error::XPTY0004, 3..7);
        assert_eq!(err.to_string(), "[XPTY0004] an operand's dynamic type or cardinality does not match what the operator requires at 3..7");
    }
}
