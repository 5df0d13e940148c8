use std::fmt;

use xpath_lexer::LexError;

use crate::span::Span;

/// Static (compile-time) errors, identified by their W3C error codes where
/// one applies (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorReason {
    /// XPST0003: the expression does not conform to the grammar.
    Syntax(String),
    /// XPST0003, raised from the lexer before a token tree even exists.
    Lex(String),
    /// XPST0017: a function call resolves to no declared function of that
    /// arity.
    UnknownFunction { name: String, arity: usize },
    /// XPST0008: a QName does not resolve to an in-scope namespace, variable,
    /// or type.
    UnresolvedName(String),
    /// XPST0051: `cast`/`castable`/`instance of` named an atomic type this
    /// build does not recognize.
    UnknownAtomicType(String),
    /// XPST0010: an axis name this build does not support (reserved for
    /// forward-compatibility with axes beyond the thirteen spec.md lists).
    UnsupportedAxis(String),
    /// XPST0080: `cast as` targeted a type that can never be a cast target
    /// (e.g. `xs:NOTATION`, `xs:anyAtomicType`).
    InvalidCastTarget(String),
}

impl fmt::Display for ParseErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorReason::Syntax(msg) => write!(f, "syntax error: {msg}"),
            ParseErrorReason::Lex(msg) => write!(f, "{msg}"),
            ParseErrorReason::UnknownFunction { name, arity } => {
                write!(f, "no function named `{name}` with {arity} argument(s)")
            }
            ParseErrorReason::UnresolvedName(name) => {
                write!(f, "`{name}` does not resolve to an in-scope declaration")
            }
            ParseErrorReason::UnknownAtomicType(name) => {
                write!(f, "`{name}` is not a recognized atomic type")
            }
            ParseErrorReason::UnsupportedAxis(name) => {
                write!(f, "unsupported axis `{name}`")
            }
            ParseErrorReason::InvalidCastTarget(name) => {
                write!(f, "`{name}` cannot be used as a cast target")
            }
        }
    }
}

impl ParseErrorReason {
    /// The W3C error code this reason corresponds to, when spec.md names
    /// one.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorReason::Syntax(_) | ParseErrorReason::Lex(_) => "XPST0003",
            ParseErrorReason::UnknownFunction { .. } => "XPST0017",
            ParseErrorReason::UnresolvedName(_) => "XPST0008",
            ParseErrorReason::UnknownAtomicType(_) => "XPST0051",
            ParseErrorReason::UnsupportedAxis(_) => "XPST0010",
            ParseErrorReason::InvalidCastTarget(_) => "XPST0080",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub reason: ParseErrorReason,
    pub span: Span,
}

impl ParseError {
    pub fn new(reason: ParseErrorReason, span: Span) -> Self {
        Self { reason, span }
    }

    pub fn code(&self) -> &'static str {
        self.reason.code()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {}..{}", self.code(), self.reason, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        let span = err.offset..err.offset;
        ParseError::new(ParseErrorReason::Lex(err.to_string()), span)
    }
}
