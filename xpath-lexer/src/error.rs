/// Why [`crate::Lexer::scan`] failed, per spec.md §4.1.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexErrorReason {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated string template")]
    UnterminatedStringTemplate,
    #[error("unterminated EQName, expected a closing '}}'")]
    UnterminatedEQName,
    #[error("EQName has an empty local name")]
    EmptyEQNameLocalName,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
}

/// A scan failure: a reason plus the byte offset it occurred at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason} at offset {offset}")]
pub struct LexError {
    pub reason: LexErrorReason,
    pub offset: usize,
}
