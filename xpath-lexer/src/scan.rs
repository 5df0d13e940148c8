use ibig::IBig;
use rust_decimal::Decimal;

use crate::error::{LexError, LexErrorReason};
use crate::reserved;
use crate::token::{Token, TokenKind};
use crate::version::Version;

/// A version-bound lexer. Construction fixes the reserved-word table for
/// the lifetime of the lexer (spec.md invariant iii); `scan` can be called
/// any number of times with different source strings.
#[derive(Debug, Clone)]
pub struct Lexer {
    version: Version,
    extension_function_names: Vec<String>,
}

impl Lexer {
    /// Build a lexer for the given XPath version.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            extension_function_names: Vec::new(),
        }
    }

    /// Widen the set of identifiers classified as `function-name` tokens,
    /// for host/extension function libraries (spec.md §4.1).
    pub fn register_extension_functions<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extension_function_names
            .extend(names.into_iter().map(Into::into));
    }

    /// The version this lexer was constructed with.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The extension function names registered so far.
    pub fn extension_function_names(&self) -> &[String] {
        &self.extension_function_names
    }

    /// Scan `source` into a token sequence. Whitespace and comments are
    /// discarded; string-template interpolation is left raw for the
    /// parser.
    #[tracing::instrument(level = "trace", skip(self, source))]
    pub fn scan(&self, source: &str) -> Result<Vec<Token>, LexError> {
        Scanner::new(self.version, source).run()
    }
}

struct Scanner<'a> {
    version: Version,
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

fn is_name_start_char(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_continuation_char(c: char) -> bool {
    is_name_start_char(c) || c.is_ascii_digit() || c == '.' || c == '\u{B7}' || is_combining_mark(c)
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

impl<'a> Scanner<'a> {
    fn new(version: Version, source: &'a str) -> Self {
        Self {
            version,
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|(_, c)| *c)
    }

    fn byte_offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let Some(c) = self.peek() else { break };
            let start = self.byte_offset();
            let kind = self.scan_one(c, start)?;
            let end = self.byte_offset();
            tokens.push(Token {
                kind,
                lexeme: self.slice(start, end).to_string(),
                offset: start..end,
            });
        }
        Ok(tokens)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c == ' ' || c == '\t' || c == '\r' || c == '\n' => {
                    self.advance();
                }
                Some('(') if self.peek_at(1) == Some(':') => {
                    self.skip_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), LexError> {
        let start = self.byte_offset();
        self.advance(); // '('
        self.advance(); // ':'
        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (Some('('), Some(':')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some(':'), Some(')')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Err(LexError {
                        reason: LexErrorReason::UnterminatedComment,
                        offset: start,
                    })
                }
            }
        }
        Ok(())
    }

    fn scan_one(&mut self, c: char, start: usize) -> Result<TokenKind, LexError> {
        match c {
            '"' | '\'' => self.scan_string(c),
            '`' => self.scan_string_template(),
            '0'..='9' => Ok(self.scan_number()),
            '.' if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => Ok(self.scan_number()),
            'Q' if self.peek_at(1) == Some('{') => self.scan_eqname(start),
            c if is_name_start_char(c) => Ok(self.scan_identifier()),
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(TokenKind::NotEqual)
                } else {
                    Ok(TokenKind::ExclamationMark)
                }
            }
            '#' => {
                self.advance();
                Ok(TokenKind::Hash)
            }
            '$' => {
                self.advance();
                Ok(TokenKind::Dollar)
            }
            '(' => {
                self.advance();
                Ok(TokenKind::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(TokenKind::RightParen)
            }
            '*' => {
                self.advance();
                if self.peek() == Some(':') {
                    self.advance();
                    Ok(TokenKind::AsteriskColon)
                } else {
                    Ok(TokenKind::Asterisk)
                }
            }
            '+' => {
                self.advance();
                Ok(TokenKind::Plus)
            }
            ',' => {
                self.advance();
                Ok(TokenKind::Comma)
            }
            '-' => {
                self.advance();
                Ok(TokenKind::Minus)
            }
            '.' => {
                self.advance();
                if self.peek() == Some('.') {
                    self.advance();
                    Ok(TokenKind::DotDot)
                } else {
                    Ok(TokenKind::Dot)
                }
            }
            '/' => {
                self.advance();
                if self.peek() == Some('/') {
                    self.advance();
                    Ok(TokenKind::DoubleSlash)
                } else {
                    Ok(TokenKind::Slash)
                }
            }
            ':' => {
                self.advance();
                match self.peek() {
                    Some('*') => {
                        self.advance();
                        Ok(TokenKind::ColonAsterisk)
                    }
                    Some(':') => {
                        self.advance();
                        Ok(TokenKind::DoubleColon)
                    }
                    Some('=') => {
                        self.advance();
                        Ok(TokenKind::ColonEqual)
                    }
                    _ => Ok(TokenKind::Colon),
                }
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(TokenKind::LessThanEqual)
                    }
                    Some('<') => {
                        self.advance();
                        Ok(TokenKind::Precedes)
                    }
                    _ => Ok(TokenKind::LessThan),
                }
            }
            '=' => {
                self.advance();
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(TokenKind::Arrow)
                } else {
                    Ok(TokenKind::Equal)
                }
            }
            '>' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(TokenKind::GreaterThanEqual)
                    }
                    Some('>') => {
                        self.advance();
                        Ok(TokenKind::Follows)
                    }
                    _ => Ok(TokenKind::GreaterThan),
                }
            }
            '?' => {
                self.advance();
                Ok(TokenKind::QuestionMark)
            }
            '@' => {
                self.advance();
                Ok(TokenKind::At)
            }
            '[' => {
                self.advance();
                Ok(TokenKind::LeftBracket)
            }
            ']' => {
                self.advance();
                Ok(TokenKind::RightBracket)
            }
            '{' => {
                self.advance();
                Ok(TokenKind::LeftBrace)
            }
            '}' => {
                self.advance();
                Ok(TokenKind::RightBrace)
            }
            '|' => {
                self.advance();
                if self.peek() == Some('|') {
                    self.advance();
                    Ok(TokenKind::DoublePipe)
                } else {
                    Ok(TokenKind::Pipe)
                }
            }
            other => Err(LexError {
                reason: LexErrorReason::UnexpectedCharacter(other),
                offset: start,
            }),
        }
    }

    /// An NCName, absorbing trailing hyphens only when they are
    /// immediately followed by another name-continuation character — the
    /// hyphen-disambiguation rule from spec.md §4.1 ("my-element",
    /// "ancestor-or-self" vs. a standalone `-` token).
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.byte_offset();
        self.advance(); // the start char, already checked by caller
        loop {
            match self.peek() {
                Some(c) if is_name_continuation_char(c) => {
                    self.advance();
                }
                Some('-') if matches!(self.peek_at(1), Some(next) if is_name_continuation_char(next)) =>
                {
                    self.advance();
                }
                _ => break,
            }
        }
        let end = self.byte_offset();
        let word = self.slice(start, end);
        match reserved::classify(word, self.version) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word.to_string()),
        }
    }

    /// `Q{uri}local`. The caller has already confirmed `Q{`.
    fn scan_eqname(&mut self, start: usize) -> Result<TokenKind, LexError> {
        self.advance(); // 'Q'
        self.advance(); // '{'
        let uri_start = self.byte_offset();
        loop {
            match self.peek() {
                Some('}') => break,
                Some(_) => {
                    self.advance();
                }
                None => {
                    return Err(LexError {
                        reason: LexErrorReason::UnterminatedEQName,
                        offset: start,
                    })
                }
            }
        }
        let uri_end = self.byte_offset();
        self.advance(); // '}'
        let local_start = self.byte_offset();
        match self.peek() {
            Some(c) if is_name_start_char(c) => {
                self.scan_identifier();
            }
            _ => {
                return Err(LexError {
                    reason: LexErrorReason::EmptyEQNameLocalName,
                    offset: start,
                })
            }
        }
        let local_end = self.byte_offset();
        Ok(TokenKind::EQName {
            uri: self.slice(uri_start, uri_end).to_string(),
            local: self.slice(local_start, local_end).to_string(),
        })
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.byte_offset();
        let mut is_decimal = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('.')) {
            is_decimal = true;
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        let mut is_double = false;
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if matches!(self.peek_at(lookahead), Some(c) if c.is_ascii_digit()) {
                is_double = true;
                self.advance(); // e/E
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let end = self.byte_offset();
        let text = self.slice(start, end);
        if is_double {
            TokenKind::DoubleLiteral(text.parse::<f64>().unwrap_or(f64::NAN))
        } else if is_decimal {
            TokenKind::DecimalLiteral(text.parse::<Decimal>().unwrap_or_default())
        } else {
            TokenKind::IntegerLiteral(IBig::from_str_radix(text, 10).unwrap_or_default())
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind, LexError> {
        let start = self.byte_offset();
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.advance();
                    if self.peek() == Some(quote) {
                        // doubled quote is an escaped literal quote
                        value.push(quote);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    return Err(LexError {
                        reason: LexErrorReason::UnterminatedString,
                        offset: start,
                    })
                }
            }
        }
        Ok(TokenKind::StringLiteral(value))
    }

    /// Captures the raw text of a backtick string template, balancing
    /// `{...}` interpolation regions and honoring `\` `\{` `\}` `\n` `\r`
    /// `\t` `\\` escapes, per spec.md §4.1. Interpolation segments are
    /// returned unparsed; the parser is responsible for recursively
    /// lexing/parsing them.
    fn scan_string_template(&mut self) -> Result<TokenKind, LexError> {
        let start = self.byte_offset();
        self.advance(); // opening backtick
        let mut value = String::new();
        let mut brace_depth = 0usize;
        loop {
            match self.peek() {
                Some('\\') if brace_depth == 0 => {
                    self.advance();
                    match self.peek() {
                        Some(escaped @ ('{' | '}' | '\\')) => {
                            value.push(escaped);
                            self.advance();
                        }
                        Some('n') => {
                            value.push('\n');
                            self.advance();
                        }
                        Some('r') => {
                            value.push('\r');
                            self.advance();
                        }
                        Some('t') => {
                            value.push('\t');
                            self.advance();
                        }
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                            self.advance();
                        }
                        None => {
                            return Err(LexError {
                                reason: LexErrorReason::UnterminatedStringTemplate,
                                offset: start,
                            })
                        }
                    }
                }
                Some('{') => {
                    brace_depth += 1;
                    value.push('{');
                    self.advance();
                }
                Some('}') if brace_depth > 0 => {
                    brace_depth -= 1;
                    value.push('}');
                    self.advance();
                }
                Some('`') if brace_depth == 0 => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    return Err(LexError {
                        reason: LexErrorReason::UnterminatedStringTemplate,
                        offset: start,
                    })
                }
            }
        }
        Ok(TokenKind::StringTemplate(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, version: Version) -> Vec<TokenKind> {
        Lexer::new(version)
            .scan(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn hyphenated_identifier_is_one_token() {
        let kinds = scan("ancestor-or-self", Version::V1_0);
        assert_eq!(kinds, vec![TokenKind::Keyword(reserved::Keyword::AncestorOrSelf)]);
    }

    #[test]
    fn trailing_hyphen_before_space_is_minus() {
        let kinds = scan("$a - $b", Version::V1_0);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dollar,
                TokenKind::Identifier("a".into()),
                TokenKind::Minus,
                TokenKind::Dollar,
                TokenKind::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn minus_directly_followed_by_identifier_start_is_absorbed() {
        // "my-element" is one identifier, not "my" MINUS "element".
        let kinds = scan("my-element", Version::V1_0);
        assert_eq!(kinds, vec![TokenKind::Identifier("my-element".into())]);
    }

    #[test]
    fn eqname_round_trips_uri_and_local() {
        let kinds = scan("Q{http://example.com}foo", Version::V1_0);
        assert_eq!(
            kinds,
            vec![TokenKind::EQName {
                uri: "http://example.com".into(),
                local: "foo".into(),
            }]
        );
    }

    #[test]
    fn q_without_brace_is_identifier() {
        let kinds = scan("Query", Version::V1_0);
        assert_eq!(kinds, vec![TokenKind::Identifier("Query".into())]);
    }

    #[test]
    fn unterminated_eqname_is_an_error() {
        let err = Lexer::new(Version::V1_0).scan("Q{oops").unwrap_err();
        assert_eq!(err.reason, LexErrorReason::UnterminatedEQName);
    }

    #[test]
    fn empty_eqname_local_name_is_an_error() {
        let err = Lexer::new(Version::V1_0).scan("Q{uri}").unwrap_err();
        assert_eq!(err.reason, LexErrorReason::EmptyEQNameLocalName);
    }

    #[test]
    fn numbers() {
        assert!(matches!(
            scan("42", Version::V1_0).as_slice(),
            [TokenKind::IntegerLiteral(_)]
        ));
        assert!(matches!(
            scan("4.2", Version::V1_0).as_slice(),
            [TokenKind::DecimalLiteral(_)]
        ));
        assert!(matches!(
            scan(".5", Version::V1_0).as_slice(),
            [TokenKind::DecimalLiteral(_)]
        ));
        assert!(matches!(
            scan("1.5e10", Version::V1_0).as_slice(),
            [TokenKind::DoubleLiteral(_)]
        ));
    }

    #[test]
    fn range_dots_are_not_confused_with_decimal() {
        let kinds = scan("1 to 3", Version::V2_0);
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerLiteral(IBig::from(1)),
                TokenKind::Keyword(reserved::Keyword::To),
                TokenKind::IntegerLiteral(IBig::from(3)),
            ]
        );
        let dotdot = scan("1..3", Version::V1_0);
        assert_eq!(
            dotdot,
            vec![
                TokenKind::IntegerLiteral(IBig::from(1)),
                TokenKind::DotDot,
                TokenKind::IntegerLiteral(IBig::from(3)),
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        let kinds = scan("a//b!=c<=d>=e||f=>g:=h", Version::V3_0);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::DoubleSlash,
                TokenKind::Identifier("b".into()),
                TokenKind::NotEqual,
                TokenKind::Identifier("c".into()),
                TokenKind::LessThanEqual,
                TokenKind::Identifier("d".into()),
                TokenKind::GreaterThanEqual,
                TokenKind::Identifier("e".into()),
                TokenKind::DoublePipe,
                TokenKind::Identifier("f".into()),
                TokenKind::Arrow,
                TokenKind::Identifier("g".into()),
                TokenKind::ColonEqual,
                TokenKind::Identifier("h".into()),
            ]
        );
    }

    #[test]
    fn nested_comments_are_skipped() {
        let kinds = scan("1 (: outer (: inner :) still-outer :) + 2", Version::V1_0);
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerLiteral(IBig::from(1)),
                TokenKind::Plus,
                TokenKind::IntegerLiteral(IBig::from(2)),
            ]
        );
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = Lexer::new(Version::V1_0).scan("1 (: oops").unwrap_err();
        assert_eq!(err.reason, LexErrorReason::UnterminatedComment);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new(Version::V1_0).scan("\"oops").unwrap_err();
        assert_eq!(err.reason, LexErrorReason::UnterminatedString);
    }

    #[test]
    fn string_template_balances_braces_and_escapes() {
        let kinds = scan(r"`hello {1 + 1} \{literal\}`", Version::V3_1);
        assert_eq!(
            kinds,
            vec![TokenKind::StringTemplate("hello {1 + 1} {literal}".into())]
        );
    }

    #[test]
    fn idiv_is_reserved_from_2_0_only() {
        assert_eq!(
            scan("idiv", Version::V1_0),
            vec![TokenKind::Identifier("idiv".into())]
        );
        assert_eq!(
            scan("idiv", Version::V2_0),
            vec![TokenKind::Keyword(reserved::Keyword::Idiv)]
        );
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = Lexer::new(Version::V1_0).scan("$a ~ $b").unwrap_err();
        assert_eq!(err.reason, LexErrorReason::UnexpectedCharacter('~'));
    }
}
