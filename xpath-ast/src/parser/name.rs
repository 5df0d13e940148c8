use xpath_lexer::TokenKind;
use xpath_name::Name;

use crate::error::{ParseError, ParseErrorReason};

use super::Parser;

impl<'p> Parser<'p> {
    /// Consumes one "word" token usable as a name component: an
    /// `Identifier`, or a `Keyword` whose lexeme is being used in name
    /// position (e.g. `ns:for`, `child::text` as an element name test
    /// rather than the reserved word). Real XPath processors face the same
    /// reserved-function-name ambiguity; this parser resolves it by lexeme,
    /// not by token kind, whenever a name is expected.
    pub(super) fn expect_ncname(&mut self) -> Result<(String, std::ops::Range<usize>), ParseError> {
        let token = self.peek().cloned().ok_or_else(|| self.eof_error("a name"))?;
        match &token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok((name.clone(), token.offset))
            }
            TokenKind::Keyword(_) => {
                self.advance();
                Ok((token.lexeme.clone(), token.offset))
            }
            _ => Err(self.unexpected(&token, "a name")),
        }
    }

    /// Parses an `EQName`: either the lexer's pre-resolved `Q{uri}local`
    /// form, or a `prefix:local` / bare `local` sequence resolved against
    /// the static namespace context. `default_namespace` selects which
    /// default applies to an unprefixed name (element vs function).
    pub(super) fn parse_eqname(
        &mut self,
        default_namespace: DefaultNamespace,
    ) -> Result<(Name, std::ops::Range<usize>), ParseError> {
        if let Some(token) = self.peek() {
            if let TokenKind::EQName { uri, local } = &token.kind {
                let uri = uri.clone();
                let local = local.clone();
                let span = token.offset.clone();
                self.advance();
                let namespace = if uri.is_empty() { None } else { Some(uri) };
                return Ok((Name::new(local, namespace, None), span));
            }
        }

        let (first, mut span) = self.expect_ncname()?;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Colon)) {
            self.advance();
            let (local, local_span) = self.expect_ncname()?;
            span.end = local_span.end;
            let namespace = self.ctx.namespaces().by_prefix(&first).map(str::to_string);
            let Some(namespace) = namespace else {
                return Err(ParseError::new(
                    ParseErrorReason::UnresolvedName(format!("{first}:{local}")),
                    span,
                ));
            };
            return Ok((Name::new(local, Some(namespace), Some(first)), span));
        }

        let namespace = match default_namespace {
            DefaultNamespace::Element => {
                let ns = self.ctx.namespaces().default_element_namespace();
                if ns.is_empty() {
                    None
                } else {
                    Some(ns.to_string())
                }
            }
            DefaultNamespace::Function => Some(self.ctx.namespaces().default_function_namespace().to_string()),
            DefaultNamespace::None => None,
        };
        Ok((Name::new(first, namespace, None), span))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DefaultNamespace {
    Element,
    Function,
    None,
}
