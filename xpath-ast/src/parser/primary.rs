use xpath_lexer::{Keyword, TokenKind, Version};

use crate::ast::{
    ArrayConstructor, ExprSingleS, FunctionCall, InlineFunction, KeySpecifier, Literal, MapConstructor, Param,
    PrimaryExpr, PrimaryExprS,
};
use crate::error::ParseError;
use crate::span::Spanned;

use super::name::DefaultNamespace;
use super::Parser;

impl<'p> Parser<'p> {
    pub(super) fn parse_primary_expr(&mut self) -> Result<PrimaryExprS, ParseError> {
        let start = self.current_span();
        let Some(token) = self.peek().cloned() else {
            return Err(self.eof_error("an expression"));
        };
        let expr = match &token.kind {
            TokenKind::IntegerLiteral(v) => {
                self.advance();
                PrimaryExpr::Literal(Literal::Integer(v.clone()))
            }
            TokenKind::DecimalLiteral(v) => {
                self.advance();
                PrimaryExpr::Literal(Literal::Decimal(*v))
            }
            TokenKind::DoubleLiteral(v) => {
                self.advance();
                PrimaryExpr::Literal(Literal::Double((*v).into()))
            }
            TokenKind::StringLiteral(v) => {
                self.advance();
                PrimaryExpr::Literal(Literal::String(v.clone()))
            }
            TokenKind::StringTemplate(v) => {
                self.advance();
                PrimaryExpr::StringTemplate(v.clone())
            }
            TokenKind::Dollar => {
                self.advance();
                let (name, _) = self.parse_eqname(DefaultNamespace::None)?;
                PrimaryExpr::VarRef(name)
            }
            TokenKind::Dot => {
                self.advance();
                PrimaryExpr::ContextItem
            }
            TokenKind::LeftParen => {
                self.advance();
                if self.matches(&TokenKind::RightParen) {
                    PrimaryExpr::Parenthesized(None)
                } else {
                    let expr = self.parse_expr()?;
                    self.expect(TokenKind::RightParen, "`)`")?;
                    PrimaryExpr::Parenthesized(Some(expr))
                }
            }
            TokenKind::LeftBracket => {
                self.require_version(Version::V3_1, "array constructors")?;
                self.advance();
                let mut members = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    members.push(self.parse_expr_single()?);
                    while self.matches(&TokenKind::Comma) {
                        members.push(self.parse_expr_single()?);
                    }
                }
                self.expect(TokenKind::RightBracket, "`]`")?;
                PrimaryExpr::ArrayConstructor(ArrayConstructor::Square(members))
            }
            TokenKind::QuestionMark => {
                self.require_version(Version::V3_1, "unary lookup `?`")?;
                self.advance();
                let key = self.parse_key_specifier()?;
                PrimaryExpr::UnaryLookup(key)
            }
            TokenKind::Keyword(Keyword::Array) if self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftBrace) => {
                self.require_version(Version::V3_1, "array constructors")?;
                self.advance();
                self.advance();
                let expr = if self.check(&TokenKind::RightBrace) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::RightBrace, "`}`")?;
                PrimaryExpr::ArrayConstructor(ArrayConstructor::Curly(expr))
            }
            TokenKind::Keyword(Keyword::Map) if self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftBrace) => {
                self.require_version(Version::V3_1, "map constructors")?;
                self.advance();
                self.advance();
                let mut entries = Vec::new();
                if !self.check(&TokenKind::RightBrace) {
                    entries.push(self.parse_map_entry()?);
                    while self.matches(&TokenKind::Comma) {
                        entries.push(self.parse_map_entry()?);
                    }
                }
                self.expect(TokenKind::RightBrace, "`}`")?;
                PrimaryExpr::MapConstructor(MapConstructor { entries })
            }
            TokenKind::Keyword(Keyword::Function)
                if self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen) =>
            {
                self.require_version(Version::V3_0, "inline function expressions")?;
                self.advance();
                self.parse_inline_function()?
            }
            TokenKind::Hash => {
                self.advance();
                let (name, _) = self.parse_eqname(DefaultNamespace::Function)?;
                let arity_token = self.expect_integer_literal()?;
                PrimaryExpr::NamedFunctionRef {
                    name,
                    arity: arity_token,
                }
            }
            _ => self.parse_name_led_primary(&token)?,
        };
        let span = start.start..self.previous_span().end;
        Ok(Spanned::new(expr, span))
    }

    /// Dispatches primaries that begin with a name token: `EQName(`
    /// function calls, `EQName#n` named function refs (handled above via
    /// `#`), and bare variable/name primaries that turn out to be name
    /// tests are the caller's (path-step) responsibility — reaching here
    /// means we're in primary-expression position.
    fn parse_name_led_primary(&mut self, token: &xpath_lexer::Token) -> Result<PrimaryExpr, ParseError> {
        if !matches!(token.kind, TokenKind::Identifier(_) | TokenKind::Keyword(_) | TokenKind::EQName { .. }) {
            return Err(self.unexpected(token, "an expression"));
        }
        let (name, _) = self.parse_eqname(DefaultNamespace::Function)?;
        if self.check(&TokenKind::LeftParen) {
            let arguments = self.parse_argument_list()?;
            return Ok(PrimaryExpr::FunctionCall(FunctionCall {
                name: Spanned::new(name, token.offset.clone()),
                arguments,
            }));
        }
        Err(self.unexpected(token, "a function call"))
    }

    fn expect_integer_literal(&mut self) -> Result<u8, ParseError> {
        let token = self.peek().cloned().ok_or_else(|| self.eof_error("an arity"))?;
        match &token.kind {
            TokenKind::IntegerLiteral(v) => {
                self.advance();
                Ok(v.to_string().parse().unwrap_or(0))
            }
            _ => Err(self.unexpected(&token, "an arity")),
        }
    }

    pub(super) fn parse_argument_list(&mut self) -> Result<Vec<ExprSingleS>, ParseError> {
        self.expect(TokenKind::LeftParen, "`(`")?;
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            arguments.push(self.parse_expr_single()?);
            while self.matches(&TokenKind::Comma) {
                arguments.push(self.parse_expr_single()?);
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(arguments)
    }

    fn parse_map_entry(&mut self) -> Result<(ExprSingleS, ExprSingleS), ParseError> {
        let key = self.parse_expr_single()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let value = self.parse_expr_single()?;
        Ok((key, value))
    }

    fn parse_key_specifier(&mut self) -> Result<KeySpecifier, ParseError> {
        if self.matches(&TokenKind::Asterisk) {
            return Ok(KeySpecifier::Star);
        }
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let expr = if self.check(&TokenKind::RightParen) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(KeySpecifier::Parenthesized(expr));
        }
        if let Some(token) = self.peek() {
            if let TokenKind::IntegerLiteral(v) = &token.kind {
                let v = v.clone();
                self.advance();
                return Ok(KeySpecifier::Integer(v));
            }
        }
        let (name, _) = self.expect_ncname()?;
        Ok(KeySpecifier::NCName(name))
    }

    fn parse_inline_function(&mut self) -> Result<PrimaryExpr, ParseError> {
        self.expect(TokenKind::LeftParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            params.push(self.parse_param()?);
            while self.matches(&TokenKind::Comma) {
                params.push(self.parse_param()?);
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        let return_type = if self.matches(&TokenKind::Keyword(Keyword::As)) {
            Some(self.parse_sequence_type()?)
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace, "`{`")?;
        let body = if self.check(&TokenKind::RightBrace) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(PrimaryExpr::InlineFunction(InlineFunction {
            params,
            return_type,
            body,
        }))
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        self.expect(TokenKind::Dollar, "`$`")?;
        let (name, _) = self.parse_eqname(DefaultNamespace::None)?;
        let type_ = if self.matches(&TokenKind::Keyword(Keyword::As)) {
            Some(self.parse_sequence_type()?)
        } else {
            None
        };
        Ok(Param { name, type_ })
    }
}
