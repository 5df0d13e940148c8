use xpath_lexer::{Keyword, TokenKind};

use crate::ast::{AxisStep, ExprS, ExprSingleS, KeySpecifier, PathExpr, Postfix, StepExpr, StepExprS};
use crate::error::{ParseError, ParseErrorReason};
use crate::node_test::{Axis, ElementOrAttributeTest, KindTest, NameTest, NodeTest};
use crate::span::Spanned;

use super::name::DefaultNamespace;
use super::Parser;

impl<'p> Parser<'p> {
    pub(super) fn parse_path_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::ast::ExprSingle;

        let start = self.current_span();
        let rooted;
        let mut steps = Vec::new();

        if self.matches(&TokenKind::DoubleSlash) {
            rooted = true;
            steps.push(self.descendant_or_self_step(start.clone()));
            steps.push(self.parse_step_expr()?);
        } else if self.matches(&TokenKind::Slash) {
            rooted = true;
            if self.starts_step() {
                steps.push(self.parse_step_expr()?);
            }
        } else {
            rooted = false;
            steps.push(self.parse_step_expr()?);
        }

        loop {
            if self.matches(&TokenKind::DoubleSlash) {
                let span = self.previous_span();
                steps.push(self.descendant_or_self_step(span));
                steps.push(self.parse_step_expr()?);
            } else if self.check(&TokenKind::Slash) {
                self.advance();
                steps.push(self.parse_step_expr()?);
            } else {
                break;
            }
        }

        let end = steps.last().map(|s| s.span.end).unwrap_or(start.end);
        Ok(Spanned::new(
            ExprSingle::Path(PathExpr { rooted, steps }),
            start.start..end,
        ))
    }

    fn descendant_or_self_step(&self, span: std::ops::Range<usize>) -> StepExprS {
        Spanned::new(
            StepExpr::Axis(AxisStep {
                axis: Axis::DescendantOrSelf,
                node_test: NodeTest::KindTest(KindTest::Any),
                predicates: Vec::new(),
            }),
            span,
        )
    }

    fn starts_step(&self) -> bool {
        !matches!(
            self.peek_kind(),
            None | Some(TokenKind::Comma)
                | Some(TokenKind::RightParen)
                | Some(TokenKind::RightBrace)
                | Some(TokenKind::RightBracket)
        )
    }

    fn parse_step_expr(&mut self) -> Result<StepExprS, ParseError> {
        let start = self.current_span();
        if let Some(axis_step) = self.try_parse_axis_step()? {
            let end = self.previous_span().end;
            return Ok(Spanned::new(StepExpr::Axis(axis_step), start.start..end));
        }
        let primary = self.parse_primary_expr()?;
        let mut postfixes = Vec::new();
        loop {
            if self.check(&TokenKind::LeftBracket) {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightBracket, "`]`")?;
                postfixes.push(Postfix::Predicate(expr));
            } else if self.check(&TokenKind::LeftParen) {
                let arguments = self.parse_argument_list()?;
                postfixes.push(Postfix::ArgumentList(arguments));
            } else if self.check(&TokenKind::QuestionMark) {
                self.require_version(xpath_lexer::Version::V3_1, "postfix lookup `?`")?;
                self.advance();
                postfixes.push(Postfix::Lookup(self.parse_postfix_key_specifier()?));
            } else {
                break;
            }
        }
        let end = self.previous_span().end;
        Ok(Spanned::new(
            StepExpr::Postfix { primary, postfixes },
            start.start..end,
        ))
    }

    fn parse_postfix_key_specifier(&mut self) -> Result<KeySpecifier, ParseError> {
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

    /// Returns `Some` when the upcoming tokens form an axis step (an
    /// explicit `axis::test`, an abbreviated `@test`, `..`, or `.` is
    /// handled as a primary expression instead). A bare name test or kind
    /// test with the default `child`/`attribute` axis is also recognized
    /// here, since in step position an unparenthesized name is never a
    /// function call (spec.md §4.2: "after NCName followed by `(`, decide
    /// kind test vs function call"; a name with no following `(` is always
    /// a name test).
    fn try_parse_axis_step(&mut self) -> Result<Option<AxisStep>, ParseError> {
        if self.check(&TokenKind::DotDot) {
            self.advance();
            return Ok(Some(AxisStep {
                axis: Axis::Parent,
                node_test: NodeTest::KindTest(KindTest::Any),
                predicates: self.parse_predicates()?,
            }));
        }

        if self.check(&TokenKind::At) {
            self.advance();
            let node_test = self.parse_node_test()?;
            let predicates = self.parse_predicates()?;
            return Ok(Some(AxisStep {
                axis: Axis::Attribute,
                node_test,
                predicates,
            }));
        }

        if let Some(TokenKind::Keyword(kw)) = self.peek_kind() {
            if kw.is_axis() && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::DoubleColon) {
                let axis = axis_from_keyword(*kw);
                if axis == Axis::Namespace && !self.ctx.enable_namespace_axis() {
                    return Err(ParseError::new(
                        ParseErrorReason::UnsupportedAxis("namespace".to_string()),
                        self.current_span(),
                    ));
                }
                self.advance();
                self.advance();
                let node_test = self.parse_node_test()?;
                let predicates = self.parse_predicates()?;
                return Ok(Some(AxisStep {
                    axis,
                    node_test,
                    predicates,
                }));
            }
        }

        if self.is_node_test_start() && !self.is_function_call_ahead() {
            let node_test = self.parse_node_test()?;
            let predicates = self.parse_predicates()?;
            return Ok(Some(AxisStep {
                axis: Axis::Child,
                node_test,
                predicates,
            }));
        }

        Ok(None)
    }

    fn parse_predicates(&mut self) -> Result<Vec<ExprS>, ParseError> {
        let mut predicates = Vec::new();
        while self.matches(&TokenKind::LeftBracket) {
            predicates.push(self.parse_expr()?);
            self.expect(TokenKind::RightBracket, "`]`")?;
        }
        Ok(predicates)
    }

    /// A node test may start a step only when it isn't actually a primary
    /// expression: literals, `$var`, `.`, `(`, `#`, etc. never begin a node
    /// test.
    fn is_node_test_start(&self) -> bool {
        // `map {...}` / `array {...}` constructors are primary expressions,
        // not node tests, even though `map`/`array` are node-kind-test
        // keywords (spec.md §4.2: "`map { ... }` vs `map(...)` is
        // distinguished by the following token").
        if matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Map)) | Some(TokenKind::Keyword(Keyword::Array)))
            && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftBrace)
        {
            return false;
        }
        // `function(...)` in expression position is always the inline
        // function literal, never the `function(...)  as ...` item-type
        // test (that form only occurs inside a sequence type).
        if matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Function))) {
            return false;
        }
        matches!(
            self.peek_kind(),
            Some(TokenKind::Identifier(_)) | Some(TokenKind::EQName { .. }) | Some(TokenKind::Asterisk)
                | Some(TokenKind::AsteriskColon) | Some(TokenKind::ColonAsterisk)
        ) || matches!(self.peek_kind(), Some(TokenKind::Keyword(kw)) if kw.is_node_kind_test())
    }

    /// A name followed by `(` is a node-kind test only if the name is one
    /// of the closed set of kind-test keywords; otherwise it is a function
    /// call and therefore not a step.
    fn is_function_call_ahead(&self) -> bool {
        let next_is_paren = self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen);
        if !next_is_paren {
            return false;
        }
        !matches!(self.peek_kind(), Some(TokenKind::Keyword(kw)) if kw.is_node_kind_test())
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, ParseError> {
        if let Some(TokenKind::Keyword(kw)) = self.peek_kind() {
            if kw.is_node_kind_test() && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen) {
                return Ok(NodeTest::KindTest(self.parse_kind_test()?));
            }
        }
        self.parse_name_test().map(NodeTest::NameTest)
    }

    fn parse_name_test(&mut self) -> Result<NameTest, ParseError> {
        match self.peek().cloned() {
            Some(token) if token.kind == TokenKind::Asterisk => {
                self.advance();
                Ok(NameTest::Wildcard)
            }
            Some(token) if token.kind == TokenKind::AsteriskColon => {
                // `*:local` — any namespace, fixed local name.
                self.advance();
                let (local, _) = self.expect_ncname()?;
                Ok(NameTest::WildcardLocal(local))
            }
            Some(_) => {
                let (first, first_span) = self.expect_ncname()?;
                if self.check(&TokenKind::ColonAsterisk) {
                    // `ns:*` — fixed namespace, any local name.
                    self.advance();
                    let namespace = self
                        .ctx
                        .namespaces()
                        .by_prefix(&first)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            crate::error::ParseError::new(
                                crate::error::ParseErrorReason::UnresolvedName(first.clone()),
                                first_span.clone(),
                            )
                        })?;
                    return Ok(NameTest::WildcardNamespace(namespace));
                }
                if self.check(&TokenKind::Colon) {
                    self.advance();
                    let (local, _) = self.expect_ncname()?;
                    let namespace = self
                        .ctx
                        .namespaces()
                        .by_prefix(&first)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            crate::error::ParseError::new(
                                crate::error::ParseErrorReason::UnresolvedName(first.clone()),
                                first_span.clone(),
                            )
                        })?;
                    let name = xpath_name::Name::new(local, Some(namespace), Some(first));
                    return Ok(NameTest::Name(name));
                }
                let default_ns = self.ctx.namespaces().default_element_namespace();
                let namespace = if default_ns.is_empty() {
                    None
                } else {
                    Some(default_ns.to_string())
                };
                Ok(NameTest::Name(xpath_name::Name::new(first, namespace, None)))
            }
            None => Err(self.eof_error("a name test")),
        }
    }

    pub(super) fn parse_kind_test(&mut self) -> Result<KindTest, ParseError> {
        let keyword = match self.advance().unwrap().kind {
            TokenKind::Keyword(kw) => kw,
            _ => unreachable!("checked by caller"),
        };
        self.expect(TokenKind::LeftParen, "`(`")?;
        let test = match keyword {
            Keyword::Node => KindTest::Any,
            Keyword::Text => KindTest::Text,
            Keyword::Comment => KindTest::Comment,
            Keyword::NamespaceNode => KindTest::NamespaceNode,
            Keyword::ProcessingInstruction => {
                let target = if self.check(&TokenKind::RightParen) {
                    None
                } else {
                    Some(self.expect_string_or_ncname()?)
                };
                KindTest::ProcessingInstruction(target)
            }
            Keyword::DocumentNode => {
                let inner = if self.check(&TokenKind::RightParen) {
                    None
                } else {
                    Some(Box::new(self.parse_kind_test()?))
                };
                self.expect(TokenKind::RightParen, "`)`")?;
                return Ok(KindTest::Document(inner));
            }
            Keyword::Element => {
                let inner = if self.check(&TokenKind::RightParen) {
                    None
                } else {
                    Some(self.parse_element_or_attribute_test()?)
                };
                KindTest::Element(inner)
            }
            Keyword::Attribute => {
                let inner = if self.check(&TokenKind::RightParen) {
                    None
                } else {
                    Some(self.parse_element_or_attribute_test()?)
                };
                KindTest::Attribute(inner)
            }
            Keyword::SchemaElement => {
                let (name, _) = self.parse_eqname(DefaultNamespace::Element)?;
                KindTest::SchemaElement(name)
            }
            Keyword::SchemaAttribute => {
                let (name, _) = self.parse_eqname(DefaultNamespace::None)?;
                KindTest::SchemaAttribute(name)
            }
            other => {
                return Err(self.unexpected_keyword(other));
            }
        };
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(test)
    }

    fn unexpected_keyword(&self, _kw: Keyword) -> ParseError {
        crate::error::ParseError::new(
            crate::error::ParseErrorReason::Syntax("not a node-kind test".to_string()),
            self.previous_span(),
        )
    }

    fn parse_element_or_attribute_test(&mut self) -> Result<ElementOrAttributeTest, ParseError> {
        let name = if self.matches(&TokenKind::Asterisk) {
            None
        } else {
            Some(self.parse_eqname(DefaultNamespace::Element)?.0)
        };
        let type_name = if self.matches(&TokenKind::Comma) {
            Some(self.parse_eqname(DefaultNamespace::None)?.0)
        } else {
            None
        };
        Ok(ElementOrAttributeTest { name, type_name })
    }

    fn expect_string_or_ncname(&mut self) -> Result<String, ParseError> {
        if let Some(token) = self.peek().cloned() {
            if let TokenKind::StringLiteral(s) = &token.kind {
                self.advance();
                return Ok(s.clone());
            }
        }
        self.expect_ncname().map(|(name, _)| name)
    }
}

fn axis_from_keyword(kw: Keyword) -> Axis {
    match kw {
        Keyword::Ancestor => Axis::Ancestor,
        Keyword::AncestorOrSelf => Axis::AncestorOrSelf,
        Keyword::Attribute => Axis::Attribute,
        Keyword::Child => Axis::Child,
        Keyword::Descendant => Axis::Descendant,
        Keyword::DescendantOrSelf => Axis::DescendantOrSelf,
        Keyword::Following => Axis::Following,
        Keyword::FollowingSibling => Axis::FollowingSibling,
        Keyword::Namespace => Axis::Namespace,
        Keyword::Parent => Axis::Parent,
        Keyword::Preceding => Axis::Preceding,
        Keyword::PrecedingSibling => Axis::PrecedingSibling,
        Keyword::Self_ => Axis::Self_,
        _ => unreachable!("caller checked is_axis()"),
    }
}
