//! Hand-written recursive-descent, operator-precedence parser over
//! [`xpath_lexer::Token`]. One [`Parser`] handles all four language
//! versions; `ctx.version()` gates which constructs are accepted, so a
//! `let` binding in a 2.0 parser fails the same way an unreserved-word
//! mismatch would (spec.md §4.2).

mod name;
mod primary;
mod step;
mod types;

use xpath_lexer::{Token, TokenKind};

use crate::ast::{Expr, ExprS, ExprSingle, ExprSingleS, XPath};
use crate::context::StaticContext;
use crate::error::{ParseError, ParseErrorReason};
use crate::operator::BinaryOperator;
use crate::span::{Span, Spanned};

pub use name::DefaultNamespace;

/// Parses a complete token stream into an [`XPath`] expression tree under
/// the given static context.
pub fn parse(ctx: &StaticContext, tokens: Vec<Token>) -> Result<XPath, ParseError> {
    Parser::new(ctx, tokens).parse_xpath()
}

pub(crate) struct Parser<'p> {
    ctx: &'p StaticContext,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'p> Parser<'p> {
    fn new(ctx: &'p StaticContext, tokens: Vec<Token>) -> Self {
        Self { ctx, tokens, pos: 0 }
    }

    fn parse_xpath(mut self) -> Result<XPath, ParseError> {
        let expr = self.parse_expr()?;
        if let Some(token) = self.peek() {
            return Err(self.unexpected(&token.clone(), "end of input"));
        }
        Ok(XPath(expr))
    }

    // --- token cursor -----------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.offset.clone())
            .unwrap_or(0..0)
    }

    fn current_span(&self) -> Span {
        self.peek()
            .map(|t| t.offset.clone())
            .unwrap_or_else(|| self.previous_span())
    }

    fn eof_error(&self, expected: &str) -> ParseError {
        ParseError::new(
            ParseErrorReason::Syntax(format!("unexpected end of input, expected {expected}")),
            self.previous_span(),
        )
    }

    fn unexpected(&self, token: &Token, expected: &str) -> ParseError {
        ParseError::new(
            ParseErrorReason::Syntax(format!("unexpected `{}`, expected {expected}", token.lexeme)),
            token.offset.clone(),
        )
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().unwrap()),
            Some(token) => Err(self.unexpected(&token.clone(), expected)),
            None => Err(self.eof_error(expected)),
        }
    }

    fn require_version(&self, version: xpath_lexer::Version, construct: &str) -> Result<(), ParseError> {
        if self.ctx.version().at_least(version) {
            Ok(())
        } else {
            Err(ParseError::new(
                ParseErrorReason::Syntax(format!(
                    "{construct} requires XPath {version} or later (parser is {})",
                    self.ctx.version()
                )),
                self.current_span(),
            ))
        }
    }

    // --- Expr / ExprSingle --------------------------------------------

    fn parse_expr(&mut self) -> Result<ExprS, ParseError> {
        let start = self.current_span();
        let mut exprs = vec![self.parse_expr_single()?];
        while self.matches(&TokenKind::Comma) {
            exprs.push(self.parse_expr_single()?);
        }
        let end = self.previous_span();
        Ok(Spanned::new(Expr(exprs), start.start..end.end))
    }

    fn parse_expr_single(&mut self) -> Result<ExprSingleS, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(kw)) if *kw == xpath_lexer::Keyword::For => self.parse_for_expr(),
            Some(TokenKind::Keyword(kw)) if *kw == xpath_lexer::Keyword::Let => self.parse_let_expr(),
            Some(TokenKind::Keyword(kw))
                if *kw == xpath_lexer::Keyword::Some_ || *kw == xpath_lexer::Keyword::Every =>
            {
                self.parse_quantified_expr()
            }
            Some(TokenKind::Keyword(kw)) if *kw == xpath_lexer::Keyword::If => self.parse_if_expr(),
            _ => self.parse_or_expr(),
        }
    }

    fn parse_for_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::ast::BindingExpr;
        let start = self.current_span();
        self.advance();
        self.require_version(xpath_lexer::Version::V2_0, "`for` expressions")?;
        let bindings = self.parse_bindings(&TokenKind::Keyword(xpath_lexer::Keyword::In))?;
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Return), "`return`")?;
        let body = self.parse_expr_single()?;
        let span = start.start..body.span.end;
        Ok(Spanned::new(
            ExprSingle::For(BindingExpr {
                bindings,
                body: Box::new(body),
            }),
            span,
        ))
    }

    fn parse_let_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::ast::BindingExpr;
        let start = self.current_span();
        self.advance();
        self.require_version(xpath_lexer::Version::V3_0, "`let` expressions")?;
        let bindings = self.parse_bindings(&TokenKind::ColonEqual)?;
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Return), "`return`")?;
        let body = self.parse_expr_single()?;
        let span = start.start..body.span.end;
        Ok(Spanned::new(
            ExprSingle::Let(BindingExpr {
                bindings,
                body: Box::new(body),
            }),
            span,
        ))
    }

    fn parse_bindings(
        &mut self,
        separator: &TokenKind,
    ) -> Result<Vec<(crate::ast::NameS, ExprSingleS)>, ParseError> {
        let mut bindings = Vec::new();
        loop {
            self.expect(TokenKind::Dollar, "`$`")?;
            let (name, span) = self.parse_eqname(DefaultNamespace::None)?;
            let name = Spanned::new(name, span);
            self.expect(separator.clone(), "binding separator")?;
            let value = self.parse_expr_single()?;
            bindings.push((name, value));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        Ok(bindings)
    }

    fn parse_quantified_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::ast::Quantifier;
        let start = self.current_span();
        self.require_version(xpath_lexer::Version::V2_0, "quantified expressions")?;
        let quantifier = match self.advance().unwrap().kind {
            TokenKind::Keyword(xpath_lexer::Keyword::Some_) => Quantifier::Some,
            _ => Quantifier::Every,
        };
        let bindings = self.parse_bindings(&TokenKind::Keyword(xpath_lexer::Keyword::In))?;
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Satisfies), "`satisfies`")?;
        let satisfies = self.parse_expr_single()?;
        let span = start.start..satisfies.span.end;
        Ok(Spanned::new(
            ExprSingle::Quantified {
                quantifier,
                bindings,
                satisfies: Box::new(satisfies),
            },
            span,
        ))
    }

    fn parse_if_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::ast::IfExpr;
        let start = self.current_span();
        self.advance();
        self.require_version(xpath_lexer::Version::V2_0, "`if` expressions")?;
        self.expect(TokenKind::LeftParen, "`(`")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RightParen, "`)`")?;
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Then), "`then`")?;
        let then_branch = self.parse_expr_single()?;
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Else), "`else`")?;
        let else_branch = self.parse_expr_single()?;
        let span = start.start..else_branch.span.end;
        Ok(Spanned::new(
            ExprSingle::If(IfExpr {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            }),
            span,
        ))
    }

    // --- binary precedence chain ---------------------------------------
    // or < and < comparison < concat(||) < range(to) < additive <
    // multiplicative < union < intersect/except < instance-of < treat-as <
    // castable-as < cast-as < arrow(=>) < unary < simple-map(!) < path

    fn parse_or_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_and_expr, |kind| match kind {
            TokenKind::Keyword(xpath_lexer::Keyword::Or) => Some(BinaryOperator::Or),
            _ => None,
        })
    }

    fn parse_and_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_comparison_expr, |kind| match kind {
            TokenKind::Keyword(xpath_lexer::Keyword::And) => Some(BinaryOperator::And),
            _ => None,
        })
    }

    fn parse_comparison_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        // Non-associative: at most one comparison operator per level.
        let left = self.parse_concat_expr()?;
        let operator = match self.peek_kind() {
            Some(TokenKind::Equal) => Some(BinaryOperator::GenEq),
            Some(TokenKind::NotEqual) => Some(BinaryOperator::GenNe),
            Some(TokenKind::LessThan) => Some(BinaryOperator::GenLt),
            Some(TokenKind::LessThanEqual) => Some(BinaryOperator::GenLe),
            Some(TokenKind::GreaterThan) => Some(BinaryOperator::GenGt),
            Some(TokenKind::GreaterThanEqual) => Some(BinaryOperator::GenGe),
            Some(TokenKind::Precedes) => Some(BinaryOperator::Precedes),
            Some(TokenKind::Follows) => Some(BinaryOperator::Follows),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Eq)) => Some(BinaryOperator::ValueEq),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Ne)) => Some(BinaryOperator::ValueNe),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Lt)) => Some(BinaryOperator::ValueLt),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Le)) => Some(BinaryOperator::ValueLe),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Gt)) => Some(BinaryOperator::ValueGt),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Ge)) => Some(BinaryOperator::ValueGe),
            Some(TokenKind::Keyword(xpath_lexer::Keyword::Is)) => Some(BinaryOperator::Is),
            _ => None,
        };
        let Some(operator) = operator else { return Ok(left) };
        self.advance();
        let right = self.parse_concat_expr()?;
        Ok(self.binary(operator, left, right))
    }

    fn parse_concat_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let left = self.parse_range_expr()?;
        if !self.check(&TokenKind::DoublePipe) {
            return Ok(left);
        }
        self.require_version(xpath_lexer::Version::V3_0, "string concatenation `||`")?;
        let mut acc = left;
        while self.matches(&TokenKind::DoublePipe) {
            let right = self.parse_range_expr()?;
            acc = self.binary(BinaryOperator::Concat, acc, right);
        }
        Ok(acc)
    }

    fn parse_range_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let left = self.parse_additive_expr()?;
        if !self.check(&TokenKind::Keyword(xpath_lexer::Keyword::To)) {
            return Ok(left);
        }
        self.advance();
        let right = self.parse_additive_expr()?;
        Ok(self.binary(BinaryOperator::Range, left, right))
    }

    fn parse_additive_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_multiplicative_expr, |kind| match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_union_expr, |kind| match kind {
            TokenKind::Asterisk => Some(BinaryOperator::Mul),
            TokenKind::Keyword(xpath_lexer::Keyword::Div) => Some(BinaryOperator::Div),
            TokenKind::Keyword(xpath_lexer::Keyword::Idiv) => Some(BinaryOperator::IntDiv),
            TokenKind::Keyword(xpath_lexer::Keyword::Mod) => Some(BinaryOperator::Mod),
            _ => None,
        })
    }

    fn parse_union_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_intersect_except_expr, |kind| match kind {
            TokenKind::Pipe => Some(BinaryOperator::Union),
            TokenKind::Keyword(xpath_lexer::Keyword::Union) => Some(BinaryOperator::Union),
            _ => None,
        })
    }

    fn parse_intersect_except_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        self.parse_left_assoc(Self::parse_instanceof_expr, |kind| match kind {
            TokenKind::Keyword(xpath_lexer::Keyword::Intersect) => Some(BinaryOperator::Intersect),
            TokenKind::Keyword(xpath_lexer::Keyword::Except) => Some(BinaryOperator::Except),
            _ => None,
        })
    }

    fn parse_instanceof_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let operand = self.parse_treat_expr()?;
        if !self.check(&TokenKind::Keyword(xpath_lexer::Keyword::Instance)) {
            return Ok(operand);
        }
        self.advance();
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::Of), "`of`")?;
        let sequence_type = self.parse_sequence_type()?;
        let span = operand.span.start..self.previous_span().end;
        Ok(Spanned::new(
            ExprSingle::InstanceOf {
                operand: Box::new(operand),
                sequence_type,
            },
            span,
        ))
    }

    fn parse_treat_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let operand = self.parse_castable_expr()?;
        if !self.check(&TokenKind::Keyword(xpath_lexer::Keyword::Treat)) {
            return Ok(operand);
        }
        self.advance();
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::As), "`as`")?;
        let sequence_type = self.parse_sequence_type()?;
        let span = operand.span.start..self.previous_span().end;
        Ok(Spanned::new(
            ExprSingle::TreatAs {
                operand: Box::new(operand),
                sequence_type,
            },
            span,
        ))
    }

    fn parse_castable_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let operand = self.parse_cast_expr()?;
        if !self.check(&TokenKind::Keyword(xpath_lexer::Keyword::Castable)) {
            return Ok(operand);
        }
        self.advance();
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::As), "`as`")?;
        let single_type = self.parse_single_type()?;
        let span = operand.span.start..self.previous_span().end;
        Ok(Spanned::new(
            ExprSingle::CastableAs {
                operand: Box::new(operand),
                single_type,
            },
            span,
        ))
    }

    fn parse_cast_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let operand = self.parse_arrow_expr()?;
        if !self.check(&TokenKind::Keyword(xpath_lexer::Keyword::Cast)) {
            return Ok(operand);
        }
        self.advance();
        self.expect(TokenKind::Keyword(xpath_lexer::Keyword::As), "`as`")?;
        let single_type = self.parse_single_type()?;
        let span = operand.span.start..self.previous_span().end;
        Ok(Spanned::new(
            ExprSingle::CastAs {
                operand: Box::new(operand),
                single_type,
            },
            span,
        ))
    }

    fn parse_arrow_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let mut acc = self.parse_unary_expr()?;
        while self.check(&TokenKind::Arrow) {
            self.require_version(xpath_lexer::Version::V3_0, "the arrow operator `=>`")?;
            self.advance();
            let target = self.parse_arrow_target()?;
            let arguments = if self.check(&TokenKind::LeftParen) {
                self.parse_argument_list()?
            } else {
                Vec::new()
            };
            let span = acc.span.start..self.previous_span().end;
            acc = Spanned::new(
                ExprSingle::Arrow {
                    source: Box::new(acc),
                    target,
                    arguments,
                },
                span,
            );
        }
        Ok(acc)
    }

    fn parse_arrow_target(&mut self) -> Result<crate::ast::ArrowTarget, ParseError> {
        use crate::ast::ArrowTarget;
        if self.matches(&TokenKind::Dollar) {
            let (name, span) = self.parse_eqname(DefaultNamespace::None)?;
            return Ok(ArrowTarget::VarRef(Spanned::new(name, span)));
        }
        if self.matches(&TokenKind::LeftParen) {
            let inner = self.parse_expr_single()?;
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(ArrowTarget::Parenthesized(Box::new(inner)));
        }
        let (name, span) = self.parse_eqname(DefaultNamespace::Function)?;
        Ok(ArrowTarget::Name(Spanned::new(name, span)))
    }

    fn parse_unary_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        use crate::operator::UnaryOperator;
        let start = self.current_span();
        let mut operators = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Plus) => {
                    operators.push(UnaryOperator::Plus);
                    self.advance();
                }
                Some(TokenKind::Minus) => {
                    operators.push(UnaryOperator::Minus);
                    self.advance();
                }
                _ => break,
            }
        }
        let operand = self.parse_simple_map_expr()?;
        if operators.is_empty() {
            return Ok(operand);
        }
        let span = start.start..operand.span.end;
        Ok(Spanned::new(
            ExprSingle::Unary {
                operators,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_simple_map_expr(&mut self) -> Result<ExprSingleS, ParseError> {
        let first = self.parse_path_expr()?;
        if !self.check(&TokenKind::ExclamationMark) {
            return Ok(first);
        }
        self.require_version(xpath_lexer::Version::V3_0, "the simple map operator `!`")?;
        let start = first.span.start;
        let mut steps = vec![first];
        while self.matches(&TokenKind::ExclamationMark) {
            steps.push(self.parse_path_expr()?);
        }
        let end = steps.last().unwrap().span.end;
        Ok(Spanned::new(ExprSingle::SimpleMap(steps), start..end))
    }

    /// Shared helper for the left-associative binary levels.
    fn parse_left_assoc(
        &mut self,
        mut next: impl FnMut(&mut Self) -> Result<ExprSingleS, ParseError>,
        classify: impl Fn(&TokenKind) -> Option<BinaryOperator>,
    ) -> Result<ExprSingleS, ParseError> {
        let mut acc = next(self)?;
        loop {
            let Some(operator) = self.peek_kind().and_then(&classify) else {
                break;
            };
            self.advance();
            let right = next(self)?;
            acc = self.binary(operator, acc, right);
        }
        Ok(acc)
    }

    fn binary(&self, operator: BinaryOperator, left: ExprSingleS, right: ExprSingleS) -> ExprSingleS {
        let span = left.span.start..right.span.end;
        Spanned::new(
            ExprSingle::Binary(crate::ast::BinaryExpr {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            }),
            span,
        )
    }
}
