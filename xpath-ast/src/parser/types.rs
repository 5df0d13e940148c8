use xpath_lexer::{Keyword, TokenKind, Version};
use xpath_schema_type::Xs;

use crate::error::{ParseError, ParseErrorReason};
use crate::sequence_type::{ArrayTest, FunctionTest, ItemType, MapTest, Occurrence, SequenceType, SingleType};

use super::name::DefaultNamespace;
use super::Parser;

impl<'p> Parser<'p> {
    pub(super) fn parse_sequence_type(&mut self) -> Result<SequenceType, ParseError> {
        if self.check(&TokenKind::Keyword(Keyword::EmptySequence))
            && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen)
        {
            self.advance();
            self.advance();
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(SequenceType::Empty);
        }
        let item_type = self.parse_item_type()?;
        let occurrence = match self.peek_kind() {
            Some(TokenKind::QuestionMark) => {
                self.advance();
                Occurrence::ZeroOrOne
            }
            Some(TokenKind::Asterisk) => {
                self.advance();
                Occurrence::ZeroOrMore
            }
            Some(TokenKind::Plus) => {
                self.advance();
                Occurrence::OneOrMore
            }
            _ => Occurrence::ExactlyOne,
        };
        Ok(SequenceType::Item { item_type, occurrence })
    }

    pub(super) fn parse_single_type(&mut self) -> Result<SingleType, ParseError> {
        let (name, span) = self.parse_eqname(DefaultNamespace::None)?;
        let xs = self.resolve_atomic_type(&name, &span)?;
        let optional = self.matches(&TokenKind::QuestionMark);
        Ok(SingleType { name: xs, optional })
    }

    fn resolve_atomic_type(&self, name: &xpath_name::Name, span: &std::ops::Range<usize>) -> Result<Xs, ParseError> {
        let namespace = name.namespace().or(Some(xpath_name::XS_NAMESPACE));
        Xs::by_name(namespace, name.local_name()).ok_or_else(|| {
            ParseError::new(ParseErrorReason::UnknownAtomicType(name.to_full_name()), span.clone())
        })
    }

    fn parse_item_type(&mut self) -> Result<ItemType, ParseError> {
        if self.check(&TokenKind::Keyword(Keyword::Item))
            && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen)
        {
            self.advance();
            self.advance();
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(ItemType::Item);
        }
        if let Some(TokenKind::Keyword(kw)) = self.peek_kind() {
            if kw.is_node_kind_test() && self.peek_at(1).map(|t| &t.kind) == Some(&TokenKind::LeftParen) {
                match kw {
                    Keyword::Function => return self.parse_function_test(),
                    Keyword::Map => return self.parse_map_test(),
                    Keyword::Array => return self.parse_array_test(),
                    _ => return Ok(ItemType::Kind(self.parse_kind_test()?)),
                }
            }
        }
        let (name, span) = self.parse_eqname(DefaultNamespace::None)?;
        let xs = self.resolve_atomic_type(&name, &span)?;
        Ok(ItemType::AtomicOrUnion(xs))
    }

    fn parse_function_test(&mut self) -> Result<ItemType, ParseError> {
        self.require_version(Version::V3_0, "function item types")?;
        self.advance();
        self.advance();
        if self.matches(&TokenKind::Asterisk) {
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(ItemType::Function(FunctionTest::Any));
        }
        let mut parameter_types = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            parameter_types.push(self.parse_sequence_type()?);
            while self.matches(&TokenKind::Comma) {
                parameter_types.push(self.parse_sequence_type()?);
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        self.expect(TokenKind::Keyword(Keyword::As), "`as`")?;
        let return_type = Box::new(self.parse_sequence_type()?);
        Ok(ItemType::Function(FunctionTest::Typed {
            parameter_types,
            return_type,
        }))
    }

    fn parse_map_test(&mut self) -> Result<ItemType, ParseError> {
        self.require_version(Version::V3_1, "map item types")?;
        self.advance();
        self.advance();
        if self.matches(&TokenKind::Asterisk) {
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(ItemType::Map(MapTest::Any));
        }
        let (key_name, key_span) = self.parse_eqname(DefaultNamespace::None)?;
        let key_type = self.resolve_atomic_type(&key_name, &key_span)?;
        self.expect(TokenKind::Comma, "`,`")?;
        let value_type = Box::new(self.parse_sequence_type()?);
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(ItemType::Map(MapTest::Typed { key_type, value_type }))
    }

    fn parse_array_test(&mut self) -> Result<ItemType, ParseError> {
        self.require_version(Version::V3_1, "array item types")?;
        self.advance();
        self.advance();
        if self.matches(&TokenKind::Asterisk) {
            self.expect(TokenKind::RightParen, "`)`")?;
            return Ok(ItemType::Array(ArrayTest::Any));
        }
        let member_type = Box::new(self.parse_sequence_type()?);
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(ItemType::Array(ArrayTest::Typed(member_type)))
    }
}
