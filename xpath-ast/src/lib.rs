//! Expression tree and versioned parser for XPath 1.0 through 3.1.
//!
//! A single [`parser::Parser`] handles every language version; which
//! constructs it accepts is gated at parse time by the
//! [`context::StaticContext`] it was built with, mirroring how
//! [`xpath_lexer::Lexer`] gates reserved words by version rather than
//! shipping four separate grammars.

pub mod ast;
pub mod context;
pub mod error;
pub mod node_test;
pub mod operator;
mod parser;
pub mod sequence_type;
pub mod span;

pub use context::StaticContext;
pub use error::{ParseError, ParseErrorReason};

use xpath_lexer::{Lexer, Token};

/// Lexes and parses `source` end to end under the given static context.
#[tracing::instrument(skip(source))]
pub fn compile(ctx: &StaticContext, source: &str) -> Result<ast::XPath, ParseError> {
    compile_with_extension_functions(ctx, source, std::iter::empty::<String>())
}

/// As [`compile`], but widening the lexer's function-name token
/// classification with `extension_names` first (spec.md §4.1
/// "Extension functions"), so a host's registered extension functions
/// parse as function calls rather than being misclassified as
/// name-tests.
pub fn compile_with_extension_functions<I, S>(
    ctx: &StaticContext,
    source: &str,
    extension_names: I,
) -> Result<ast::XPath, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut lexer = Lexer::new(ctx.version());
    lexer.register_extension_functions(extension_names);
    let tokens: Vec<Token> = lexer.scan(source)?;
    parser::parse(ctx, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{ExprSingle, PathExpr, PrimaryExpr, StepExpr};
    use xpath_lexer::Version;

    fn ctx(version: Version) -> StaticContext {
        StaticContext::new(version, xpath_name::Namespaces::default())
    }

    #[test]
    fn parses_a_bare_name_test_as_a_child_step() {
        let xpath = compile(&ctx(Version::V1_0), "foo").unwrap();
        assert_eq!(xpath.0.node.0.len(), 1);
        match &xpath.0.node.0[0].node {
            ExprSingle::Path(PathExpr { rooted, steps }) => {
                assert!(!rooted);
                assert_eq!(steps.len(), 1);
            }
            other => panic!("expected a path expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_an_absolute_path_with_a_predicate() {
        let xpath = compile(&ctx(Version::V1_0), "/bookstore/book[price > 10]").unwrap();
        match &xpath.0.node.0[0].node {
            ExprSingle::Path(PathExpr { rooted, steps }) => {
                assert!(rooted);
                assert_eq!(steps.len(), 2);
            }
            other => panic!("expected a path expression, got {other:?}"),
        }
    }

    #[test]
    fn for_expression_requires_at_least_version_2_0() {
        let err = compile(&ctx(Version::V1_0), "for $i in 1 to 3 return $i").unwrap_err();
        assert_eq!(err.code(), "XPST0003");
    }

    #[test]
    fn for_expression_parses_under_version_2_0() {
        let xpath = compile(&ctx(Version::V2_0), "for $i in 1 to 3 return $i * $i").unwrap();
        assert!(matches!(&xpath.0.node.0[0].node, ExprSingle::For(_)));
    }

    #[test]
    fn let_expression_requires_version_3_0() {
        let err = compile(&ctx(Version::V2_0), "let $x := 1 return $x").unwrap_err();
        assert_eq!(err.code(), "XPST0003");
        let xpath = compile(&ctx(Version::V3_0), "let $x := 1 return $x").unwrap();
        assert!(matches!(&xpath.0.node.0[0].node, ExprSingle::Let(_)));
    }

    #[test]
    fn map_constructor_requires_version_3_1() {
        let xpath = compile(&ctx(Version::V3_1), "map { \"a\": 1, \"b\": 2 }").unwrap();
        match &xpath.0.node.0[0].node {
            ExprSingle::Path(PathExpr { steps, .. }) => match &steps[0].node {
                StepExpr::Postfix { primary, .. } => {
                    assert!(matches!(primary.node, PrimaryExpr::MapConstructor(_)));
                }
                other => panic!("expected postfix step, got {other:?}"),
            },
            other => panic!("expected path expression, got {other:?}"),
        }
    }

    #[test]
    fn function_call_parses_arguments() {
        let xpath = compile(&ctx(Version::V1_0), "concat('a', 'b')").unwrap();
        match &xpath.0.node.0[0].node {
            ExprSingle::Path(PathExpr { steps, .. }) => match &steps[0].node {
                StepExpr::Postfix { primary, .. } => {
                    assert!(matches!(primary.node, PrimaryExpr::FunctionCall(_)));
                }
                other => panic!("expected postfix step, got {other:?}"),
            },
            other => panic!("expected path expression, got {other:?}"),
        }
    }

    #[test]
    fn arrow_operator_requires_version_3_0() {
        let err = compile(&ctx(Version::V2_0), "'a' => upper-case()").unwrap_err();
        assert_eq!(err.code(), "XPST0003");
        let xpath = compile(&ctx(Version::V3_0), "'a' => upper-case()").unwrap();
        assert!(matches!(&xpath.0.node.0[0].node, ExprSingle::Arrow { .. }));
    }

    #[test]
    fn unresolved_namespace_prefix_is_a_static_error() {
        let err = compile(&ctx(Version::V1_0), "nope:foo").unwrap_err();
        assert_eq!(err.code(), "XPST0008");
    }

    #[test]
    fn cast_as_parses_single_type_with_optional_marker() {
        let xpath = compile(&ctx(Version::V2_0), "\"1\" cast as xs:integer?").unwrap();
        assert!(matches!(&xpath.0.node.0[0].node, ExprSingle::CastAs { .. }));
    }
}
