use xpath_lexer::{Lexer, TokenKind, Version};

fn kinds(source: &str, version: Version) -> Vec<TokenKind> {
    Lexer::new(version)
        .scan(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn offsets_are_byte_ranges_into_the_source() {
    let tokens = Lexer::new(Version::V1_0).scan("foo/bar").unwrap();
    assert_eq!(tokens[0].offset, 0..3);
    assert_eq!(tokens[1].offset, 3..4);
    assert_eq!(tokens[2].offset, 4..7);
}

#[test]
fn wildcard_name_tests_tokenize_as_asterisk_and_colon_forms() {
    let tokens = kinds("ns:*", Version::V1_0);
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier("ns".into()),
            TokenKind::ColonAsterisk,
        ]
    );
    let tokens = kinds("*:local", Version::V1_0);
    assert_eq!(
        tokens,
        vec![TokenKind::AsteriskColon, TokenKind::Identifier("local".into())]
    );
}

#[test]
fn register_extension_functions_widens_function_name_category() {
    let mut lexer = Lexer::new(Version::V1_0);
    lexer.register_extension_functions(["custom-func"]);
    let tokens = lexer.scan("my:custom-func").unwrap();
    let last = tokens.last().unwrap();
    assert_eq!(
        last.category(lexer.extension_function_names()),
        xpath_lexer::TokenCategory::FunctionName
    );
}
