// tests/lexer_tests.rs

use pql_compiler::ast::Token;
use pql_compiler::lexer::Lexer;
use rust_decimal::Decimal;
use std::str::FromStr;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize().unwrap()
}

// ============================================================================
// Punctuation
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("(", Token::LParen),
        (")", Token::RParen),
        (",", Token::Comma),
        ("*", Token::Star),
        ("+", Token::Plus),
        ("-", Token::Minus),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_whitespace_is_skipped() {
    assert_eq!(
        tokens("  eq ( a ,\t1 )\n"),
        vec![
            Token::Identifier("eq".to_string()),
            Token::LParen,
            Token::Identifier("a".to_string()),
            Token::Comma,
            Token::Integer(1),
            Token::RParen,
            Token::Eof,
        ]
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(tokens("42"), vec![Token::Integer(42), Token::Eof]);
    assert_eq!(
        tokens("1.50"),
        vec![Token::Decimal(Decimal::from_str("1.50").unwrap()), Token::Eof]
    );
}

#[test]
fn test_integer_out_of_range() {
    let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
    assert_eq!(err.position, 0);
    assert!(err.message.contains("out of range"));
}

#[test]
fn test_strings_with_either_quote() {
    assert_eq!(tokens("'TCGA-BRCA'"), vec![Token::String("TCGA-BRCA".to_string()), Token::Eof]);
    assert_eq!(
        tokens("\"chr12:123-456\""),
        vec![Token::String("chr12:123-456".to_string()), Token::Eof]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(tokens(r"'it\'s'"), vec![Token::String("it's".to_string()), Token::Eof]);
    assert_eq!(tokens(r"'a\\b'"), vec![Token::String("a\\b".to_string()), Token::Eof]);
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("eq(a,'open").tokenize().unwrap_err();
    assert_eq!(err.message, "Unterminated string");
    assert_eq!(err.position, 5);
}

#[test]
fn test_booleans() {
    assert_eq!(tokens("true false"), vec![Token::Boolean(true), Token::Boolean(false), Token::Eof]);
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn test_dotted_identifiers() {
    assert_eq!(
        tokens("donor.primarySite _score"),
        vec![
            Token::Identifier("donor.primarySite".to_string()),
            Token::Identifier("_score".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let err = Lexer::new("eq(a;1)").tokenize().unwrap_err();
    assert_eq!(err.position, 4);
    assert!(err.message.contains("';'"));
}
