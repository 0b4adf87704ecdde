// tests/lexer_tests.rs

use classad_lang::ast::Token;
use classad_lang::lexer::{LexError, Lexer};

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = vec![];
    loop {
        let token = lexer.next_token().expect("lex failure");
        let done = token == Token::Eof;
        out.push(token);
        if done {
            return out;
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("42 3.5 0"),
        vec![
            Token::Integer(42),
            Token::Float(3.5),
            Token::Integer(0),
            Token::Eof
        ]
    );
}

#[test]
fn test_number_then_dot_is_not_a_float() {
    // a dot not followed by a digit ends the number
    let mut lexer = Lexer::new("1.x");
    assert_eq!(lexer.next_token(), Ok(Token::Integer(1)));
    assert!(lexer.next_token().is_err()); // '.' alone is not a token
}

#[test]
fn test_string_literal() {
    assert_eq!(
        tokens(r#""hello world""#),
        vec![Token::String("hello world".to_string()), Token::Eof]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""say \"hi\"""#),
        vec![Token::String(r#"say "hi""#.to_string()), Token::Eof]
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("\"oops");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::Unterminated { what: "string", .. })
    ));
}

#[test]
fn test_time_literal() {
    assert_eq!(
        tokens("'2004-01-01T12:00:00'"),
        vec![Token::Time("2004-01-01T12:00:00".to_string()), Token::Eof]
    );
}

#[test]
fn test_keywords_any_case() {
    assert_eq!(
        tokens("True FALSE Undefined ERROR"),
        vec![
            Token::Boolean(true),
            Token::Boolean(false),
            Token::Undefined,
            Token::Error,
            Token::Eof
        ]
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_all_comparison_operators() {
    assert_eq!(
        tokens("< <= > >= == != =?= =!="),
        vec![
            Token::Lt,
            Token::LtEq,
            Token::Gt,
            Token::GtEq,
            Token::EqEq,
            Token::NotEq,
            Token::MetaEq,
            Token::MetaNeq,
            Token::Eof
        ]
    );
}

#[test]
fn test_arithmetic_and_logic() {
    assert_eq!(
        tokens("a + b * c && d || e"),
        vec![
            Token::Identifier("a".to_string()),
            Token::Plus,
            Token::Identifier("b".to_string()),
            Token::Star,
            Token::Identifier("c".to_string()),
            Token::And,
            Token::Identifier("d".to_string()),
            Token::Or,
            Token::Identifier("e".to_string()),
            Token::Eof
        ]
    );
}

#[test]
fn test_single_equals_is_assignment() {
    assert_eq!(
        tokens("Rank = 1"),
        vec![
            Token::Identifier("Rank".to_string()),
            Token::Assign,
            Token::Integer(1),
            Token::Eof
        ]
    );
}

#[test]
fn test_incomplete_operators() {
    let mut lexer = Lexer::new("a & b");
    lexer.next_token().unwrap();
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::IncompleteOperator { ch: '&', .. })
    ));

    let mut lexer = Lexer::new("a | b");
    lexer.next_token().unwrap();
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::IncompleteOperator { ch: '|', .. })
    ));

    let mut lexer = Lexer::new("!x");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::IncompleteOperator { ch: '!', .. })
    ));
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn test_scoped_name_is_one_token() {
    assert_eq!(
        tokens("MY.Memory"),
        vec![Token::Identifier("MY.Memory".to_string()), Token::Eof]
    );
}

#[test]
fn test_keyword_with_dot_is_an_identifier() {
    // "true.x" is an attribute reference, not the boolean keyword
    assert_eq!(
        tokens("true.x"),
        vec![Token::Identifier("true.x".to_string()), Token::Eof]
    );
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("a @ b");
    lexer.next_token().unwrap();
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnexpectedChar { ch: '@', .. })
    ));
}
