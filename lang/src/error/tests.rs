use super::*;

#[test]
fn lex_errors_carry_position_and_character() {
    let err = EmberError::from(LexError::UnknownCharacter {
        ch: '$',
        line: 1,
        column: 3,
    });
    assert_eq!(err.to_string(), "[1:3] Unknown character '$'");
    assert_eq!(err.kind(), "LexError");
}

#[test]
fn parse_errors_carry_position_and_found_lexeme() {
    let err = EmberError::from(ParseError {
        message: "Expected 'then'".to_string(),
        line: 1,
        column: 6,
        found: "1".to_string(),
    });
    assert_eq!(err.to_string(), "[1:6] Expected 'then', found '1'");
    assert_eq!(err.kind(), "ParseError");
}

#[test]
fn lower_error_messages_name_the_offender() {
    let cases = [
        (
            LowerError::UnknownVariable("z".to_string()),
            "Unknown variable 'z'",
        ),
        (
            LowerError::UnknownFunction("bar".to_string()),
            "Unknown function 'bar'",
        ),
        (
            LowerError::ArityMismatch {
                name: "foo".to_string(),
                required: 2,
                given: 1,
            },
            "Function 'foo' requires 2 arguments, given 1",
        ),
        (
            LowerError::InvalidOperator("%".to_string()),
            "Invalid binary operator, found '%'",
        ),
        (
            LowerError::Redefinition("foo".to_string()),
            "Function 'foo' cannot be redefined",
        ),
    ];
    for (err, expected) in cases {
        let unified = EmberError::from(err);
        assert_eq!(unified.to_string(), expected);
        assert_eq!(unified.kind(), "LowerError");
    }
}

#[test]
fn ember_error_is_a_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    let err = EmberError::from(LowerError::UnknownVariable("z".to_string()));
    takes_error(&err);
}
