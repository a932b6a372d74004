use expect_test::{expect, Expect};

use super::*;

fn lex_all(input: &str) -> Result<Vec<Token>, LexError> {
    let mut stream = TokenStream::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = stream.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    Ok(tokens)
}

fn check_tokens(input: &str, expect: Expect) {
    let rendered = match lex_all(input) {
        Ok(tokens) => tokens
            .iter()
            .map(|t| {
                format!(
                    "{:?} {:?} @{}:{}:{}\n",
                    t.kind, t.lexeme, t.position.index, t.position.line, t.position.column
                )
            })
            .collect::<String>(),
        Err(err) => format!("error: {err}\n"),
    };
    expect.assert_eq(&rendered);
}

#[test]
fn lex_if_then_else_expression() {
    check_tokens(
        "if x then 1 else 2",
        expect![[r#"
            If "if" @0:1:1
            Identifier "x" @3:1:4
            Then "then" @5:1:6
            Number "1" @10:1:11
            Else "else" @12:1:13
            Number "2" @17:1:18
            Eof "EOF" @18:1:19
        "#]],
    );
}

#[test]
fn keywords_require_a_following_whitespace() {
    // `ifx` must not lex as the keyword `if` plus `x`.
    check_tokens(
        "ifx",
        expect![[r#"
            Identifier "ifx" @0:1:1
            Eof "EOF" @3:1:4
        "#]],
    );

    // A keyword hard against a delimiter is an identifier as well.
    check_tokens(
        "if(",
        expect![[r#"
            Identifier "if" @0:1:1
            LeftParen "(" @2:1:3
            Eof "EOF" @3:1:4
        "#]],
    );

    // A keyword at the very end of input lexes as an identifier.
    check_tokens(
        "then",
        expect![[r#"
            Identifier "then" @0:1:1
            Eof "EOF" @4:1:5
        "#]],
    );
}

#[test]
fn lex_number_literals() {
    check_tokens(
        "3.14 42",
        expect![[r#"
            Number "3.14" @0:1:1
            Number "42" @5:1:6
            Eof "EOF" @7:1:8
        "#]],
    );
}

#[test]
fn double_equal_wins_over_assignment() {
    check_tokens(
        "a == b = c < d",
        expect![[r#"
            Identifier "a" @0:1:1
            EqualEqual "==" @2:1:3
            Identifier "b" @5:1:6
            Equal "=" @7:1:8
            Identifier "c" @9:1:10
            Less "<" @11:1:12
            Identifier "d" @13:1:14
            Eof "EOF" @14:1:15
        "#]],
    );
}

#[test]
fn unknown_character_reports_position() {
    check_tokens(
        "a $ b",
        expect![[r#"
            error: [1:3] Unknown character '$'
        "#]],
    );
}

#[test]
fn positions_across_newlines() {
    check_tokens(
        "1\n  2\n3",
        expect![[r#"
            Number "1" @0:1:1
            Number "2" @4:2:3
            Number "3" @6:3:1
            Eof "EOF" @7:3:2
        "#]],
    );
}

#[test]
fn trailing_whitespace_recounts_to_end_of_input() {
    check_tokens(
        "1 \n",
        expect![[r#"
            Number "1" @0:1:1
            Eof "EOF" @3:2:1
        "#]],
    );
}

#[test]
fn empty_source_yields_eof_sentinel() {
    check_tokens(
        "",
        expect![[r#"
            Eof "EOF" @0:1:1
        "#]],
    );
}

#[test]
fn whitespace_only_source() {
    check_tokens(
        " \n ",
        expect![[r#"
            Eof "EOF" @3:2:2
        "#]],
    );
}

#[test]
fn start_line_offsets_session_positions() {
    let mut stream = TokenStream::with_start_line("x\ny", 5);
    let x = stream.next_token().unwrap();
    assert_eq!((x.position.line, x.position.column), (5, 1));
    let y = stream.next_token().unwrap();
    assert_eq!((y.position.line, y.position.column), (6, 1));
}

#[test]
fn punctuation_and_operators() {
    check_tokens(
        "( ) , ; + - * /",
        expect![[r#"
            LeftParen "(" @0:1:1
            RightParen ")" @2:1:3
            Comma "," @4:1:5
            Semicolon ";" @6:1:7
            Plus "+" @8:1:9
            Minus "-" @10:1:11
            Star "*" @12:1:13
            Slash "/" @14:1:15
            Eof "EOF" @15:1:16
        "#]],
    );
}
