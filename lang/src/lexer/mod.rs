pub mod token;

pub use token::{Position, Token, TokenKind};

#[cfg(test)]
mod tests;

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnknownCharacter { ch: char, line: u32, column: u32 },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnknownCharacter { ch, line, column } => {
                write!(f, "[{}:{}] Unknown character '{}'", line, column, ch)
            }
        }
    }
}

/// The ordered rule table. Scanning is strictly first-match in declaration
/// order, not longest-match: keyword rules therefore assert a following
/// whitespace character so that `ifx` (or `if` hard against a delimiter)
/// falls through to the identifier rule. The asserted whitespace is matched
/// via a capture group and never consumed.
static RULES: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    fn rule(kind: TokenKind, pattern: &str) -> (TokenKind, Regex) {
        (kind, Regex::new(pattern).expect("lexer rule pattern is valid"))
    }

    vec![
        // Keywords, only when followed by whitespace
        rule(TokenKind::If, r"^(if)\s"),
        rule(TokenKind::Then, r"^(then)\s"),
        rule(TokenKind::Else, r"^(else)\s"),
        rule(TokenKind::For, r"^(for)\s"),
        rule(TokenKind::Define, r"^(define)\s"),
        rule(TokenKind::Extern, r"^(extern)\s"),
        // Number literals
        rule(TokenKind::Number, r"^\d+(?:\.\d+)?"),
        // Arithmetic operators
        rule(TokenKind::Plus, r"^\+"),
        rule(TokenKind::Minus, r"^-"),
        rule(TokenKind::Star, r"^\*"),
        rule(TokenKind::Slash, r"^/"),
        // Comparison operators; `==` must precede `=`
        rule(TokenKind::EqualEqual, r"^=="),
        rule(TokenKind::Equal, r"^="),
        rule(TokenKind::Less, r"^<"),
        // Delimiters
        rule(TokenKind::LeftParen, r"^\("),
        rule(TokenKind::RightParen, r"^\)"),
        rule(TokenKind::Comma, r"^,"),
        rule(TokenKind::Semicolon, r"^;"),
        // Identifiers last, as the catch-all for word-shaped input
        rule(TokenKind::Identifier, r"^[_a-zA-Z][_a-zA-Z0-9]*"),
    ]
});

pub fn rules() -> &'static [(TokenKind, Regex)] {
    RULES.as_slice()
}

/// Produces tokens from a source buffer one at a time, tracking the position
/// of the next unconsumed character. The most recently produced token is
/// kept in `current`; the parser looks exactly one token ahead through it.
pub struct TokenStream<'src> {
    source: &'src str,
    index: usize,
    line: u32,
    column: u32,
    start_line: u32,
    pub current: Token,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_start_line(source, 1)
    }

    /// Start line numbering at `line` instead of 1, so a driver feeding
    /// several buffers from one session can report session-wide positions.
    pub fn with_start_line(source: &'src str, line: u32) -> Self {
        let mut stream = Self {
            source,
            index: 0,
            line,
            column: 1,
            start_line: line,
            current: Token::eof(Position::new(0, line, 1)),
        };
        // Leading whitespace is skipped up front so the first token's
        // position is already correct.
        stream.skip_whitespace();
        stream
    }

    /// Produce the next token, advancing past it and any trailing
    /// whitespace. At end of input this returns the `EOF` sentinel token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.index == self.source.len() {
            self.current = Token::eof(self.position());
            return Ok(self.current.clone());
        }

        let source = self.source;
        let rest = &source[self.index..];
        for (kind, pattern) in rules() {
            if let Some(captures) = pattern.captures(rest) {
                let matched = captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                self.current = Token::new(*kind, matched, self.position());
                self.advance(matched.len());
                return Ok(self.current.clone());
            }
        }

        let ch = rest.chars().next().unwrap_or('\0');
        Err(LexError::UnknownCharacter {
            ch,
            line: self.line,
            column: self.column,
        })
    }

    fn position(&self) -> Position {
        Position::new(self.index, self.line, self.column)
    }

    // Advance index and column past the consumed lexeme, then skip trailing
    // whitespace.
    fn advance(&mut self, len: usize) {
        self.index += len;
        self.column += len as u32;
        self.skip_whitespace();
    }

    // Skip a run of space and newline characters, keeping line/column in
    // step. The incremental update must reproduce a full recount from the
    // start of the source at every token boundary.
    fn skip_whitespace(&mut self) {
        let source = self.source;
        let bytes = source.as_bytes();
        let start = self.index;
        let mut end = start;
        while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\n') {
            end += 1;
        }
        if end == start {
            return;
        }

        if end == bytes.len() {
            // Only whitespace remains: recount over the whole source.
            self.index = source.len();
            let newlines = source.bytes().filter(|&b| b == b'\n').count() as u32;
            self.line = self.start_line + newlines;
            self.column = match source.rfind('\n') {
                Some(last) => (source.len() - last) as u32,
                None => source.len() as u32 + 1,
            };
            return;
        }

        let span = &source[start..end];
        self.index = end;
        match span.rfind('\n') {
            Some(last) => {
                self.line += span.bytes().filter(|&b| b == b'\n').count() as u32;
                self.column = (span.len() - last) as u32;
            }
            None => self.column += span.len() as u32,
        }
    }
}
