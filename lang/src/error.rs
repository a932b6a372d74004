//! Unified error handling for the ember front end.
//!
//! Each phase reports failures with its own error type; this module folds
//! them into one enum for drivers. Every error carries enough context to
//! locate the fault: lex and parse errors include line, column, and the
//! offending lexeme, lowering errors name the identifier or operator
//! involved.

#[cfg(test)]
mod tests;

use crate::codegen::compiler::LowerError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EmberError {
    Lex(LexError),
    Parse(ParseError),
    Lower(LowerError),
}

impl EmberError {
    /// Short kind tag, e.g. for log prefixes.
    pub fn kind(&self) -> &'static str {
        match self {
            EmberError::Lex(_) => "LexError",
            EmberError::Parse(_) => "ParseError",
            EmberError::Lower(_) => "LowerError",
        }
    }
}

impl fmt::Display for EmberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmberError::Lex(err) => write!(f, "{err}"),
            EmberError::Parse(err) => write!(f, "{err}"),
            EmberError::Lower(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EmberError {}

impl From<LexError> for EmberError {
    fn from(err: LexError) -> Self {
        EmberError::Lex(err)
    }
}

impl From<ParseError> for EmberError {
    fn from(err: ParseError) -> Self {
        EmberError::Parse(err)
    }
}

impl From<LowerError> for EmberError {
    fn from(err: LowerError) -> Self {
        EmberError::Lower(err)
    }
}
