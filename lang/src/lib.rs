//! Front end for the ember language.
//!
//! The pipeline runs in three stages, each usable on its own:
//! - `lexer` turns source text into tokens, one at a time, via an ordered
//!   first-match rule table.
//! - `parser` consumes the token stream with one token of lookahead and
//!   builds the AST, using precedence climbing for binary expressions.
//! - `codegen` lowers the AST into the SSA form defined in `ir`, running
//!   the `opt` pass pipeline over each completed function.

pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod opt;
pub mod parser;

pub use error::EmberError;
