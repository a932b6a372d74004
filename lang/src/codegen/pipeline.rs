//! The front-end pipeline: feeds source text through lexing, parsing, and
//! lowering against one long-lived module.
//!
//! A [`Session`] is what a driver holds for the lifetime of an interactive
//! run. Input arrives a line at a time; a statement is buffered until it is
//! syntactically complete, so statements may span several input lines. The
//! module accumulates every successfully lowered statement until the
//! session ends.

use super::context::CodegenContext;
use crate::error::EmberError;
use crate::ir::Module;
use crate::lexer::TokenStream;
use crate::parser::ast::Stmt;
use crate::parser::Parser;

pub struct Session {
    ctx: CodegenContext,
    pending: String,
    pending_start_line: u32,
    next_line: u32,
}

impl Session {
    pub fn new() -> Self {
        Self {
            ctx: CodegenContext::new("main"),
            pending: String::new(),
            pending_start_line: 1,
            next_line: 1,
        }
    }

    /// Feed one input line. Returns one result per lowered statement: the
    /// textual form of its lowered representation, or the error that ended
    /// processing of this input. An empty vec means the buffered statement
    /// is still incomplete and the session is waiting for more input.
    pub fn feed_line(&mut self, line: &str) -> Vec<Result<String, EmberError>> {
        if self.pending.is_empty() {
            self.pending_start_line = self.next_line;
        }
        self.pending.push_str(line);
        self.pending.push('\n');
        self.next_line += 1;

        let stream = TokenStream::with_start_line(&self.pending, self.pending_start_line);
        match Parser::new(stream).parse() {
            Ok(stmts) => {
                self.pending.clear();
                self.lower_all(&stmts)
            }
            // Ran out of tokens mid-statement: keep buffering.
            Err(EmberError::Parse(err)) if err.at_end() => Vec::new(),
            Err(err) => {
                self.pending.clear();
                vec![Err(err)]
            }
        }
    }

    /// Lower a complete source buffer in one shot (file and inline modes).
    pub fn run_source(&mut self, source: &str) -> Vec<Result<String, EmberError>> {
        match Parser::new(TokenStream::new(source)).parse() {
            Ok(stmts) => self.lower_all(&stmts),
            Err(err) => vec![Err(err)],
        }
    }

    fn lower_all(&mut self, stmts: &[Stmt]) -> Vec<Result<String, EmberError>> {
        let mut results = Vec::new();
        for stmt in stmts {
            match self.ctx.lower_stmt(stmt) {
                Ok(text) => results.push(Ok(text)),
                Err(err) => {
                    // The failing statement has been rolled back already;
                    // the rest of this input is skipped.
                    results.push(Err(err.into()));
                    break;
                }
            }
        }
        results
    }

    pub fn module(&self) -> &Module {
        &self.ctx.module
    }

    pub fn module_text(&self) -> String {
        self.ctx.module.to_string()
    }

    /// True while the session holds an incomplete statement.
    pub fn has_pending_input(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
