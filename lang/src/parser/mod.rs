pub mod ast;


use crate::error::EmberError;
use crate::lexer::{TokenKind, TokenStream};
use ast::{Expr, FunctionDef, Prototype, Stmt};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    /// The lexeme actually found where something else was required.
    pub found: String,
}

impl ParseError {
    /// True when the parser ran out of input rather than hitting a wrong
    /// token: the offending lexeme is the end-of-input sentinel. Drivers
    /// use this to keep buffering a statement that spans several lines.
    pub fn at_end(&self) -> bool {
        self.found == "EOF"
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}, found '{}'",
            self.line, self.column, self.message, self.found
        )
    }
}

/// Binary operator precedence. Any lexeme not in the table has precedence
/// -1, which terminates the climbing loop. The table is fixed for the
/// process lifetime and deliberately lists more comparison operators than
/// the tokenizer can currently produce; lowering rejects the unsupported
/// ones.
const PRECEDENCE: &[(&str, i32)] = &[
    ("==", 100),
    ("!=", 100),
    (">=", 100),
    ("<=", 100),
    (">", 100),
    ("<", 100),
    ("+", 200),
    ("-", 200),
    ("*", 300),
    ("/", 300),
];

pub fn operator_precedence(lexeme: &str) -> i32 {
    PRECEDENCE
        .iter()
        .find(|(op, _)| *op == lexeme)
        .map(|(_, prec)| *prec)
        .unwrap_or(-1)
}

/// Recursive-descent parser over a token stream, looking exactly one token
/// ahead (the stream's `current` token).
pub struct Parser<'src> {
    stream: TokenStream<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(stream: TokenStream<'src>) -> Self {
        Self { stream }
    }

    /// Parse a whole program: `stmt ';' (stmt ';')*` until end of input.
    pub fn parse(mut self) -> Result<Vec<Stmt>, EmberError> {
        self.stream.next_token()?;
        if self.at(TokenKind::Eof) {
            return Ok(Vec::new());
        }
        self.parse_stmts()
    }

    fn parse_stmts(&mut self) -> Result<Vec<Stmt>, EmberError> {
        let mut stmts = Vec::new();
        loop {
            let stmt = self.parse_stmt()?;
            if !self.at(TokenKind::Semicolon) {
                return Err(self.error("Expected ';' after statement"));
            }
            stmts.push(stmt);
            // Consume the ';'; end of input ends the program.
            if self.stream.next_token()?.kind == TokenKind::Eof {
                break;
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, EmberError> {
        match self.stream.current.kind {
            TokenKind::Extern => Ok(Stmt::Extern(self.parse_extern()?)),
            TokenKind::Define => Ok(Stmt::Define(self.parse_define()?)),
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn parse_extern(&mut self) -> Result<Prototype, EmberError> {
        self.stream.next_token()?; // consume 'extern'
        self.parse_proto()
    }

    fn parse_define(&mut self) -> Result<FunctionDef, EmberError> {
        self.stream.next_token()?; // consume 'define'
        let proto = self.parse_proto()?;
        let body = self.parse_expr()?;
        Ok(FunctionDef { proto, body })
    }

    fn parse_proto(&mut self) -> Result<Prototype, EmberError> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.error("Expected name in prototype"));
        }
        let name = self.stream.current.lexeme.clone();

        if self.stream.next_token()?.kind != TokenKind::LeftParen {
            return Err(self.error("Expected '(' in prototype"));
        }

        let mut params = Vec::new();
        if self.stream.next_token()?.kind == TokenKind::Identifier {
            params.push(self.stream.current.lexeme.clone());
            while self.stream.next_token()?.kind == TokenKind::Comma {
                self.stream.next_token()?; // consume ','
                if !self.at(TokenKind::Identifier) {
                    return Err(self.error("Expected parameter name"));
                }
                params.push(self.stream.current.lexeme.clone());
            }
        }

        if !self.at(TokenKind::RightParen) {
            return Err(self.error("Expected ')' in prototype"));
        }
        self.stream.next_token()?; // consume ')'

        Ok(Prototype { name, params })
    }

    fn parse_expr(&mut self) -> Result<Expr, EmberError> {
        let lhs = self.parse_primary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// Precedence climbing. Operators at or above `min_prec` are absorbed;
    /// a strictly higher-precedence operator after `rhs` re-enters with
    /// `current + 1`, which makes equal-precedence chains left-associative.
    fn parse_binop_rhs(&mut self, min_prec: i32, mut lhs: Expr) -> Result<Expr, EmberError> {
        loop {
            let prec = operator_precedence(&self.stream.current.lexeme);
            if prec < min_prec {
                return Ok(lhs);
            }

            let op = self.stream.current.lexeme.clone();
            self.stream.next_token()?; // consume the operator

            let mut rhs = self.parse_primary()?;
            let next_prec = operator_precedence(&self.stream.current.lexeme);
            if prec < next_prec {
                rhs = self.parse_binop_rhs(prec + 1, rhs)?;
            }

            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EmberError> {
        match self.stream.current.kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::LeftParen => self.parse_paren(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            _ => Err(self.error("Expected an expression")),
        }
    }

    fn parse_number(&mut self) -> Result<Expr, EmberError> {
        let value = self
            .stream
            .current
            .lexeme
            .parse::<f64>()
            .map_err(|_| self.error("Invalid number literal"))?;
        self.stream.next_token()?;
        Ok(Expr::Number(value))
    }

    fn parse_paren(&mut self) -> Result<Expr, EmberError> {
        self.stream.next_token()?; // consume '('
        let inner = self.parse_expr()?;
        if !self.at(TokenKind::RightParen) {
            return Err(self.error("Expected ')'"));
        }
        self.stream.next_token()?; // consume ')'
        Ok(inner)
    }

    /// Either a plain variable reference or, when followed by `(`, a call
    /// with a comma-separated (possibly empty) argument list.
    fn parse_identifier(&mut self) -> Result<Expr, EmberError> {
        let name = self.stream.current.lexeme.clone();

        if self.stream.next_token()?.kind != TokenKind::LeftParen {
            return Ok(Expr::Variable(name));
        }

        let mut args = Vec::new();
        if self.stream.next_token()?.kind != TokenKind::RightParen {
            loop {
                args.push(self.parse_expr()?);
                if self.at(TokenKind::RightParen) {
                    break;
                }
                if !self.at(TokenKind::Comma) {
                    return Err(self.error("Expected ')' or ',' in argument list"));
                }
                self.stream.next_token()?; // consume ','
            }
        }
        self.stream.next_token()?; // consume ')'

        Ok(Expr::Call { callee: name, args })
    }

    fn parse_if(&mut self) -> Result<Expr, EmberError> {
        self.stream.next_token()?; // consume 'if'
        let condition = self.parse_expr()?;

        if !self.at(TokenKind::Then) {
            return Err(self.error("Expected 'then'"));
        }
        self.stream.next_token()?;
        let then_branch = self.parse_expr()?;

        if !self.at(TokenKind::Else) {
            return Err(self.error("Expected 'else'"));
        }
        self.stream.next_token()?;
        let else_branch = self.parse_expr()?;

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// `for ID = start, end [, step] then body`
    fn parse_for(&mut self) -> Result<Expr, EmberError> {
        self.stream.next_token()?; // consume 'for'

        if !self.at(TokenKind::Identifier) {
            return Err(self.error("Expected loop variable after 'for'"));
        }
        let var = self.stream.current.lexeme.clone();

        if self.stream.next_token()?.kind != TokenKind::Equal {
            return Err(self.error("Expected '=' after loop variable"));
        }
        self.stream.next_token()?;
        let start = self.parse_expr()?;

        if !self.at(TokenKind::Comma) {
            return Err(self.error("Expected ',' after loop start value"));
        }
        self.stream.next_token()?;
        let end = self.parse_expr()?;

        let step = if self.at(TokenKind::Comma) {
            self.stream.next_token()?;
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        if !self.at(TokenKind::Then) {
            return Err(self.error("Expected 'then' before loop body"));
        }
        self.stream.next_token()?;
        let body = self.parse_expr()?;

        Ok(Expr::For {
            var,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body: Box::new(body),
        })
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.stream.current.kind == kind
    }

    fn error(&self, message: impl Into<String>) -> EmberError {
        let token = &self.stream.current;
        EmberError::Parse(ParseError {
            message: message.into(),
            line: token.position.line,
            column: token.position.column,
            found: token.lexeme.clone(),
        })
    }
}
