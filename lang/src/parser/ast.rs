//! AST node types for ember programs.
//!
//! Nodes are built bottom-up by the parser: every child is fully formed
//! before its parent is constructed, and each node owns its children
//! exclusively (tree-shaped, no sharing).

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    /// Binary operators are kept as their source lexeme; the lowering pass
    /// is the single place that polices the operator set.
    Binary {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
}

/// A function signature: name plus parameter names in declaration order.
/// Every parameter and the return value use the one numeric scalar type.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub proto: Prototype,
    pub body: Expr,
}

/// A top-level statement, terminated by `;` in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Extern(Prototype),
    Define(FunctionDef),
    Expr(Expr),
}
