//! The lowering engine: walks AST nodes and emits SSA instructions into the
//! module held by a [`CodegenContext`].
//!
//! Any error aborts lowering of the current top-level statement only.
//! Statements already in the module are never touched; a function
//! declaration created by the failing statement is rolled back before the
//! error is surfaced, so a corrected redefinition can later succeed.

use super::context::CodegenContext;
use super::scope::ScopeStack;
use crate::ir::{verify, BinOp, CmpPred, Function, Instr, Value};
use crate::opt;
use crate::parser::ast::{Expr, Prototype, Stmt};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LowerError {
    UnknownVariable(String),
    UnknownFunction(String),
    ArityMismatch {
        name: String,
        required: usize,
        given: usize,
    },
    InvalidOperator(String),
    Redefinition(String),
    Malformed {
        function: String,
        reason: String,
    },
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LowerError::UnknownVariable(name) => write!(f, "Unknown variable '{name}'"),
            LowerError::UnknownFunction(name) => write!(f, "Unknown function '{name}'"),
            LowerError::ArityMismatch {
                name,
                required,
                given,
            } => write!(
                f,
                "Function '{name}' requires {required} arguments, given {given}"
            ),
            LowerError::InvalidOperator(op) => {
                write!(f, "Invalid binary operator, found '{op}'")
            }
            LowerError::Redefinition(name) => {
                write!(f, "Function '{name}' cannot be redefined")
            }
            LowerError::Malformed { function, reason } => {
                write!(f, "Function '{function}' is malformed: {reason}")
            }
        }
    }
}

impl CodegenContext {
    /// Lower one top-level statement against the module, returning the
    /// textual form of the lowered result. Bare expressions are wrapped in
    /// uniquely named parameterless functions so they flow through the same
    /// body-lowering (and rollback) path as `define`.
    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<String, LowerError> {
        match stmt {
            Stmt::Extern(proto) => {
                self.lower_prototype(proto);
                Ok(self.function_text(&proto.name))
            }
            Stmt::Define(def) => {
                self.lower_function(&def.proto, &def.body)?;
                Ok(self.function_text(&def.proto.name))
            }
            Stmt::Expr(expr) => {
                let proto = Prototype {
                    name: self.next_anon_name(),
                    params: Vec::new(),
                };
                self.lower_function(&proto, expr)?;
                Ok(self.function_text(&proto.name))
            }
        }
    }

    /// Declare a function signature in the module. Re-declaring an existing
    /// name leaves the earlier declaration in place.
    pub fn lower_prototype(&mut self, proto: &Prototype) {
        if self.module.get_function(&proto.name).is_none() {
            self.module
                .add_function(Function::declaration(proto.name.clone(), proto.params.clone()));
        }
    }

    /// Lower a full function definition: declaration lookup or creation,
    /// entry block, parameter binding, body, return, verification, and the
    /// optimizer. On failure the module is restored as if the attempt never
    /// happened.
    pub fn lower_function(&mut self, proto: &Prototype, body: &Expr) -> Result<(), LowerError> {
        let name = proto.name.clone();
        let created = self.module.get_function(&name).is_none();
        if created {
            self.lower_prototype(proto);
        }

        let func = self
            .module
            .get_function_mut(&name)
            .expect("declaration exists");
        if !func.is_declaration() {
            return Err(LowerError::Redefinition(name));
        }

        // Parameter names come from the declaration: when an `extern` came
        // first, its names win over the ones written in the `define`.
        let params = func.params.clone();
        let entry = func.add_block("entry");
        self.position_at_end(&name, entry);

        self.scopes = ScopeStack::new();
        for (i, param) in params.iter().enumerate() {
            self.scopes.define(param.clone(), Value::Param(i as u32));
        }

        let lowered = self.lower_expr(body).and_then(|value| {
            self.build_ret(value);
            let func = self.module.get_function(&name).expect("declaration exists");
            verify::verify_function(func).map_err(|reason| LowerError::Malformed {
                function: name.clone(),
                reason,
            })
        });

        if let Err(err) = lowered {
            if created {
                self.module.remove_function(&name);
            } else if let Some(func) = self.module.get_function_mut(&name) {
                func.clear_body();
            }
            self.clear_position();
            return Err(err);
        }

        let func = self
            .module
            .get_function_mut(&name)
            .expect("declaration exists");
        opt::optimize_function(func);
        self.clear_position();
        Ok(())
    }

    pub fn lower_expr(&mut self, expr: &Expr) -> Result<Value, LowerError> {
        match expr {
            Expr::Number(value) => Ok(Value::Num(*value)),
            Expr::Variable(name) => self
                .scopes
                .lookup(name)
                .ok_or_else(|| LowerError::UnknownVariable(name.clone())),
            Expr::Binary { lhs, op, rhs } => self.lower_binary(lhs, op, rhs),
            Expr::Call { callee, args } => self.lower_call(callee, args),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch),
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => self.lower_for(var, start, end, step.as_deref(), body),
        }
    }

    fn lower_binary(&mut self, lhs: &Expr, op: &str, rhs: &Expr) -> Result<Value, LowerError> {
        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;

        match op {
            "+" => Ok(self.emit(Instr::Binary {
                op: BinOp::Add,
                lhs,
                rhs,
            })),
            "-" => Ok(self.emit(Instr::Binary {
                op: BinOp::Sub,
                lhs,
                rhs,
            })),
            "*" => Ok(self.emit(Instr::Binary {
                op: BinOp::Mul,
                lhs,
                rhs,
            })),
            "/" => Ok(self.emit(Instr::Binary {
                op: BinOp::Div,
                lhs,
                rhs,
            })),
            // Comparisons produce a boolean that is immediately converted
            // back to the numeric type (1.0 / 0.0) to be usable as a value.
            // `<` lowers to `ule`, not a strict less-than; tests pin this.
            "==" => {
                let cmp = self.emit(Instr::Cmp {
                    pred: CmpPred::Oeq,
                    lhs,
                    rhs,
                });
                Ok(self.emit(Instr::BoolToNum { value: cmp }))
            }
            "<" => {
                let cmp = self.emit(Instr::Cmp {
                    pred: CmpPred::Ule,
                    lhs,
                    rhs,
                });
                Ok(self.emit(Instr::BoolToNum { value: cmp }))
            }
            other => Err(LowerError::InvalidOperator(other.to_string())),
        }
    }

    fn lower_call(&mut self, callee: &str, args: &[Expr]) -> Result<Value, LowerError> {
        let required = self
            .module
            .get_function(callee)
            .ok_or_else(|| LowerError::UnknownFunction(callee.to_string()))?
            .params
            .len();
        if required != args.len() {
            return Err(LowerError::ArityMismatch {
                name: callee.to_string(),
                required,
                given: args.len(),
            });
        }

        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.lower_expr(arg)?);
        }

        Ok(self.emit(Instr::Call {
            callee: callee.to_string(),
            args: lowered,
        }))
    }

    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Result<Value, LowerError> {
        let cond = self.lower_expr(condition)?;
        // The condition becomes a boolean test by comparing against zero.
        let test = self.emit(Instr::Cmp {
            pred: CmpPred::One,
            lhs: cond,
            rhs: Value::Num(0.0),
        });

        let then_block = self.append_block("then");
        let else_block = self.append_block("else");
        let merge_block = self.append_block("merge");
        self.build_cond_br(test, then_block, else_block);

        self.position_block(then_block);
        let then_value = self.lower_expr(then_branch)?;
        self.build_br(merge_block);
        // Lowering the branch may have moved the insertion point (nested
        // control flow); the phi must name the block we actually ended in.
        let then_end = self.current_block();

        self.position_block(else_block);
        let else_value = self.lower_expr(else_branch)?;
        self.build_br(merge_block);
        let else_end = self.current_block();

        self.position_block(merge_block);
        Ok(self.emit(Instr::Phi {
            incomings: vec![(then_value, then_end), (else_value, else_end)],
        }))
    }

    fn lower_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Result<Value, LowerError> {
        let start_value = self.lower_expr(start)?;
        let preheader = self.current_block();

        let header = self.append_block("loop");
        self.build_br(header);
        self.position_block(header);

        // The induction variable is a phi: start value from the preheader,
        // stepped value from the latch (wired below, once the latch block
        // is known).
        let induction = self.emit(Instr::Phi {
            incomings: vec![(start_value, preheader)],
        });

        self.scopes.push();
        self.scopes.define(var, induction);

        // The body is lowered for effect; its value is discarded.
        self.lower_expr(body)?;

        let step_value = match step {
            Some(step) => self.lower_expr(step)?,
            None => Value::Num(1.0),
        };
        let next = self.emit(Instr::Binary {
            op: BinOp::Add,
            lhs: induction,
            rhs: step_value,
        });

        let end_value = self.lower_expr(end)?;
        let test = self.emit(Instr::Cmp {
            pred: CmpPred::One,
            lhs: end_value,
            rhs: Value::Num(0.0),
        });

        let latch = self.current_block();
        let after = self.append_block("afterloop");
        self.build_cond_br(test, header, after);
        self.add_phi_incoming(induction, next, latch);

        self.position_block(after);
        self.scopes.pop();

        // Loops exist for effect, not value.
        Ok(Value::Num(0.0))
    }

    fn function_text(&self, name: &str) -> String {
        self.module
            .get_function(name)
            .map(|f| f.to_string())
            .unwrap_or_default()
    }
}
