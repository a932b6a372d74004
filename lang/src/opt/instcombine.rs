//! Peephole simplification: constant folding, numeric identities, and
//! degenerate phi collapsing, followed by a dead-instruction sweep.
//!
//! Identities that change a result for NaN operands (such as
//! `x * 0 -> 0`) are not applied; every pass must leave `ir::eval`
//! results unchanged.

use crate::ir::{BinOp, Function, Instr, InstrId, Value};
use std::collections::HashMap;

pub fn run(func: &mut Function) {
    loop {
        let mut repl: HashMap<InstrId, Value> = HashMap::new();
        for block in &func.blocks {
            for &id in &block.instrs {
                if let Some(value) = simplify(&func.instrs[id.0]) {
                    repl.insert(id, value);
                }
            }
        }
        if repl.is_empty() {
            break;
        }
        super::replace_values(func, &repl);
    }
    super::sweep_dead_instrs(func);
}

fn simplify(instr: &Instr) -> Option<Value> {
    match instr {
        Instr::Binary {
            op,
            lhs: Value::Num(a),
            rhs: Value::Num(b),
        } => Some(Value::Num(op.apply(*a, *b))),

        Instr::Binary {
            op: BinOp::Add,
            lhs,
            rhs: Value::Num(c),
        }
        | Instr::Binary {
            op: BinOp::Sub,
            lhs,
            rhs: Value::Num(c),
        } if *c == 0.0 => Some(*lhs),

        Instr::Binary {
            op: BinOp::Add,
            lhs: Value::Num(c),
            rhs,
        } if *c == 0.0 => Some(*rhs),

        Instr::Binary {
            op: BinOp::Mul,
            lhs,
            rhs: Value::Num(c),
        }
        | Instr::Binary {
            op: BinOp::Div,
            lhs,
            rhs: Value::Num(c),
        } if *c == 1.0 => Some(*lhs),

        Instr::Binary {
            op: BinOp::Mul,
            lhs: Value::Num(c),
            rhs,
        } if *c == 1.0 => Some(*rhs),

        Instr::Cmp {
            pred,
            lhs: Value::Num(a),
            rhs: Value::Num(b),
        } => Some(Value::Bool(pred.apply(*a, *b))),

        Instr::BoolToNum {
            value: Value::Bool(b),
        } => Some(Value::Num(if *b { 1.0 } else { 0.0 })),

        Instr::Phi { incomings }
            if !incomings.is_empty() && incomings.iter().all(|(v, _)| *v == incomings[0].0) =>
        {
            Some(incomings[0].0)
        }

        _ => None,
    }
}
