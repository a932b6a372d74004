//! Re-association of commutative expression chains.
//!
//! Operands of commutative operators are put into a canonical order
//! (constants to the right), and constant tails of same-operator chains
//! are folded together: `(x + c1) + c2` becomes `x + (c1 + c2)`. Both
//! rewrites expose more work to the later CSE pass.

use crate::ir::{Function, Instr, Value};

pub fn run(func: &mut Function) {
    // Canonical operand order first.
    for instr in &mut func.instrs {
        if let Instr::Binary { op, lhs, rhs } = instr {
            if op.is_commutative() && matches!(lhs, Value::Num(_)) && !matches!(rhs, Value::Num(_))
            {
                std::mem::swap(lhs, rhs);
            }
        }
    }

    // Fold constant tails until the chains bottom out.
    loop {
        let mut rewrites = Vec::new();
        for (i, instr) in func.instrs.iter().enumerate() {
            let Instr::Binary {
                op,
                lhs: Value::Instr(inner),
                rhs: Value::Num(c2),
            } = instr
            else {
                continue;
            };
            if !op.is_commutative() {
                continue;
            }
            if let Instr::Binary {
                op: inner_op,
                lhs: x,
                rhs: Value::Num(c1),
            } = &func.instrs[inner.0]
            {
                if inner_op == op {
                    rewrites.push((
                        i,
                        Instr::Binary {
                            op: *op,
                            lhs: *x,
                            rhs: Value::Num(op.apply(*c1, *c2)),
                        },
                    ));
                }
            }
        }
        if rewrites.is_empty() {
            break;
        }
        for (i, instr) in rewrites {
            func.instrs[i] = instr;
        }
    }

    super::sweep_dead_instrs(func);
}
