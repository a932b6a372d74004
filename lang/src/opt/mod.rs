//! The per-function optimization pipeline.
//!
//! Invoked by the lowering engine once for every successfully completed
//! function, applying in fixed order: peephole simplification,
//! re-association, common subexpression elimination, and control-flow-graph
//! simplification. Every pass preserves what the reference interpreter in
//! `ir::eval` computes.

pub mod cse;
pub mod instcombine;
pub mod reassociate;
pub mod simplify_cfg;


use crate::ir::{Function, Instr, InstrId, Terminator, Value};
use std::collections::{HashMap, HashSet};

pub fn optimize_function(func: &mut Function) {
    if func.is_declaration() {
        return;
    }
    instcombine::run(func);
    reassociate::run(func);
    cse::run(func);
    simplify_cfg::run(func);
    sweep_dead_instrs(func);
}

/// Rewrite every operand in the function according to `repl`, resolving
/// replacement chains, and unlist the replaced instructions.
pub(crate) fn replace_values(func: &mut Function, repl: &HashMap<InstrId, Value>) {
    if repl.is_empty() {
        return;
    }

    let resolve = |mut value: Value| -> Value {
        let mut hops = 0;
        while let Value::Instr(id) = value {
            match repl.get(&id) {
                Some(next) if hops <= repl.len() => {
                    value = *next;
                    hops += 1;
                }
                _ => break,
            }
        }
        value
    };

    for instr in &mut func.instrs {
        match instr {
            Instr::Binary { lhs, rhs, .. } | Instr::Cmp { lhs, rhs, .. } => {
                *lhs = resolve(*lhs);
                *rhs = resolve(*rhs);
            }
            Instr::BoolToNum { value } => *value = resolve(*value),
            Instr::Call { args, .. } => {
                for arg in args {
                    *arg = resolve(*arg);
                }
            }
            Instr::Phi { incomings } => {
                for (value, _) in incomings {
                    *value = resolve(*value);
                }
            }
        }
    }

    for block in &mut func.blocks {
        if let Some(term) = &mut block.terminator {
            match term {
                Terminator::Ret(value) => *value = resolve(*value),
                Terminator::CondBr { cond, .. } => *cond = resolve(*cond),
                Terminator::Br(_) => {}
            }
        }
        block.instrs.retain(|id| !repl.contains_key(id));
    }
}

/// Unlist pure instructions whose results are never used. Calls are kept:
/// a callee may have effects this pass cannot see.
pub(crate) fn sweep_dead_instrs(func: &mut Function) {
    loop {
        let mut used: HashSet<InstrId> = HashSet::new();
        let mut mark = |value: &Value| {
            if let Value::Instr(id) = value {
                used.insert(*id);
            }
        };
        for block in &func.blocks {
            for &id in &block.instrs {
                match &func.instrs[id.0] {
                    Instr::Binary { lhs, rhs, .. } | Instr::Cmp { lhs, rhs, .. } => {
                        mark(lhs);
                        mark(rhs);
                    }
                    Instr::BoolToNum { value } => mark(value),
                    Instr::Call { args, .. } => args.iter().for_each(&mut mark),
                    Instr::Phi { incomings } => incomings.iter().for_each(|(v, _)| mark(v)),
                }
            }
            if let Some(term) = &block.terminator {
                match term {
                    Terminator::Ret(value) => mark(value),
                    Terminator::CondBr { cond, .. } => mark(cond),
                    Terminator::Br(_) => {}
                }
            }
        }

        let keep_always: Vec<bool> = func
            .instrs
            .iter()
            .map(|i| matches!(i, Instr::Call { .. }))
            .collect();
        let mut changed = false;
        for block in &mut func.blocks {
            let before = block.instrs.len();
            block
                .instrs
                .retain(|id| used.contains(id) || keep_always[id.0]);
            changed |= block.instrs.len() != before;
        }
        if !changed {
            break;
        }
    }
}
