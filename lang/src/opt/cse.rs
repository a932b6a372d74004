//! Common subexpression elimination.
//!
//! Block-local value numbering over pure instructions: the first
//! occurrence of an (operator, operands) shape is kept and later
//! duplicates in the same block are rewritten to reuse its value.
//! Commutative operands are normalized in the key. Calls and phis are
//! never merged.

use crate::ir::{BinOp, CmpPred, Function, Instr, InstrId, Value};
use std::collections::HashMap;

type ValueKey = (u8, u64);

#[derive(PartialEq, Eq, Hash)]
enum Key {
    Binary(BinOp, ValueKey, ValueKey),
    Cmp(CmpPred, ValueKey, ValueKey),
    BoolToNum(ValueKey),
}

pub fn run(func: &mut Function) {
    // Replacements can expose further duplicates (operands become equal
    // only after their definitions are merged), so iterate to a fixpoint.
    loop {
        let mut repl: HashMap<InstrId, Value> = HashMap::new();
        for block in &func.blocks {
            let mut available: HashMap<Key, Value> = HashMap::new();
            for &id in &block.instrs {
                let Some(key) = key_for(&func.instrs[id.0]) else {
                    continue;
                };
                match available.get(&key) {
                    Some(existing) => {
                        repl.insert(id, *existing);
                    }
                    None => {
                        available.insert(key, Value::Instr(id));
                    }
                }
            }
        }
        if repl.is_empty() {
            break;
        }
        super::replace_values(func, &repl);
    }
}

fn key_for(instr: &Instr) -> Option<Key> {
    match instr {
        Instr::Binary { op, lhs, rhs } => {
            let mut a = value_key(*lhs);
            let mut b = value_key(*rhs);
            if op.is_commutative() && b < a {
                std::mem::swap(&mut a, &mut b);
            }
            Some(Key::Binary(*op, a, b))
        }
        Instr::Cmp { pred, lhs, rhs } => Some(Key::Cmp(*pred, value_key(*lhs), value_key(*rhs))),
        Instr::BoolToNum { value } => Some(Key::BoolToNum(value_key(*value))),
        Instr::Call { .. } | Instr::Phi { .. } => None,
    }
}

fn value_key(value: Value) -> ValueKey {
    match value {
        Value::Num(n) => (0, n.to_bits()),
        Value::Bool(b) => (1, b as u64),
        Value::Param(i) => (2, i as u64),
        Value::Instr(id) => (3, id.0 as u64),
    }
}
