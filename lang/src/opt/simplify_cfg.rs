//! Control-flow-graph simplification.
//!
//! Folds conditional branches whose condition is a constant, removes
//! blocks unreachable from the entry, collapses phis left with a single
//! incoming edge, and merges straight-line block pairs, repeating until
//! nothing changes. Phi incoming lists are kept consistent with the
//! predecessor sets throughout.

use crate::ir::{verify, BlockId, Function, Instr, InstrId, Terminator, Value};
use std::collections::{HashMap, HashSet};

pub fn run(func: &mut Function) {
    loop {
        let mut changed = false;
        changed |= fold_constant_branches(func);
        changed |= remove_unreachable_blocks(func);
        changed |= fold_single_incoming_phis(func);
        changed |= merge_straight_line_blocks(func);
        if !changed {
            break;
        }
    }
}

fn fold_constant_branches(func: &mut Function) -> bool {
    let mut changed = false;
    for i in 0..func.blocks.len() {
        let Some(Terminator::CondBr {
            cond,
            then_dest,
            else_dest,
        }) = func.blocks[i].terminator
        else {
            continue;
        };

        let (taken, removed) = match cond {
            Value::Bool(true) => (then_dest, Some(else_dest)),
            Value::Bool(false) => (else_dest, Some(then_dest)),
            _ if then_dest == else_dest => (then_dest, None),
            _ => continue,
        };

        func.blocks[i].terminator = Some(Terminator::Br(taken));
        if let Some(removed) = removed {
            if removed != taken {
                remove_phi_edges(func, removed, BlockId(i));
            }
        }
        changed = true;
    }
    changed
}

// The edge `pred -> block` no longer exists; drop matching phi incomings.
fn remove_phi_edges(func: &mut Function, block: BlockId, pred: BlockId) {
    let ids = func.blocks[block.0].instrs.clone();
    for id in ids {
        if let Instr::Phi { incomings } = &mut func.instrs[id.0] {
            incomings.retain(|(_, from)| *from != pred);
        }
    }
}

fn remove_unreachable_blocks(func: &mut Function) -> bool {
    let Some(entry) = func.entry() else {
        return false;
    };
    let reachable: HashSet<BlockId> = verify::reachable_blocks(func, entry).into_iter().collect();
    if reachable.len() == func.blocks.len() {
        return false;
    }
    compact_blocks(func, &reachable);
    true
}

fn fold_single_incoming_phis(func: &mut Function) -> bool {
    let mut repl: HashMap<InstrId, Value> = HashMap::new();
    for block in &func.blocks {
        for &id in &block.instrs {
            if let Instr::Phi { incomings } = &func.instrs[id.0] {
                if incomings.len() == 1 {
                    repl.insert(id, incomings[0].0);
                }
            }
        }
    }
    if repl.is_empty() {
        return false;
    }
    super::replace_values(func, &repl);
    true
}

fn merge_straight_line_blocks(func: &mut Function) -> bool {
    // A pair qualifies when `a` falls through unconditionally to `b`, `b`
    // has no other way in, and `b` carries no phis (a sole-predecessor
    // block only holds phis transiently, until the fold above runs).
    let candidate = (0..func.blocks.len()).find_map(|i| {
        let Some(Terminator::Br(b)) = func.blocks[i].terminator else {
            return None;
        };
        if b.0 == 0 || b.0 == i {
            return None;
        }
        if func.preds(b) != vec![BlockId(i)] {
            return None;
        }
        let has_phi = func.blocks[b.0]
            .instrs
            .iter()
            .any(|&id| matches!(func.instrs[id.0], Instr::Phi { .. }));
        if has_phi {
            return None;
        }
        Some((BlockId(i), b))
    });
    let Some((a, b)) = candidate else {
        return false;
    };

    let spliced = std::mem::replace(
        &mut func.blocks[b.0],
        crate::ir::Block {
            label: String::new(),
            instrs: Vec::new(),
            terminator: None,
        },
    );
    func.blocks[a.0].instrs.extend(spliced.instrs);
    func.blocks[a.0].terminator = spliced.terminator;

    // Control now arrives at b's successors from a.
    for instr in &mut func.instrs {
        if let Instr::Phi { incomings } = instr {
            for (_, pred) in incomings {
                if *pred == b {
                    *pred = a;
                }
            }
        }
    }

    let keep: HashSet<BlockId> = (0..func.blocks.len())
        .map(BlockId)
        .filter(|id| *id != b)
        .collect();
    compact_blocks(func, &keep);
    true
}

// Drop every block not in `keep`, renumbering the survivors and rewriting
// all block references. Callers must have rewired any edges into dropped
// blocks first; phi incomings from dropped blocks are discarded here.
fn compact_blocks(func: &mut Function, keep: &HashSet<BlockId>) {
    let mut remap: HashMap<BlockId, BlockId> = HashMap::new();
    let mut kept = Vec::new();
    let blocks = std::mem::take(&mut func.blocks);
    for (i, block) in blocks.into_iter().enumerate() {
        if keep.contains(&BlockId(i)) {
            remap.insert(BlockId(i), BlockId(kept.len()));
            kept.push(block);
        }
    }
    func.blocks = kept;

    for instr in &mut func.instrs {
        if let Instr::Phi { incomings } = instr {
            incomings.retain(|(_, from)| remap.contains_key(from));
            for (_, from) in incomings {
                *from = remap[from];
            }
        }
    }
    for block in &mut func.blocks {
        if let Some(term) = &mut block.terminator {
            match term {
                Terminator::Br(dest) => *dest = remap[dest],
                Terminator::CondBr {
                    then_dest,
                    else_dest,
                    ..
                } => {
                    *then_dest = remap[then_dest];
                    *else_dest = remap[else_dest];
                }
                Terminator::Ret(_) => {}
            }
        }
    }
}
