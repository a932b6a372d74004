//! Structural well-formedness checks, run on every completed function
//! before it is handed to the optimizer.

use super::{BlockId, Function, Instr, Value};
use std::collections::HashSet;

/// Check a function's control-flow structure. A declaration is trivially
/// well formed. For a defined function this verifies that:
/// - every reachable block ends in a terminator,
/// - branch targets are blocks of this function,
/// - phi nodes appear only as a leading prefix of their block,
/// - each phi has exactly one incoming edge per predecessor, and none for
///   non-predecessors,
/// - every operand names a parameter, a constant, or an instruction that is
///   live in the function.
pub fn verify_function(func: &Function) -> Result<(), String> {
    let Some(entry) = func.entry() else {
        return Ok(());
    };

    let live_instrs: HashSet<_> = func
        .blocks
        .iter()
        .flat_map(|b| b.instrs.iter().copied())
        .collect();

    for block_id in reachable_blocks(func, entry) {
        let block = &func.blocks[block_id.0];

        let Some(term) = &block.terminator else {
            return Err(format!("block '{}' has no terminator", block.label));
        };
        for succ in term.successors() {
            if succ.0 >= func.blocks.len() {
                return Err(format!(
                    "block '{}' branches to a block outside the function",
                    block.label
                ));
            }
        }

        let preds: HashSet<BlockId> = func.preds(block_id).into_iter().collect();
        let mut seen_non_phi = false;
        for &id in &block.instrs {
            let instr = func.instr(id);
            match instr {
                Instr::Phi { incomings } => {
                    if seen_non_phi {
                        return Err(format!(
                            "phi in block '{}' does not lead its block",
                            block.label
                        ));
                    }
                    let incoming_blocks: HashSet<BlockId> =
                        incomings.iter().map(|(_, b)| *b).collect();
                    if incoming_blocks.len() != incomings.len() {
                        return Err(format!(
                            "phi in block '{}' has duplicate incoming blocks",
                            block.label
                        ));
                    }
                    if incoming_blocks != preds {
                        return Err(format!(
                            "phi in block '{}' does not cover its predecessors",
                            block.label
                        ));
                    }
                }
                _ => seen_non_phi = true,
            }
            for operand in operands(instr) {
                check_operand(func, operand, &live_instrs, &block.label)?;
            }
        }

        for operand in terminator_operands(term) {
            check_operand(func, operand, &live_instrs, &block.label)?;
        }
    }

    Ok(())
}

fn check_operand(
    func: &Function,
    value: Value,
    live: &HashSet<super::InstrId>,
    label: &str,
) -> Result<(), String> {
    match value {
        Value::Num(_) | Value::Bool(_) => Ok(()),
        Value::Param(i) => {
            if (i as usize) < func.params.len() {
                Ok(())
            } else {
                Err(format!("block '{label}' uses an out-of-range parameter"))
            }
        }
        Value::Instr(id) => {
            if live.contains(&id) {
                Ok(())
            } else {
                Err(format!("block '{label}' uses a value not defined in the function"))
            }
        }
    }
}

fn operands(instr: &Instr) -> Vec<Value> {
    match instr {
        Instr::Binary { lhs, rhs, .. } | Instr::Cmp { lhs, rhs, .. } => vec![*lhs, *rhs],
        Instr::BoolToNum { value } => vec![*value],
        Instr::Call { args, .. } => args.clone(),
        Instr::Phi { incomings } => incomings.iter().map(|(v, _)| *v).collect(),
    }
}

fn terminator_operands(term: &super::Terminator) -> Vec<Value> {
    match term {
        super::Terminator::Ret(v) => vec![*v],
        super::Terminator::Br(_) => vec![],
        super::Terminator::CondBr { cond, .. } => vec![*cond],
    }
}

/// Depth-first reachability from the entry block.
pub fn reachable_blocks(func: &Function, entry: BlockId) -> Vec<BlockId> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![entry];
    while let Some(block) = stack.pop() {
        if !seen.insert(block) {
            continue;
        }
        order.push(block);
        if let Some(term) = &func.blocks[block.0].terminator {
            for succ in term.successors() {
                if succ.0 < func.blocks.len() && !seen.contains(&succ) {
                    stack.push(succ);
                }
            }
        }
    }
    order
}
