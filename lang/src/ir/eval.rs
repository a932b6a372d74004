//! A reference interpreter over the IR.
//!
//! Executes defined functions directly from their SSA form: straight-line
//! per-block evaluation, branches decided by comparison results, and phi
//! nodes resolved against the edge control arrived from. Used by tests to
//! pin runtime semantics; the optimizer must never change what this
//! computes.

use super::{BlockId, Function, Instr, InstrId, Module, Terminator, Value};
use std::collections::HashMap;
use std::fmt;

// Backstop against mis-wired loops: the interpreter refuses to run a
// function for more than this many block transitions.
const MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UnknownFunction(String),
    NotDefined(String),
    ArityMismatch {
        name: String,
        required: usize,
        given: usize,
    },
    Malformed(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownFunction(name) => write!(f, "Unknown function '{name}'"),
            EvalError::NotDefined(name) => {
                write!(f, "Function '{name}' is declared but has no body")
            }
            EvalError::ArityMismatch {
                name,
                required,
                given,
            } => write!(
                f,
                "Function '{name}' requires {required} arguments, given {given}"
            ),
            EvalError::Malformed(reason) => write!(f, "Malformed function: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Num(f64),
    Bool(bool),
}

impl Slot {
    fn num(self) -> Result<f64, EvalError> {
        match self {
            Slot::Num(n) => Ok(n),
            Slot::Bool(_) => Err(EvalError::Malformed(
                "boolean used where a number is required".to_string(),
            )),
        }
    }

    fn boolean(self) -> Result<bool, EvalError> {
        match self {
            Slot::Bool(b) => Ok(b),
            Slot::Num(_) => Err(EvalError::Malformed(
                "number used where a boolean is required".to_string(),
            )),
        }
    }
}

/// Call a defined function by name with numeric arguments.
pub fn call(module: &Module, name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let func = module
        .get_function(name)
        .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    if func.is_declaration() {
        return Err(EvalError::NotDefined(name.to_string()));
    }
    if args.len() != func.params.len() {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            required: func.params.len(),
            given: args.len(),
        });
    }
    run(module, func, args)
}

fn run(module: &Module, func: &Function, args: &[f64]) -> Result<f64, EvalError> {
    let mut values: HashMap<InstrId, Slot> = HashMap::new();
    let mut block = func
        .entry()
        .ok_or_else(|| EvalError::NotDefined(func.name.clone()))?;
    let mut prev: Option<BlockId> = None;

    for _ in 0..MAX_STEPS {
        let current = &func.blocks[block.0];

        for &id in &current.instrs {
            let slot = match func.instr(id) {
                Instr::Phi { incomings } => {
                    let from = prev.ok_or_else(|| {
                        EvalError::Malformed("phi node in entry block".to_string())
                    })?;
                    let (value, _) = incomings
                        .iter()
                        .find(|(_, pred)| *pred == from)
                        .ok_or_else(|| {
                            EvalError::Malformed(
                                "phi has no incoming edge for the arriving block".to_string(),
                            )
                        })?;
                    resolve(*value, args, &values)?
                }
                Instr::Binary { op, lhs, rhs } => {
                    let lhs = resolve(*lhs, args, &values)?.num()?;
                    let rhs = resolve(*rhs, args, &values)?.num()?;
                    Slot::Num(op.apply(lhs, rhs))
                }
                Instr::Cmp { pred, lhs, rhs } => {
                    let lhs = resolve(*lhs, args, &values)?.num()?;
                    let rhs = resolve(*rhs, args, &values)?.num()?;
                    Slot::Bool(pred.apply(lhs, rhs))
                }
                Instr::BoolToNum { value } => {
                    let b = resolve(*value, args, &values)?.boolean()?;
                    Slot::Num(if b { 1.0 } else { 0.0 })
                }
                Instr::Call { callee, args: call_args } => {
                    let mut evaluated = Vec::with_capacity(call_args.len());
                    for arg in call_args {
                        evaluated.push(resolve(*arg, args, &values)?.num()?);
                    }
                    Slot::Num(call(module, callee, &evaluated)?)
                }
            };
            values.insert(id, slot);
        }

        let term = current
            .terminator
            .as_ref()
            .ok_or_else(|| EvalError::Malformed("block has no terminator".to_string()))?;
        match term {
            Terminator::Ret(value) => return resolve(*value, args, &values)?.num(),
            Terminator::Br(dest) => {
                prev = Some(block);
                block = *dest;
            }
            Terminator::CondBr {
                cond,
                then_dest,
                else_dest,
            } => {
                let taken = resolve(*cond, args, &values)?.boolean()?;
                prev = Some(block);
                block = if taken { *then_dest } else { *else_dest };
            }
        }
    }

    Err(EvalError::Malformed("step limit exceeded".to_string()))
}

fn resolve(value: Value, args: &[f64], values: &HashMap<InstrId, Slot>) -> Result<Slot, EvalError> {
    match value {
        Value::Num(n) => Ok(Slot::Num(n)),
        Value::Bool(b) => Ok(Slot::Bool(b)),
        Value::Param(i) => args
            .get(i as usize)
            .copied()
            .map(Slot::Num)
            .ok_or_else(|| EvalError::Malformed("parameter index out of range".to_string())),
        Value::Instr(id) => values
            .get(&id)
            .copied()
            .ok_or_else(|| EvalError::Malformed("use of an undefined value".to_string())),
    }
}
