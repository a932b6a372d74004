//! The SSA intermediate form produced by lowering.
//!
//! A module accumulates functions; a function owns its basic blocks plus an
//! arena of instructions. Every instruction defines its value exactly once,
//! and control-flow merges select values with phi nodes. Blocks end in an
//! explicit terminator; no instruction other than the first of a block is a
//! branch target.

pub mod eval;
pub mod verify;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub usize);

/// An SSA value: a numeric constant, a boolean constant (comparison
/// results), an incoming parameter, or the result of an instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Param(u32),
    Instr(InstrId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
            BinOp::Div => lhs / rhs,
        }
    }

    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::Add => "fadd",
            BinOp::Sub => "fsub",
            BinOp::Mul => "fmul",
            BinOp::Div => "fdiv",
        };
        write!(f, "{name}")
    }
}

/// Floating comparison predicates. `Ule` (unordered less-or-equal) is what
/// the `<` operator lowers to; see the lowering engine for why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpPred {
    /// Ordered equal: false when either operand is NaN.
    Oeq,
    /// Ordered not-equal: false when either operand is NaN.
    One,
    /// Unordered less-or-equal: true when either operand is NaN.
    Ule,
}

impl CmpPred {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpPred::Oeq => lhs == rhs,
            CmpPred::One => !lhs.is_nan() && !rhs.is_nan() && lhs != rhs,
            CmpPred::Ule => lhs.is_nan() || rhs.is_nan() || lhs <= rhs,
        }
    }
}

impl fmt::Display for CmpPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CmpPred::Oeq => "oeq",
            CmpPred::One => "one",
            CmpPred::Ule => "ule",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Arithmetic on two numeric values.
    Binary { op: BinOp, lhs: Value, rhs: Value },
    /// Comparison producing a boolean value.
    Cmp { pred: CmpPred, lhs: Value, rhs: Value },
    /// Boolean to numeric conversion: true -> 1.0, false -> 0.0.
    BoolToNum { value: Value },
    /// Call a function declared in the module.
    Call { callee: String, args: Vec<Value> },
    /// Select a value based on the predecessor block control arrived from.
    Phi { incomings: Vec<(Value, BlockId)> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminator {
    Ret(Value),
    Br(BlockId),
    CondBr {
        cond: Value,
        then_dest: BlockId,
        else_dest: BlockId,
    },
}

impl Terminator {
    /// Successor blocks of this terminator, in branch order.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Ret(_) => vec![],
            Terminator::Br(dest) => vec![*dest],
            Terminator::CondBr {
                then_dest,
                else_dest,
                ..
            } => vec![*then_dest, *else_dest],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub instrs: Vec<InstrId>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    /// Basic blocks in creation order; the first block is the entry.
    pub blocks: Vec<Block>,
    /// Instruction arena. Ids stay stable for the lifetime of the
    /// function; an instruction is live only while some block lists it.
    pub instrs: Vec<Instr>,
}

impl Function {
    /// A bare signature with no body yet.
    pub fn declaration(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            blocks: Vec::new(),
            instrs: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry(&self) -> Option<BlockId> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(BlockId(0))
        }
    }

    /// Append a block, uniquifying the label with a numeric suffix when the
    /// requested name is already taken.
    pub fn add_block(&mut self, name: &str) -> BlockId {
        let mut label = name.to_string();
        let mut n = 1;
        while self.blocks.iter().any(|b| b.label == label) {
            label = format!("{name}{n}");
            n += 1;
        }
        self.blocks.push(Block {
            label,
            instrs: Vec::new(),
            terminator: None,
        });
        BlockId(self.blocks.len() - 1)
    }

    /// Append an instruction to the end of `block`, returning its value.
    pub fn add_instr(&mut self, block: BlockId, instr: Instr) -> Value {
        let id = InstrId(self.instrs.len());
        self.instrs.push(instr);
        self.blocks[block.0].instrs.push(id);
        Value::Instr(id)
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0]
    }

    pub fn set_terminator(&mut self, block: BlockId, terminator: Terminator) {
        self.blocks[block.0].terminator = Some(terminator);
    }

    /// Add an incoming edge to an existing phi node. Loops use this to wire
    /// the back edge after the latch block is known.
    pub fn add_phi_incoming(&mut self, phi: Value, value: Value, block: BlockId) {
        let Value::Instr(id) = phi else {
            unreachable!("phi value must name an instruction");
        };
        match &mut self.instrs[id.0] {
            Instr::Phi { incomings } => incomings.push((value, block)),
            other => unreachable!("expected a phi node, found {other:?}"),
        }
    }

    /// Predecessors of `target`: every block whose terminator can branch to
    /// it.
    pub fn preds(&self, target: BlockId) -> Vec<BlockId> {
        let mut preds = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if let Some(term) = &block.terminator {
                if term.successors().contains(&target) {
                    preds.push(BlockId(i));
                }
            }
        }
        preds
    }

    /// Discard the body, leaving a bare declaration behind.
    pub fn clear_body(&mut self) {
        self.blocks.clear();
        self.instrs.clear();
    }

    // Sequential display numbers for instruction results, assigned in block
    // order so the printed form reads top to bottom.
    fn display_numbers(&self) -> HashMap<InstrId, usize> {
        let mut numbers = HashMap::new();
        for block in &self.blocks {
            for &id in &block.instrs {
                let n = numbers.len();
                numbers.insert(id, n);
            }
        }
        numbers
    }

    fn render_value(&self, value: Value, numbers: &HashMap<InstrId, usize>) -> String {
        match value {
            Value::Num(n) => format!("{n}"),
            Value::Bool(b) => format!("{b}"),
            Value::Param(i) => format!("%{}", self.params[i as usize]),
            Value::Instr(id) => match numbers.get(&id) {
                Some(n) => format!("%{n}"),
                None => format!("%?{}", id.0),
            },
        }
    }

    fn render_instr(&self, instr: &Instr, numbers: &HashMap<InstrId, usize>) -> String {
        match instr {
            Instr::Binary { op, lhs, rhs } => format!(
                "{op} {}, {}",
                self.render_value(*lhs, numbers),
                self.render_value(*rhs, numbers)
            ),
            Instr::Cmp { pred, lhs, rhs } => format!(
                "fcmp {pred} {}, {}",
                self.render_value(*lhs, numbers),
                self.render_value(*rhs, numbers)
            ),
            Instr::BoolToNum { value } => {
                format!("booltonum {}", self.render_value(*value, numbers))
            }
            Instr::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|a| self.render_value(*a, numbers))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("call @{callee}({args})")
            }
            Instr::Phi { incomings } => {
                let edges = incomings
                    .iter()
                    .map(|(v, b)| {
                        format!("[ {}, %{} ]", self.render_value(*v, numbers), self.blocks[b.0].label)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("phi {edges}")
            }
        }
    }

    fn render_terminator(&self, term: &Terminator, numbers: &HashMap<InstrId, usize>) -> String {
        match term {
            Terminator::Ret(value) => format!("ret {}", self.render_value(*value, numbers)),
            Terminator::Br(dest) => format!("br label %{}", self.blocks[dest.0].label),
            Terminator::CondBr {
                cond,
                then_dest,
                else_dest,
            } => format!(
                "br {}, label %{}, label %{}",
                self.render_value(*cond, numbers),
                self.blocks[then_dest.0].label,
                self.blocks[else_dest.0].label
            ),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("%{p}"))
            .collect::<Vec<_>>()
            .join(", ");

        if self.is_declaration() {
            return writeln!(f, "declare @{}({})", self.name, params);
        }

        let numbers = self.display_numbers();
        writeln!(f, "define @{}({}) {{", self.name, params)?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for &id in &block.instrs {
                writeln!(f, "  %{} = {}", numbers[&id], self.render_instr(&self.instrs[id.0], &numbers))?;
            }
            if let Some(term) = &block.terminator {
                writeln!(f, "  {}", self.render_terminator(term, &numbers))?;
            }
        }
        writeln!(f, "}}")
    }
}

/// The single long-lived collection of functions a session accumulates.
/// Constructed once by the caller and threaded explicitly through every
/// lowering call.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    /// Remove a function entirely, as if it was never lowered.
    pub fn remove_function(&mut self, name: &str) {
        self.functions.retain(|f| f.name != name);
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
