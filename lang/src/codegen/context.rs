//! Shared lowering state: the module under construction, the builder's
//! insertion point, and the symbol table for the function being lowered.
//!
//! The context is constructed once by the caller and passed to every
//! lowering call; two contexts never share state, so independent sessions
//! can compile side by side.

use super::scope::ScopeStack;
use crate::ir::{BlockId, Instr, Module, Terminator, Value};

pub struct CodegenContext {
    pub module: Module,
    pub scopes: ScopeStack,
    current_function: Option<String>,
    current_block: Option<BlockId>,
    anon_counter: usize,
}

impl CodegenContext {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            scopes: ScopeStack::new(),
            current_function: None,
            current_block: None,
            anon_counter: 0,
        }
    }

    /// Position the builder at the end of `block` inside `function`.
    pub fn position_at_end(&mut self, function: &str, block: BlockId) {
        self.current_function = Some(function.to_string());
        self.current_block = Some(block);
    }

    /// Move the insertion point within the current function.
    pub fn position_block(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    pub fn clear_position(&mut self) {
        self.current_function = None;
        self.current_block = None;
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block.expect("builder is positioned in a block")
    }

    /// Fresh name for a top-level expression wrapped as a function.
    pub fn next_anon_name(&mut self) -> String {
        let name = format!("__anon{}", self.anon_counter);
        self.anon_counter += 1;
        name
    }

    pub fn emit(&mut self, instr: Instr) -> Value {
        let block = self.current_block();
        self.current_function_mut().add_instr(block, instr)
    }

    pub fn append_block(&mut self, name: &str) -> BlockId {
        self.current_function_mut().add_block(name)
    }

    pub fn build_ret(&mut self, value: Value) {
        let block = self.current_block();
        self.current_function_mut()
            .set_terminator(block, Terminator::Ret(value));
    }

    pub fn build_br(&mut self, dest: BlockId) {
        let block = self.current_block();
        self.current_function_mut()
            .set_terminator(block, Terminator::Br(dest));
    }

    pub fn build_cond_br(&mut self, cond: Value, then_dest: BlockId, else_dest: BlockId) {
        let block = self.current_block();
        self.current_function_mut().set_terminator(
            block,
            Terminator::CondBr {
                cond,
                then_dest,
                else_dest,
            },
        );
    }

    pub fn add_phi_incoming(&mut self, phi: Value, value: Value, block: BlockId) {
        self.current_function_mut().add_phi_incoming(phi, value, block);
    }

    fn current_function_mut(&mut self) -> &mut crate::ir::Function {
        let name = self
            .current_function
            .clone()
            .expect("builder is positioned in a function");
        self.module
            .get_function_mut(&name)
            .expect("the current function exists in the module")
    }
}
