use crate::ir::Value;
use std::collections::HashMap;

/// Lexical scopes for the function body currently being lowered. A fresh
/// stack is installed at the start of each function; entering a loop pushes
/// a frame and leaving it pops the frame, so an induction variable shadows
/// an outer binding for exactly the extent of the loop and never leaks past
/// it.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Value>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Innermost binding for `name`, if any frame holds one.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
