use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{error::YusoError, interpreter::EvaluationResult, stack::ensure_sufficient_stack, value::Value};

/// Shared handle to a frame. Closures and child frames hold one each, so a
/// frame lives exactly as long as something can still reach it.
pub(crate) type Env = Rc<Frame>;

pub(crate) struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

impl Frame {
    pub(crate) fn root(bindings: HashMap<String, Value>) -> Env {
        Rc::new(Self {
            parent: None,
            bindings: RefCell::new(bindings),
        })
    }

    pub(crate) fn new(parent: &Env) -> Env {
        Rc::new(Self {
            parent: Some(Rc::clone(parent)),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Binds `key` in this frame, shadowing any outer binding.
    pub(crate) fn insert(&self, key: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(key.into(), value);
    }

    pub(crate) fn get(&self, key: &str) -> EvaluationResult {
        if let Some(value) = self.bindings.borrow().get(key) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(key),
            None => Err(YusoError::UnboundSymbol(key.to_owned())),
        }
    }

    /// Rebinds `key` in the innermost frame that already holds it.
    pub(crate) fn update(&self, key: &str, value: Value) -> EvaluationResult {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(key) {
            *slot = value.clone();
            return Ok(value);
        }
        match &self.parent {
            Some(parent) => parent.update(key, value),
            None => Err(YusoError::UnboundSymbol(key.to_owned())),
        }
    }

    /// This frame's own bindings, sorted by name.
    pub(crate) fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<_> = self.bindings.borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}

// A binding may hold a closure whose environment holds another closure, and
// so on, so tearing a frame down can recurse without bound.
impl Drop for Frame {
    fn drop(&mut self) {
        let bindings = std::mem::take(self.bindings.get_mut());
        let parent = self.parent.take();
        ensure_sufficient_stack(move || drop((bindings, parent)));
    }
}
