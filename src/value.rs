use core::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::{
    interpreter::{Closure, EvaluationResult, EvaluationState},
    stack::ensure_sufficient_stack,
};

pub(crate) type PrimitiveFn = fn(Vec<Value>, &mut EvaluationState) -> EvaluationResult;

/// A procedure implemented natively. Primitives only ever see evaluated
/// arguments.
#[derive(Clone, Copy)]
pub struct Primitive {
    pub(crate) name: &'static str,
    pub(crate) function: PrimitiveFn,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// Every value the reader can produce and the evaluator can return. The
// expression tree is made of the same values, so `quote` can hand back
// syntax as data without any conversion.
//
// Lists can nest arbitrarily deep at runtime, so every walk over a value
// (clone, drop, print, compare) grows the stack as it descends.
pub enum Value {
    Symbol(String),
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nil,
    List(Vec<Value>),
    Primitive(Primitive),
    Closure(Rc<Closure>),
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "symbol",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Nil => "nil",
            Self::List(_) => "list",
            Self::Primitive(_) => "primitive",
            Self::Closure(_) => "closure",
        }
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Self::Primitive(_) | Self::Closure(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// Takes the items out of a list, or hands the value back unchanged.
    pub(crate) fn into_list(mut self) -> Result<Vec<Value>, Value> {
        if let Self::List(items) = &mut self {
            return Ok(std::mem::take(items));
        }
        Err(self)
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Self::Symbol(name) => Self::Symbol(name.clone()),
            Self::Integer(value) => Self::Integer(*value),
            Self::Float(value) => Self::Float(*value),
            Self::String(text) => Self::String(text.clone()),
            Self::Bool(value) => Self::Bool(*value),
            Self::Nil => Self::Nil,
            Self::List(items) => ensure_sufficient_stack(|| Self::List(items.clone())),
            Self::Primitive(primitive) => Self::Primitive(*primitive),
            Self::Closure(closure) => Self::Closure(Rc::clone(closure)),
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if let Self::List(items) = self {
            if items.is_empty() { return; }
            let items = std::mem::take(items);
            ensure_sufficient_stack(move || drop(items));
        }
    }
}

fn fmt_float(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Keep a fractional part so floats never read back as integers
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(name) => write!(f, "{}", name),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => fmt_float(*value, f),
            Self::String(text) => write!(f, "\"{}\"", text),
            Self::Bool(true) => write!(f, "#t"),
            Self::Bool(false) => write!(f, "#f"),
            Self::Nil => write!(f, "nil"),
            Self::List(items) => ensure_sufficient_stack(|| write!(f, "({})", items.iter().format(" "))),
            Self::Primitive(_) => write!(f, "#<primitive>"),
            Self::Closure(_) => write!(f, "#<closure>"),
        }
    }
}

// Closures reach their environment, which may hold the closure itself, so
// Debug goes through Display instead of being derived.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

/// Structural equality: same variant and same value. Procedures compare by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Nil, Self::Nil) => true,
            (Self::List(a), Self::List(b)) => ensure_sufficient_stack(|| a == b),
            (Self::Primitive(a), Self::Primitive(b)) => a.name == b.name,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
