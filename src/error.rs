use core::fmt;

use thiserror::Error;


/// How many arguments a procedure accepts, used when reporting an
/// [`YusoError::ArityMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exactly(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YusoError {
    #[error("syntax error: {0}")]
    SyntaxError(String),

    #[error("unbound symbol: {0}")]
    UnboundSymbol(String),

    #[error("arity mismatch: expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: Arity, got: usize },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize),
}

impl YusoError {
    /// Name of the error kind, as used by the scenario fixtures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyntaxError(_) => "SyntaxError",
            Self::UnboundSymbol(_) => "UnboundSymbol",
            Self::ArityMismatch { .. } => "ArityMismatch",
            Self::TypeMismatch(_) => "TypeMismatch",
            Self::DivisionByZero => "DivisionByZero",
            Self::ArithmeticOverflow => "ArithmeticOverflow",
            Self::RecursionLimit(_) => "RecursionLimit",
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::SyntaxError(message.into())
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }
}
