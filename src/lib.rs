
mod builtin;
mod config;
mod context;
mod error;
mod frame;
mod interpreter;
mod parser;
pub mod repl;
mod stack;
mod value;

#[cfg(test)]
mod test_utils;

use std::sync::Once;

pub use config::{Config, DEFAULT_MAX_DEPTH, DEFAULT_PROMPT};
pub use context::EvaluationContext;
pub use error::{Arity, YusoError};
pub use interpreter::Closure;
pub use parser::{parse, read, tokenize, Token, MAX_NESTING_DEPTH};
pub use value::{Primitive, Value};

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber filtered by `RUST_LOG`, e.g.
/// `RUST_LOG=yuso=trace`. Does nothing when `RUST_LOG` is unset, and is safe
/// to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
