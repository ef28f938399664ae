use crate::{
    builtin::builtin_frame,
    config::Config,
    error::YusoError,
    frame::Env,
    interpreter::{evaluate, EvaluationState},
    parser::read,
    value::Value,
};


/// Owns the root environment that every top-level expression is evaluated
/// against. Definitions made by one call are visible to the next.
///
/// Text the program prints, such as a `dump-frame` listing, is buffered
/// until [`EvaluationContext::take_output`] collects it.
///
/// The environment is reference counted without synchronisation, so a
/// context stays on the thread that created it. Independent contexts share
/// nothing.
pub struct EvaluationContext {
    frame: Env,
    config: Config,
    output: String,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            frame: builtin_frame(),
            config,
            output: String::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn evaluate(&mut self, expression: &Value) -> Result<Value, YusoError> {
        let mut state = EvaluationState::new(self.config.max_depth);
        let result = evaluate(expression, &self.frame, &mut state);
        self.output.push_str(&state.take_output());
        result
    }

    /// Everything printed since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn evaluate_str(&mut self, input: &str) -> Result<Value, YusoError> {
        let expression = read(input)?;
        self.evaluate(&expression)
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}
