/// Deepest nesting of evaluations before giving up with
/// [`YusoError::RecursionLimit`](crate::YusoError::RecursionLimit).
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

pub const DEFAULT_PROMPT: &str = "yuso> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_depth: usize,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            prompt: DEFAULT_PROMPT.to_owned(),
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}
