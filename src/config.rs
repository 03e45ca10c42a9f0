//! Caller-owned configuration for compiling and evaluating scripts.
//!
//! There is deliberately no `Default` impl: the error ceiling must always be
//! chosen by the caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of errors collected before a `TooManyErrors` abort
    pub max_errors: usize,
    /// Stop at the first error
    #[serde(default)]
    pub fail_fast: bool,
    /// Resynchronize after a parse error and keep collecting
    #[serde(default = "enabled")]
    pub enable_recovery: bool,
    #[serde(default)]
    pub limits: Limits,
}

fn enabled() -> bool {
    true
}

impl Config {
    pub fn new(max_errors: usize) -> Self {
        Config {
            max_errors,
            fail_fast: false,
            enable_recovery: true,
            limits: Limits::default(),
        }
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn enable_recovery(mut self, enable_recovery: bool) -> Self {
        self.enable_recovery = enable_recovery;
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether the parser keeps going after an error.
    pub fn recovers(&self) -> bool {
        self.enable_recovery && !self.fail_fast
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Evaluation budgets. Exceeding either is a terminal `ResourceExhausted` abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    /// Maximum nesting of parsed expressions, and of evaluation and closure
    /// calls. The default fits a thread with a 2 MiB stack.
    pub max_depth: usize,
    /// Maximum evaluation steps, unbounded when `None`
    pub max_steps: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 128,
            max_steps: None,
        }
    }
}
