//! Compile once, run many times.
//!
//! ```
//! use utlx_core::{Config, Transformation, Udm};
//!
//! let script = "%utlx 1.0\ninput json\noutput json\n---\n{ total: $input.price * 2 }";
//! let transformation = Transformation::compile(script, &Config::new(20)).unwrap();
//!
//! let input = Udm::Object(utlx_core::udm::Object::new().with_property("price", Udm::Integer(21)));
//! let output = transformation.execute(input).unwrap();
//! assert_eq!(output.as_object().and_then(|o| o.property("total")), Some(&Udm::Integer(42)));
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::ast::Program;
use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::evaluator::{CancellationToken, Env, Evaluator};
use crate::parser::{ParseOutcome, parse};
use crate::stdlib::{Builtins, Stdlib};
use crate::udm::Udm;

/// A script that parsed without errors, ready to execute.
pub struct Transformation {
    program: Program,
    warnings: Vec<Diagnostic>,
    evaluator: Evaluator,
}

impl Transformation {
    /// Compile against the built-in function registry.
    pub fn compile(source: &str, config: &Config) -> Result<Self> {
        Self::compile_with(source, config, Arc::new(Builtins::new()))
    }

    #[tracing::instrument(skip_all)]
    pub fn compile_with(source: &str, config: &Config, stdlib: Arc<dyn Stdlib>) -> Result<Self> {
        match parse(source, config) {
            ParseOutcome::Success { program, warnings } => {
                debug!(warnings = warnings.len(), "compiled");
                Ok(Transformation {
                    program,
                    warnings,
                    evaluator: Evaluator::new(stdlib, config),
                })
            }
            ParseOutcome::Partial { diagnostics, .. } | ParseOutcome::Aborted { diagnostics } => {
                debug!(diagnostics = diagnostics.len(), "compilation failed");
                Err(Error::Compile(diagnostics))
            }
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.evaluator = self.evaluator.with_cancellation(token);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Run with `$input` bound; the first fault is the error.
    pub fn execute(&self, input: Udm) -> Result<Udm> {
        let env = Env::with_input(input);
        Ok(self.evaluator.evaluate(&self.program.content, &env)?)
    }
}

/// Everything found by [`validate`].
#[derive(Debug, Clone)]
pub struct Report {
    /// Parse diagnostics followed by evaluation diagnostics
    pub diagnostics: Vec<Diagnostic>,
    /// Output of the evaluation, when it ran and nothing failed
    pub value: Option<Udm>,
    pub aborted: bool,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Collect every diagnostic of a script against the built-in registry.
pub fn validate(source: &str, config: &Config, input: Option<Udm>) -> Report {
    validate_with(source, config, Arc::new(Builtins::new()), input)
}

/// Parse in collect mode and, given input, evaluate whatever parsed.
///
/// Subtrees lost to parse errors evaluate as tainted and add no diagnostics
/// of their own. The error ceiling covers both phases.
#[tracing::instrument(skip_all)]
pub fn validate_with(
    source: &str,
    config: &Config,
    stdlib: Arc<dyn Stdlib>,
    input: Option<Udm>,
) -> Report {
    let outcome = parse(source, config);
    let parse_errors = outcome.errors().count();
    let (program, mut diagnostics) = match outcome {
        ParseOutcome::Success { program, warnings } => (program, warnings),
        ParseOutcome::Partial {
            program,
            diagnostics,
        } => (program, diagnostics),
        ParseOutcome::Aborted { diagnostics } => {
            return Report {
                diagnostics,
                value: None,
                aborted: true,
            };
        }
    };

    let Some(input) = input else {
        return Report {
            diagnostics,
            value: None,
            aborted: false,
        };
    };

    let remaining = Config {
        max_errors: config.max_errors.saturating_sub(parse_errors),
        ..config.clone()
    };
    debug!(parse_errors, "evaluating for validation");
    let evaluation =
        Evaluator::new(stdlib, &remaining).validate(&program.content, &Env::with_input(input));
    diagnostics.extend(evaluation.diagnostics);
    Report {
        diagnostics,
        value: evaluation.value,
        aborted: evaluation.aborted,
    }
}
