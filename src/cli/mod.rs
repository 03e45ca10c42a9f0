//! CLI support for utlx-core
//!
//! Provides programmatic access to the `utlx` commands so other tools can
//! embed them.

mod transform;
mod validate;

pub use transform::{TransformOptions, execute_transform};
pub use validate::{ValidateOptions, execute_validate, render_report};

use std::io;

use crate::codec::{Codec, CodecError, JsonCodec};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Compilation or evaluation error
    #[error("{}", describe(.0))]
    Transform(#[source] crate::Error),
    /// Input could not be decoded or output encoded
    #[error("{0}")]
    Codec(#[from] CodecError),
    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
    /// No codec for the format named in a directive
    #[error("Unsupported format: '{0}' (only json is built in)")]
    UnsupportedFormat(String),
}

/// Compile errors print every diagnostic, one per line.
fn describe(error: &crate::Error) -> String {
    match error {
        crate::Error::Compile(diagnostics) => diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::Codec(e) => CliError::Codec(e),
            e => CliError::Transform(e),
        }
    }
}

/// Codec for a directive's format name; scripts without one default to JSON.
pub fn codec_for(format: Option<&str>) -> Result<Box<dyn Codec>, CliError> {
    match format {
        None | Some("json") => Ok(Box::new(JsonCodec)),
        Some(other) => Err(CliError::UnsupportedFormat(other.to_string())),
    }
}
