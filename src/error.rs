use crate::codec::CodecError;
use crate::diagnostics::Diagnostic;
use crate::evaluator::EvalError;

/// Errors returned by the transformation API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The script has errors; every diagnostic is included, warnings too
    #[error("compilation failed: {}", first_error(.0))]
    Compile(Vec<Diagnostic>),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Compile(diagnostics) => diagnostics,
            Error::Evaluation(e) => &e.diagnostics,
            Error::Codec(_) => &[],
        }
    }
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    match diagnostics.iter().find(|d| d.is_error()) {
        Some(d) => d.to_string(),
        None => "unknown error".to_string(),
    }
}
