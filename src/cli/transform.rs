//! Run a script against input data

use super::{CliError, codec_for};
use crate::{Config, Transformation};

/// Options for the transform command
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Script source
    pub script: String,
    /// Input document
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    pub config: Config,
}

/// Compile, decode the input, execute strictly and encode the result.
pub fn execute_transform(options: &TransformOptions) -> Result<String, CliError> {
    let transformation = Transformation::compile(&options.script, &options.config)?;
    for warning in transformation.warnings() {
        tracing::warn!("{}", warning);
    }

    let text = options.input.as_ref().ok_or(CliError::NoInput)?;
    let program = transformation.program();
    let input = codec_for(program.input_format())?.decode(text)?;

    let output = transformation.execute(input)?;
    let encoded = codec_for(program.output_format())?.encode(&output, options.pretty)?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(script: &str, input: Option<&str>) -> TransformOptions {
        TransformOptions {
            script: script.to_string(),
            input: input.map(str::to_string),
            pretty: false,
            config: Config::new(20),
        }
    }

    #[test]
    fn test_transform_json() {
        let script = "%utlx 1.0\ninput json\noutput json\n---\n{ n: count($input.items) }";
        let output = execute_transform(&options(script, Some(r#"{"items": [1, 2, 3]}"#))).unwrap();
        assert_eq!(output, r#"{"n":3}"#);
    }

    #[test]
    fn test_unsupported_format() {
        let script = "%utlx 1.0\ninput xml\n---\n$input";
        let err = execute_transform(&options(script, Some("<a/>"))).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFormat(f) if f == "xml"));
    }

    #[test]
    fn test_compile_errors_list_every_diagnostic() {
        let err = execute_transform(&options("%utlx 1.0\n---\n{ a: , b: }", Some("null")))
            .unwrap_err();
        assert!(matches!(err, CliError::Transform(crate::Error::Compile(_))));
        assert_eq!(err.to_string().lines().count(), 2);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bad_input_is_a_codec_error() {
        let err = execute_transform(&options("%utlx 1.0\n---\n$input", Some("{"))).unwrap_err();
        assert!(matches!(err, CliError::Codec(_)));
        assert!(err.to_string().starts_with("invalid json input"));
    }

    #[test]
    fn test_missing_input() {
        let err = execute_transform(&options("%utlx 1.0\n---\n1", None)).unwrap_err();
        assert!(matches!(err, CliError::NoInput));
    }
}
