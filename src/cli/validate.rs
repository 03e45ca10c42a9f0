//! Collect every diagnostic of a script

use super::{CliError, codec_for};
use crate::transformation::{Report, validate};
use crate::{Config, parse};

/// Options for the validate command
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub script: String,
    /// Optional input; when given the script is also evaluated
    pub input: Option<String>,
    pub config: Config,
}

pub fn execute_validate(options: &ValidateOptions) -> Result<Report, CliError> {
    let input = match &options.input {
        Some(text) => {
            // The input format comes from the header, which may itself be broken
            let format = parse(&options.script, &options.config)
                .program()
                .and_then(|p| p.input_format().map(str::to_string));
            Some(codec_for(format.as_deref())?.decode(text)?)
        }
        None => None,
    };
    Ok(validate(&options.script, &options.config, input))
}

/// Human-readable lines, or a JSON array for tooling.
pub fn render_report(report: &Report, json: bool) -> Result<String, CliError> {
    if json {
        return Ok(serde_json::to_string_pretty(&report.diagnostics)?);
    }
    let mut lines: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
    let errors = report.errors().count();
    lines.push(match errors {
        0 => "Script is valid".to_string(),
        1 => "1 error".to_string(),
        n => format!("{} errors", n),
    });
    Ok(lines.join("\n"))
}
