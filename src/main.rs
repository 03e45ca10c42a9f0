use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use utlx_core::Config;
use utlx_core::cli::{self, CliError, TransformOptions, ValidateOptions};

#[derive(ClapParser)]
#[command(name = "utlx")]
#[command(about = "UTL-X - Format-agnostic transformations over a universal data model")]
#[command(version)]
struct Cli {
    /// Log compiler and evaluator phases to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script against an input document
    Transform {
        /// Path to the .utlx script
        script: PathBuf,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Report every error in a script, optionally evaluating it
    Validate {
        /// Path to the .utlx script
        script: PathBuf,

        /// Input file to evaluate the script against
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Errors collected before giving up
        #[arg(long, default_value_t = 20)]
        max_errors: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Transform {
            script,
            input,
            pretty,
        } => run_transform(script, input, pretty),
        Commands::Validate {
            script,
            input,
            json,
            max_errors,
        } => run_validate(script, input, json, max_errors),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("utlx_core={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Read the input file, or stdin when it is piped.
fn read_input(path: Option<PathBuf>) -> Result<Option<String>, CliError> {
    match path {
        Some(path) => Ok(Some(fs::read_to_string(path)?)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_transform(
    script: PathBuf,
    input: Option<PathBuf>,
    pretty: bool,
) -> Result<bool, CliError> {
    let options = TransformOptions {
        script: fs::read_to_string(script)?,
        input: read_input(input)?,
        pretty,
        config: Config::new(20),
    };
    println!("{}", cli::execute_transform(&options)?);
    Ok(true)
}

fn run_validate(
    script: PathBuf,
    input: Option<PathBuf>,
    json: bool,
    max_errors: usize,
) -> Result<bool, CliError> {
    let options = ValidateOptions {
        script: fs::read_to_string(script)?,
        // Only an explicit file; validate never waits on stdin
        input: match input {
            Some(path) => Some(fs::read_to_string(path)?),
            None => None,
        },
        config: Config::new(max_errors),
    };
    let report = cli::execute_validate(&options)?;
    println!("{}", cli::render_report(&report, json)?);
    Ok(!report.has_errors())
}
