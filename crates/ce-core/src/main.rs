//! Classifier evaluation CLI.
//!
//! Reads a JSON document of labels and predictions, evaluates every task and
//! prints the report to stdout. Logs go to stderr.

use ce_core::config::{load_config, OutputFormat, ResolvedConfig};
use ce_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use ce_core::numeric::{set_numeric_error_policy, NumericErrorScope};
use ce_core::{ClassificationResult, Error, EvaluationInput};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Evaluate binary classifier predictions against boolean labels
#[derive(Parser)]
#[command(name = "ce-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Omit timestamps from human-readable logs
    #[arg(long, global = true)]
    no_timestamps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate predictions and print the per-task report
    Evaluate(EvaluateArgs),

    /// Show the resolved configuration
    Config,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// JSON input document, or '-' for stdin
    input: PathBuf,

    /// Decision threshold for the accuracy metrics
    #[arg(long)]
    threshold: Option<f64>,

    /// Report format
    #[arg(long, short = 'f', value_enum)]
    format: Option<OutputFormat>,

    /// Do not report NaN/inf produced by degenerate tasks
    #[arg(long)]
    ignore_numeric_errors: bool,

    /// Task display names (repeat once per task); overrides names in the input
    #[arg(long = "task-name")]
    task_names: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    let log_config = LogConfig::from_env(level, cli.global.log_format)
        .with_timestamps(!cli.global.no_timestamps);
    init_logging(&log_config);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {}", err);
            if err.is_usage_error() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let resolved = load_config(cli.global.config.as_deref())?;
    match cli.command {
        Commands::Evaluate(args) => run_evaluate(args, resolved),
        Commands::Config => run_config(&resolved),
    }
}

fn run_evaluate(args: EvaluateArgs, resolved: ResolvedConfig) -> Result<(), Error> {
    let mut config = resolved.config;
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
        config.validate()?;
    }
    let format = args.format.unwrap_or(config.output);
    set_numeric_error_policy(config.numeric_errors);

    let input = EvaluationInput::load(&args.input)?;
    let labels = input.label_matrix()?;
    let predictions = input.prediction_matrix()?;
    let task_names = if args.task_names.is_empty() {
        input.task_names
    } else {
        Some(args.task_names)
    };

    let (examples, tasks) = labels.dim();
    tracing::info!(
        input = %args.input.display(),
        examples,
        tasks,
        threshold = config.threshold,
        "evaluating predictions"
    );

    let result = {
        let _scope = args.ignore_numeric_errors.then(NumericErrorScope::ignore);
        ClassificationResult::with_threshold(
            labels.view(),
            predictions.view(),
            task_names,
            config.threshold,
        )?
    };

    match format {
        OutputFormat::Text => println!("{}", result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn run_config(resolved: &ResolvedConfig) -> Result<(), Error> {
    match &resolved.path {
        Some(path) => println!("# source: {} ({})", resolved.source, path.display()),
        None => println!("# source: {}", resolved.source),
    }
    print!("{}", resolved.config.to_toml()?);
    Ok(())
}
