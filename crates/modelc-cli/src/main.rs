//! modelc command-line interface.
//!
//! Loads a model document, runs the unified passes (and the relational
//! plugin for `build`), and prints enhancer results, validation failures and
//! derived schemas. Exits with status 1 when an error-category failure was
//! reported or the run aborted.

mod commands;
mod config;
mod formatter;

use clap::{Parser, Subcommand};
use config::ModelcConfig;
use formatter::OutputFormat;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// modelc domain-model compiler
#[derive(Parser, Debug)]
#[command(name = "modelc")]
#[command(version, about = "Domain-model compiler")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the unified passes and the relational plugin, then print the
    /// derived schemas
    Build {
        /// Model document (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Configuration file (defaults to ./modelc.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Only print the schema of this namespace
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Run the unified passes and validators only
    Validate {
        /// Model document (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Configuration file (defaults to ./modelc.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

impl Command {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Build { config, .. } | Command::Validate { config, .. } => config.as_ref(),
        }
    }
}

fn init_logging(config: &ModelcConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(command: &Command) -> anyhow::Result<ModelcConfig> {
    let dir = std::env::current_dir()?;
    Ok(ModelcConfig::load(command.config_path().map(PathBuf::as_path), &dir)?)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args.command) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    init_logging(&config);

    match run(args.command, &config) {
        Ok(true) => std::process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Run a command and print its report. Returns whether errors were reported.
fn run(command: Command, config: &ModelcConfig) -> anyhow::Result<bool> {
    let (report, format) = match command {
        Command::Build {
            model,
            format,
            namespace,
            ..
        } => (commands::build(&model, config, namespace.as_deref())?, format),
        Command::Validate { model, format, .. } => (commands::validate(&model)?, format),
    };

    let formatter = formatter::create_formatter(format);
    println!("{}", formatter.format_report(&report));

    let errors = report.validation_failures.iter().filter(|f| f.is_error()).count();
    info!(
        failures = report.validation_failures.len(),
        errors,
        "Finished"
    );
    Ok(report.has_errors())
}
