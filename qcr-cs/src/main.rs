//! qcr-cs (Consolidate Solutions) - command-line front end
//!
//! Reads minimization results exported by the QCA engine as JSON, merges
//! them into one report and prints it. `--save` additionally writes the
//! report to a CSV, TSV, JSON or Excel file.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qcr_common::config::TomlConfig;
use qcr_cs::render::render_table;
use qcr_cs::{consolidate, ConsolidateOptions, SolutionInputs};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Level used until the config file has been read
const BOOTSTRAP_LEVEL: &str = "info";

/// Output format for stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON array of row objects
    Json,
    /// No stdout output
    Silent,
}

/// Command-line arguments for qcr-cs
#[derive(Parser, Debug)]
#[command(name = "qcr-cs")]
#[command(about = "Consolidate QCA minimization results into one table")]
#[command(version)]
struct Args {
    /// Conservative solution (JSON)
    #[arg(short = 'c', long = "conservative", value_name = "FILE")]
    conservative: Option<PathBuf>,

    /// Intermediate solutions keyed by CnPn label (JSON)
    #[arg(short = 'i', long = "intermediate", value_name = "FILE")]
    intermediate: Option<PathBuf>,

    /// Parsimonious solution (JSON)
    #[arg(short = 'p', long = "parsimonious", value_name = "FILE")]
    parsimonious: Option<PathBuf>,

    /// CnPn labels of the intermediate solutions to include
    #[arg(long, value_name = "LABEL", value_delimiter = ',')]
    icp: Vec<String>,

    /// Keep only prime implicants with at least this consistency
    #[arg(long = "incl-cut", value_name = "F", allow_negative_numbers = true)]
    incl_cut: Option<f64>,

    /// Round numeric columns to N decimal places
    #[arg(long, value_name = "N")]
    round: Option<u32>,

    /// Export the table (.csv, .tsv, .json or .xlsx)
    #[arg(short, long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Suppress progress notices
    #[arg(short, long)]
    quiet: bool,

    /// Config file
    #[arg(long, value_name = "FILE", env = "QCR_CONFIG")]
    config: Option<PathBuf>,

    /// What to print on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_optional(path: Option<&Path>) -> Result<Option<serde_json::Value>> {
    path.map(read_json).transpose()
}

/// Merge command-line flags over config defaults
fn build_options(args: &Args, config: &TomlConfig) -> ConsolidateOptions {
    let defaults = &config.defaults;
    let save = args.save.as_ref().map(|path| match &defaults.output_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.clone(),
    });

    ConsolidateOptions {
        icp: (!args.icp.is_empty()).then(|| args.icp.clone()),
        verbose: defaults.verbose && !args.quiet,
        save,
        round: args.round.or(defaults.round),
        incl_cut: args.incl_cut.or(defaults.incl_cut),
    }
}

/// Swaps the log filter once the config file is known
struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevel {
    /// Apply the configured level unless `RUST_LOG` already chose one
    fn apply(&self, config: &TomlConfig) -> Result<()> {
        if self.from_env {
            return Ok(());
        }
        let level = config.logging.level.to_ascii_lowercase();
        self.handle
            .reload(EnvFilter::new(&level))
            .with_context(|| format!("Failed to set log level '{}'", level))
    }
}

/// Install the stderr subscriber, so stdout carries only the table
fn init_logging() -> LogLevel {
    let env_filter = EnvFilter::try_from_default_env();
    let from_env = env_filter.is_ok();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LEVEL)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    LogLevel { handle, from_env }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = init_logging();

    info!(
        "Starting QCR consolidate solutions (qcr-cs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match run(&args, &log_level) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, log_level: &LogLevel) -> Result<()> {
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;
    log_level.apply(&config)?;

    let inputs = SolutionInputs::from_json(
        read_optional(args.conservative.as_deref())?,
        read_optional(args.intermediate.as_deref())?,
        read_optional(args.parsimonious.as_deref())?,
    )
    .context("Invalid solution input")?;

    if inputs.is_empty() {
        info!("No solutions given, the table will be empty");
    }

    let options = build_options(args, &config);
    let table = consolidate(&inputs, &options).context("Consolidation failed")?;

    match args.format {
        OutputFormat::Table => print!("{}", render_table(&table)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Silent => {}
    }

    Ok(())
}
