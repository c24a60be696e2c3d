//! NREGS Analyst - district performance reports for rural employment data
//!
//! A CLI tool that ranks districts and blocks from the NREGS dashboard API
//! and asks an LLM to write a narrative report for one district.
//!
//! Pipeline failures are printed as `Error: <message>` and the process
//! still exits with code 0. Invalid arguments exit with code 1.

mod analysis;
mod cli;
mod config;
mod domain;
mod error;
mod models;
mod narrative;
mod pipeline;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use narrative::AnthropicClient;
use pipeline::{Pipeline, RunOutcome};
use report::ArtifactStore;
use source::HttpDataSource;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Credentials may live in a local .env file
    let dotenv = dotenvy::dotenv();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {:#}", e);
            return Ok(());
        }
    };

    // Keep the guard alive so buffered log lines reach the file on exit
    let _log_guard = init_logging(&args, &config);

    info!("NREGS Analyst v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    if let Err(e) = run_report(&args, &config).await {
        println!("Error: {}", e);
    }
    Ok(())
}

/// Handle --init-config: generate a default .nregs-analyst.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("Edit it to change the dashboard URL, model, or output directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to the console and, for report runs, are appended to the report
/// type's log file under `log_dir`.
fn init_logging(args: &Args, config: &Config) -> Option<WorkerGuard> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (writer, guard) = match args
        .command
        .as_ref()
        .and_then(|command| log_writer(&config.general.log_dir, command.kind().domain()))
    {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };
    let file = writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
    });

    let result = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(console)
        .with(file)
        .try_init();
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    guard
}

/// Non-blocking writer appending to `<log_dir>/nregs_<tag>.log`.
fn log_writer(log_dir: &Path, domain: &domain::Domain) -> Option<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(domain.log_file_name())
        .build(log_dir);

    match appender {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("Could not open log file in {}: {}", log_dir.display(), e);
            None
        }
    }
}

/// Run one report end to end and print its result.
async fn run_report(args: &Args, config: &Config) -> Result<()> {
    let Some(command) = &args.command else {
        return Ok(());
    };
    let report_args = command.report_args();
    let kind = command.kind();
    let domain = kind.domain();
    let date = report_args
        .date
        .unwrap_or_else(|| Local::now().date_naive());

    info!("Running {} report for {} on {}", kind, report_args.district, date);

    let source = HttpDataSource::new(&config.source)?;
    let generator = AnthropicClient::from_env(&config.model)?;
    let artifacts = ArtifactStore::new(&config.general.output_dir);

    let pipeline =
        Pipeline::new(domain, &source, &generator, artifacts).with_progress(!args.quiet);
    let outcome = pipeline
        .run(date, Some(report_args.district.as_str()), report_args.output)
        .await
        .map_err(|e| {
            if e.is_no_data() {
                warn!(
                    "No {} data available for {} on {}",
                    domain.label, report_args.district, date
                );
            }
            e
        })?;

    match outcome {
        RunOutcome::EntityRequired { .. } => {
            println!("Error: District name is required for analysis");
        }
        RunOutcome::Completed(result) => match report_args.output {
            OutputFormat::Text => println!("{}", result.analysis),
            OutputFormat::Json => println!("{}", report::artifacts::to_json(&result)?),
        },
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref config_path) => Config::load(config_path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    Ok(config)
}
