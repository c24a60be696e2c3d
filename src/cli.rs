//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::DomainKind;

/// NREGS Analyst - district performance reports for rural employment data
///
/// Fetches state and district figures from the NREGS dashboard, ranks
/// districts and blocks, and asks an LLM to write up the result.
///
/// Examples:
///   nregs-analyst inspection --district Indore
///   nregs-analyst work-management --district Sehore --date 2025-03-31
///   nregs-analyst zero-muster --district Dhar --output json
///   nregs-analyst --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Report to produce
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nregs-analyst.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress spinner)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory for reports and model artifacts
    #[arg(long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Dashboard API base URL
    #[arg(long, value_name = "URL", env = "NREGS_SOURCE_URL", global = true)]
    pub source_url: Option<String>,

    /// Model used for the narrative
    #[arg(short, long, env = "NREGS_MODEL", global = true)]
    pub model: Option<String>,

    /// Generate a default .nregs-analyst.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// One subcommand per report type.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Area officer inspection visits
    Inspection(ReportArgs),
    /// Work completion rates
    WorkManagement(ReportArgs),
    /// Zero-attendance muster rolls
    ZeroMuster(ReportArgs),
}

impl Command {
    pub fn kind(&self) -> DomainKind {
        match self {
            Command::Inspection(_) => DomainKind::Inspection,
            Command::WorkManagement(_) => DomainKind::WorkManagement,
            Command::ZeroMuster(_) => DomainKind::ZeroMuster,
        }
    }

    pub fn report_args(&self) -> &ReportArgs {
        match self {
            Command::Inspection(a) | Command::WorkManagement(a) | Command::ZeroMuster(a) => a,
        }
    }
}

/// Arguments shared by every report subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// District to analyze
    #[arg(long, value_name = "NAME")]
    pub district: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub output: OutputFormat,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain narrative text (default)
    #[default]
    Text,
    /// JSON envelope with aggregates and narrative
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(command) = &self.command else {
            return Err(
                "A report type is required: inspection, work-management or zero-muster"
                    .to_string(),
            );
        };

        if command.report_args().district.trim().is_empty() {
            return Err("District name must not be empty".to_string());
        }

        if let Some(ref url) = self.source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["nregs-analyst"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_command_tree_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_report_subcommand() {
        let args = parse(&[
            "work-management",
            "--district",
            "Sehore",
            "--date",
            "2025-03-31",
            "--output",
            "json",
        ]);

        let command = args.command.as_ref().unwrap();
        assert_eq!(command.kind(), DomainKind::WorkManagement);
        let report = command.report_args();
        assert_eq!(report.district, "Sehore");
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(report.output, OutputFormat::Json);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["zero-muster", "--district", "Dhar"]);
        let report = args.command.as_ref().unwrap().report_args();
        assert!(report.date.is_none());
        assert_eq!(report.output, OutputFormat::Text);
    }

    #[test]
    fn test_district_is_required() {
        assert!(Args::try_parse_from(["nregs-analyst", "inspection"]).is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Args::try_parse_from([
            "nregs-analyst",
            "inspection",
            "--district",
            "Indore",
            "--date",
            "31-03-2025"
        ])
        .is_err());
    }

    #[test]
    fn test_validation_requires_command() {
        let args = parse(&[]);
        assert!(args.validate().is_err());

        let args = parse(&["--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = parse(&["inspection", "--district", "Indore"]);
        args.source_url = Some("ftp://example.org".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["inspection", "--district", "Indore"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["inspection", "--district", "Indore"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
