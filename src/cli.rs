use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::directory::CodePolicy;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show passing checks and timings too
    Verbose,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// Machine-readable JSON
    Json,
}

/// Conformance checks for the exchange-rate XML API
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rates-conformance")]
#[command(about = "Run conformance checks against a currency-exchange-rate XML service")]
#[command(version)]
pub struct Cli {
    /// Base URL of the service under test
    #[arg(long = "entrypoint")]
    pub entrypoint: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// XSD the daily rates response must conform to
    #[arg(long = "schema")]
    pub schema: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Verify TLS certificates of the service
    #[arg(long = "verify-certs")]
    pub verify_certs: bool,

    /// Only run checks whose name contains this text (repeatable)
    #[arg(long = "check", action = clap::ArgAction::Append)]
    pub checks: Vec<String>,

    /// Historical date to request, dd/mm/yyyy (repeatable, replaces the configured set)
    #[arg(long = "date", action = clap::ArgAction::Append)]
    pub dates: Vec<String>,

    /// Handling of non-numeric directory codes: reject or skip
    #[arg(long = "code-policy")]
    pub code_policy: Option<CodePolicy>,

    /// UTC offset in hours used to compute today's date
    #[arg(long = "utc-offset", allow_negative_numbers = true)]
    pub utc_offset: Option<i32>,

    /// Report format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// List the checks that would run and exit
    #[arg(long = "list")]
    pub list: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (failures only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
