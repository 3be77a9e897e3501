use chrono::{FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::checks::REQUEST_DATE_FORMAT;
use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::directory::CodePolicy;

/// Prefix of every environment variable the suite reads
pub const ENV_PREFIX: &str = "RATES_CONFORMANCE_";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub network: NetworkConfig,
    pub checks: ChecksConfig,
    pub output: OutputConfig,
}

/// The service under test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL every path is appended to
    pub entrypoint: String,
    /// Daily rates method
    pub daily_path: String,
    /// Currency directory method
    pub directory_path: String,
    /// XSD the daily rates response must conform to
    pub schema_path: PathBuf,
    /// Expected root element of the daily rates response
    pub root_tag: String,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

/// Check configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChecksConfig {
    /// Dates (dd/mm/yyyy) the requested-date check runs for
    pub historical_dates: Vec<String>,
    /// Handling of non-numeric directory codes
    pub code_policy: CodePolicy,
    /// Fixed UTC offset for "today"; local time when unset
    pub utc_offset_hours: Option<i32>,
    /// Keep the compiled schema for the whole session
    pub cache_schema: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            entrypoint: String::new(),
            daily_path: "/XML_daily.asp".to_string(),
            directory_path: "/XML_valFull.asp".to_string(),
            schema_path: PathBuf::from("schemas").join("ValCurs.xsd"),
            root_tag: "ValCurs".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            accept_invalid_certs: true,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            historical_dates: vec![
                "02/03/2002".to_string(),
                "31/12/2010".to_string(),
                "15/01/2022".to_string(),
            ],
            code_policy: CodePolicy::Reject,
            utc_offset_hours: None,
            cache_schema: true,
        }
    }
}

impl ChecksConfig {
    /// Today's date in the configured zone
    pub fn today(&self) -> NaiveDate {
        match self
            .utc_offset_hours
            .and_then(|hours| FixedOffset::east_opt(hours * 3600))
        {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    /// Same as [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = if let Some(config_path) = &cli.config {
            Self::load_from_file(config_path).await?
        } else {
            Self::find_config_file().await?.unwrap_or_default()
        };

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "rates-conformance.toml",
            "rates-conformance.json",
            ".rates-conformance.toml",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("rates-conformance");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        let var = |name: &str| env.get(&format!("{}{}", ENV_PREFIX, name));
        let invalid = |name: &str, value: &str| {
            ConfigError::Environment(format!("Invalid {}{} value: {}", ENV_PREFIX, name, value))
        };

        if let Some(entrypoint) = var("ENTRYPOINT") {
            config.service.entrypoint = entrypoint;
        }

        if let Some(schema) = var("SCHEMA") {
            config.service.schema_path = PathBuf::from(schema);
        }

        if let Some(timeout) = var("TIMEOUT") {
            config.network.timeout_seconds =
                timeout.parse().map_err(|_| invalid("TIMEOUT", &timeout))?;
        }

        if let Some(policy) = var("CODE_POLICY") {
            config.checks.code_policy = policy.parse().map_err(|_| invalid("CODE_POLICY", &policy))?;
        }

        if let Some(dates) = var("DATES") {
            config.checks.historical_dates = dates
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(offset) = var("UTC_OFFSET") {
            config.checks.utc_offset_hours =
                Some(offset.parse().map_err(|_| invalid("UTC_OFFSET", &offset))?);
        }

        if let Some(format) = var("FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => return Err(invalid("FORMAT", &format)),
            };
        }

        if let Some(verbose) = var("VERBOSE") {
            config.output.verbose = verbose.parse().map_err(|_| invalid("VERBOSE", &verbose))?;
        }

        if let Some(quiet) = var("QUIET") {
            config.output.quiet = quiet.parse().map_err(|_| invalid("QUIET", &quiet))?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(entrypoint) = &cli.entrypoint {
            config.service.entrypoint = entrypoint.clone();
        }
        if let Some(schema) = &cli.schema {
            config.service.schema_path = schema.clone();
        }

        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }
        if cli.verify_certs {
            config.network.accept_invalid_certs = false;
        }

        if !cli.dates.is_empty() {
            config.checks.historical_dates = cli.dates.clone();
        }
        if let Some(policy) = cli.code_policy {
            config.checks.code_policy = policy;
        }
        if cli.utc_offset.is_some() {
            config.checks.utc_offset_hours = cli.utc_offset;
        }

        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
        }
        if cli.quiet {
            config.output.quiet = true;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        let entrypoint = config.service.entrypoint.trim();
        if entrypoint.is_empty() {
            return Err(ConfigError::Validation(
                "An entrypoint must be specified".to_string(),
            ));
        }
        if let Err(e) = reqwest::Url::parse(entrypoint) {
            return Err(ConfigError::Validation(format!(
                "Invalid entrypoint {}: {}",
                entrypoint, e
            )));
        }

        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        for date in &config.checks.historical_dates {
            if NaiveDate::parse_from_str(date, REQUEST_DATE_FORMAT).is_err()
                || date.len() != "dd/mm/yyyy".len()
            {
                return Err(ConfigError::Validation(format!(
                    "Invalid historical date {}: expected dd/mm/yyyy",
                    date
                )));
            }
        }

        if let Some(hours) = config.checks.utc_offset_hours
            && !(-14..=14).contains(&hours)
        {
            return Err(ConfigError::Validation(format!(
                "UTC offset {} is outside -14..=14 hours",
                hours
            )));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}
