//! Sequential runner for the conformance checks
//!
//! Checks run one after another against a single entrypoint. Each outcome is
//! all-or-nothing: the first failed assertion ends its check.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checks::{Check, CheckContext, CheckError};
use crate::config::Config;
use crate::error::{Result, TIMEOUT_MESSAGE};
use crate::http_client::{AsyncHttpClient, HttpClientConfig};
use crate::schema::SchemaStore;

/// Status of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    /// An assertion did not hold or the service timed out
    Failed { message: String },
    /// The check could not be carried out
    Errored { message: String },
}

impl CheckStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckStatus::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckStatus::Failed { .. })
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, CheckStatus::Errored { .. })
    }
}

impl From<std::result::Result<(), CheckError>> for CheckStatus {
    fn from(result: std::result::Result<(), CheckError>) -> Self {
        match result {
            Ok(()) => CheckStatus::Passed,
            Err(CheckError::Assertion(message)) => CheckStatus::Failed { message },
            Err(CheckError::Timeout(error)) => {
                debug!(error = %error, "timeout");
                CheckStatus::Failed {
                    message: TIMEOUT_MESSAGE.to_string(),
                }
            }
            Err(CheckError::Fault(error)) => CheckStatus::Errored {
                message: error.to_string(),
            },
        }
    }
}

/// Result of running one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: CheckStatus,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// All outcomes of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub entrypoint: String,
    pub outcomes: Vec<CheckOutcome>,
    #[serde(with = "duration_millis")]
    pub total_duration: Duration,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }

    pub fn errored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_errored()).count()
    }

    /// True when every check that ran passed
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_passed())
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> u8 {
        if self.success() { 0 } else { 1 }
    }
}

/// Runs checks against one service
pub struct ConformanceSuite {
    config: Config,
    client: AsyncHttpClient,
    schemas: SchemaStore,
    today: Option<NaiveDate>,
}

impl ConformanceSuite {
    pub fn new(config: &Config) -> Result<Self> {
        let mut http_config = HttpClientConfig::new(config.service.entrypoint.trim());
        http_config.timeout_seconds = config.network.timeout_seconds;
        http_config.accept_invalid_certs = config.network.accept_invalid_certs;

        Ok(Self {
            client: AsyncHttpClient::new(http_config)?,
            schemas: SchemaStore::new(
                config.service.schema_path.clone(),
                config.checks.cache_schema,
            ),
            today: None,
            config: config.clone(),
        })
    }

    /// Pin the date the current-date check expects
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn catalogue(&self) -> Vec<Check> {
        Check::catalogue(&self.config.checks.historical_dates)
    }

    /// Checks matching any filter; every check when no filter is given
    pub fn select(&self, filters: &[String]) -> Vec<Check> {
        self.catalogue()
            .into_iter()
            .filter(|check| {
                filters.is_empty() || filters.iter().any(|f| check.name().contains(f.as_str()))
            })
            .collect()
    }

    fn context(&self) -> CheckContext<'_> {
        CheckContext {
            client: &self.client,
            schemas: &self.schemas,
            service: &self.config.service,
            code_policy: self.config.checks.code_policy,
            today: self.today.unwrap_or_else(|| self.config.checks.today()),
        }
    }

    pub async fn run_check(&self, check: &Check) -> CheckOutcome {
        let name = check.name();
        debug!(check = %name, "running");
        let start = Instant::now();
        let status = CheckStatus::from(check.run(&self.context()).await);
        let duration = start.elapsed();
        info!(check = %name, passed = status.is_passed(), ?duration, "finished");

        CheckOutcome {
            name,
            status,
            duration,
        }
    }

    /// Run the selected checks in catalogue order
    pub async fn run(&self, filters: &[String]) -> SuiteReport {
        let start = Instant::now();
        let mut outcomes = Vec::new();
        for check in self.select(filters) {
            outcomes.push(self.run_check(&check).await);
        }

        SuiteReport {
            entrypoint: self.config.service.entrypoint.clone(),
            outcomes,
            total_duration: start.elapsed(),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
