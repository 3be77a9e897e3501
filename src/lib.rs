//! # rates-conformance Library
//!
//! Conformance checks for a currency-exchange-rate XML API: schema
//! conformance, root element, reported dates, and currency codes reconciled
//! against the service's own currency directory.

pub mod checks;
pub mod cli;
pub mod config;
pub mod directory;
pub mod document;
pub mod error;
pub mod http_client;
pub mod libxml2;
pub mod logging;
pub mod output;
pub mod schema;
pub mod suite;

pub use checks::{Check, CheckContext, CheckError, CheckResult};
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, ServiceConfig};
pub use directory::{
    CodePolicy, CurrencyCodeSet, DirectoryVariant, extract_codes, fetch_reference_codes,
};
pub use document::{Element, ParsedDocument};
pub use error::{ConformanceError, NetworkError, TIMEOUT_MESSAGE};
pub use http_client::{ApiResponse, AsyncHttpClient, HttpClientConfig, ParamValue, RequestOptions};
pub use libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
pub use output::Output;
pub use schema::{SchemaReport, SchemaStore};
pub use suite::{CheckOutcome, CheckStatus, ConformanceSuite, SuiteReport};
