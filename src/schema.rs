//! XSD validation of response bodies
//!
//! The schema is a local file. [`SchemaStore`] compiles it with libxml2 and,
//! when caching is on, keeps the compiled schema in a moka cache for the rest
//! of the session. With caching off every call reloads and recompiles it.

use std::path::PathBuf;
use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::error::{ConformanceError, Result};
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl SchemaReport {
    /// Error log joined for use in a failure message
    pub fn error_log(&self) -> String {
        self.errors.join("; ")
    }
}

impl From<ValidationResult> for SchemaReport {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => SchemaReport {
                valid: true,
                errors: Vec::new(),
            },
            ValidationResult::Invalid { error_count, errors } => SchemaReport {
                valid: false,
                errors: if errors.is_empty() {
                    vec![format!("{} validation error(s)", error_count)]
                } else {
                    errors
                },
            },
            ValidationResult::InternalError { code } => SchemaReport {
                valid: false,
                errors: vec![format!("libxml2 internal error {}", code)],
            },
        }
    }
}

/// Loads, compiles and applies the XSD at a fixed path
#[derive(Clone)]
pub struct SchemaStore {
    path: PathBuf,
    cache: Option<Cache<PathBuf, XmlSchemaPtr>>,
    libxml2: Arc<LibXml2Wrapper>,
}

impl SchemaStore {
    pub fn new(path: impl Into<PathBuf>, cache_compiled: bool) -> Self {
        Self {
            path: path.into(),
            cache: cache_compiled.then(|| Cache::builder().max_capacity(8).build()),
            libxml2: Arc::new(LibXml2Wrapper::new()),
        }
    }

    /// Validate raw document bytes against the schema
    ///
    /// # Errors
    ///
    /// `SchemaLoad` when the XSD cannot be read or compiled, `MalformedDocument`
    /// when the bytes are not well-formed XML.
    pub async fn validate(&self, document: &[u8]) -> Result<SchemaReport> {
        let schema = self.compiled().await?;
        let result = self.libxml2.validate_memory(&schema, document)?;
        Ok(result.into())
    }

    async fn compiled(&self) -> Result<XmlSchemaPtr> {
        match &self.cache {
            Some(cache) => cache
                .try_get_with(self.path.clone(), self.load())
                .await
                .map_err(|e: Arc<ConformanceError>| match e.as_ref() {
                    ConformanceError::SchemaLoad { details, .. } => {
                        self.load_error(details.clone())
                    }
                    other => self.load_error(other.to_string()),
                }),
            None => self.load().await,
        }
    }

    async fn load(&self) -> Result<XmlSchemaPtr> {
        debug!(path = %self.path.display(), "compiling schema");
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.load_error(e.to_string()))?;
        self.libxml2
            .parse_schema_from_memory(&data)
            .map_err(|e| self.load_error(e.to_string()))
    }

    fn load_error(&self, details: String) -> ConformanceError {
        ConformanceError::SchemaLoad {
            path: self.path.clone(),
            details,
        }
    }
}
