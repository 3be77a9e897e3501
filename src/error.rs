use std::path::PathBuf;

use thiserror::Error;

/// Fixed text every timeout failure starts with
pub const TIMEOUT_MESSAGE: &str = "connection time exceeds the permitted maximum";

/// Main error type for everything a conformance check can run into
#[derive(Error, Debug)]
pub enum ConformanceError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Malformed XML document: {details}")]
    MalformedDocument { details: String },

    #[error("Schema load error: {path} - {details}")]
    SchemaLoad { path: PathBuf, details: String },

    #[error("Non-numeric value in {field}: {value:?}")]
    CodeConversion { field: String, value: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },
}

impl ConformanceError {
    /// Check whether this error is a network timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConformanceError::Network(NetworkError::Timeout { .. }))
    }
}

/// Network-specific error types
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("connection time exceeds the permitted maximum: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Request failed: {url} - {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL: {url} - {details}")]
    InvalidUrl { url: String, details: String },

    #[error("Invalid header: {name} - {details}")]
    InvalidHeader { name: String, details: String },

    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {details}")]
    SchemaParseFailed { details: String },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document parsing failed: {details}")]
    DocumentParseFailed { details: String },

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Buffer too large for libxml2: {size} bytes")]
    BufferTooLarge { size: usize },

    #[error("Schema validation internal error: code {code}")]
    InternalError { code: i32 },
}

impl From<LibXml2Error> for ConformanceError {
    fn from(err: LibXml2Error) -> Self {
        match err {
            LibXml2Error::DocumentParseFailed { details } => {
                ConformanceError::MalformedDocument { details }
            }
            LibXml2Error::MissingRoot => ConformanceError::MalformedDocument {
                details: "document has no root element".to_string(),
            },
            other => ConformanceError::LibXml2Internal {
                details: other.to_string(),
            },
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ConformanceError>;

/// Network result type alias
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
