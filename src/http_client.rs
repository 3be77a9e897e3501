use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{NetworkError, NetworkResult};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is appended to
    pub entrypoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification (the rate service's chain is not trusted by default)
    pub accept_invalid_certs: bool,
    /// User agent string
    pub user_agent: String,
}

impl HttpClientConfig {
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self {
            entrypoint: entrypoint.into(),
            timeout_seconds: 10,
            accept_invalid_certs: true,
            user_agent: format!("rates-conformance/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A query parameter value, either one string or a sequence serialized as repeated keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

/// Optional headers and query parameters for a GET request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, ParamValue)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Flatten parameters into `(key, value)` pairs, repeating keys for sequences
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            match value {
                ParamValue::Single(v) => pairs.push((key.as_str(), v.as_str())),
                ParamValue::Multiple(values) => {
                    pairs.extend(values.iter().map(|v| (key.as_str(), v.as_str())))
                }
            }
        }
        pairs
    }

    fn header_map(&self) -> NetworkResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| NetworkError::InvalidHeader {
                    name: name.clone(),
                    details: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| NetworkError::InvalidHeader {
                    name: name.clone(),
                    details: e.to_string(),
                })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }
}

/// What came back from a single GET
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Async HTTP client bound to one entrypoint
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> NetworkResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(NetworkError::Client)?;

        Ok(Self { client, config })
    }

    /// Full URL for a path relative to the entrypoint
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.entrypoint, path)
    }

    /// Issue exactly one GET to `entrypoint + path`
    ///
    /// No retries. A connect or read timeout comes back as
    /// [`NetworkError::Timeout`]; other statuses are returned to the caller.
    pub async fn get(&self, path: &str, options: &RequestOptions) -> NetworkResult<ApiResponse> {
        let url = self.url_for(path);
        let parsed = reqwest::Url::parse(&url).map_err(|e| NetworkError::InvalidUrl {
            url: url.clone(),
            details: e.to_string(),
        })?;

        let request = self
            .client
            .get(parsed)
            .headers(options.header_map()?)
            .query(&options.query_pairs());

        debug!(url = %url, params = ?options.params, "GET");

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let final_url = response.url().to_string();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(ApiResponse {
                url: final_url,
                status,
                headers,
                body: body.to_vec(),
            })
        };

        let response = timeout(Duration::from_secs(self.config.timeout_seconds), exchange)
            .await
            .map_err(|_| self.timeout_error(&url))?
            .map_err(|e| self.classify(&url, e))?;

        if !response.status.is_success() {
            warn!(url = %response.url, status = %response.status, "non-success status");
        }
        debug!(url = %response.url, status = %response.status, bytes = response.body.len(), "response");

        Ok(response)
    }

    fn timeout_error(&self, url: &str) -> NetworkError {
        NetworkError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        }
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> NetworkError {
        if error.is_timeout() {
            self.timeout_error(url)
        } else {
            NetworkError::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}
