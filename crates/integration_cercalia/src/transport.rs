//! HTTP transport shared by every Cercalia service
//!
//! A service describes one call as a [`CercaliaRequest`]; the transport adds
//! the API key and fixed parameters, performs the GET, decodes the JSON body
//! and turns embedded vendor error codes into [`CercaliaError`]s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::CercaliaConfig;
use crate::error::{CercaliaError, Result};
use crate::response::{Extract, extract_str};

/// Vendor codes meaning "the query matched nothing"
pub const NO_RESULTS_CODES: &[&str] = &["30006", "30007"];

const ERROR_CODE: &[Extract] = &[
    Extract::Attr("id"),
    Extract::Text("id"),
    Extract::Attr("code"),
    Extract::Text("code"),
];

const ERROR_MESSAGE: &[Extract] = &[
    Extract::Text("value"),
    Extract::Attr("message"),
    Extract::Text("message"),
    Extract::Attr("desc"),
];

/// Ordered query parameters of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Create an empty parameter list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Append a parameter only when a value is present
    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.0.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Value of the first parameter with this key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a parameter with this key is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Remove every parameter with this key, returning the first value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let first = self.get(key).map(str::to_string);
        self.0.retain(|(k, _)| k != key);
        first
    }

    /// Parameter keys in insertion order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Iterate over `(key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameter was set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Remote endpoint a request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Main JSON services endpoint, selected by the `cmd` parameter
    Services {
        /// Value of the `cmd` parameter
        cmd: &'static str,
    },
    /// Suggest (autocomplete) endpoint, selected by path
    Suggest {
        /// Path below `suggest_url`
        path: &'static str,
    },
}

/// One logical call against the Cercalia API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CercaliaRequest {
    /// Operation name, used for logging and error context only
    pub operation: &'static str,
    /// Target endpoint
    pub endpoint: Endpoint,
    /// Service-specific parameters
    pub params: QueryParams,
}

impl CercaliaRequest {
    /// Request against the services endpoint
    #[must_use]
    pub const fn services(operation: &'static str, cmd: &'static str, params: QueryParams) -> Self {
        Self {
            operation,
            endpoint: Endpoint::Services { cmd },
            params,
        }
    }

    /// Request against the suggest endpoint
    #[must_use]
    pub const fn suggest(operation: &'static str, path: &'static str, params: QueryParams) -> Self {
        Self {
            operation,
            endpoint: Endpoint::Suggest { path },
            params,
        }
    }

    /// The `cmd` value for services requests
    #[must_use]
    pub const fn cmd(&self) -> Option<&'static str> {
        match self.endpoint {
            Endpoint::Services { cmd } => Some(cmd),
            Endpoint::Suggest { .. } => None,
        }
    }
}

/// Executes Cercalia requests
///
/// [`HttpTransport`] is the production implementation; tests inject a mock
/// returning recorded vendor responses.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CercaliaTransport: Send + Sync {
    /// Execute a request and return the decoded response tree
    ///
    /// For the services endpoint the `cercalia` envelope is removed.
    async fn execute(&self, request: &CercaliaRequest) -> Result<Value, CercaliaError>;

    /// Download a raw resource (e.g. a rendered map image)
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, CercaliaError>;
}

/// reqwest-based transport
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: Arc<CercaliaConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: Arc<CercaliaConfig>) -> Result<Self> {
        config
            .validate()
            .map_err(CercaliaError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cercalia-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CercaliaError::ConnectionFailed(e.without_url().to_string()))?;

        Ok(Self { client, config })
    }

    /// Resolve the URL and full parameter list for a request
    fn resolve(&self, request: &CercaliaRequest) -> (String, Vec<(String, String)>) {
        let mut query: Vec<(String, String)> = Vec::with_capacity(request.params.len() + 4);

        let url = match request.endpoint {
            Endpoint::Services { cmd } => {
                query.push(("cmd".to_string(), cmd.to_string()));
                query.push(("key".to_string(), self.config.api_key().to_string()));
                query.extend(request.params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
                if !request.params.contains("srs") {
                    query.push(("srs".to_string(), self.config.srs.clone()));
                }
                if let Some(lang) = &self.config.language {
                    if !request.params.contains("lang") {
                        query.push(("lang".to_string(), lang.clone()));
                    }
                }
                self.config.base_url.clone()
            },
            Endpoint::Suggest { path } => {
                query.push(("key".to_string(), self.config.api_key().to_string()));
                query.extend(request.params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
                format!("{}/{path}", self.config.suggest_url.trim_end_matches('/'))
            },
        };

        (url, query)
    }

    /// Classify a reqwest error
    ///
    /// The request URL carries the API key, so it is stripped from the message.
    fn map_http_error(&self, e: reqwest::Error) -> CercaliaError {
        if e.is_timeout() {
            return CercaliaError::Timeout {
                timeout_secs: self.config.timeout_secs,
            };
        }

        let connect = e.is_connect();
        let decode = e.is_decode();
        let message = e.without_url().to_string();
        if connect {
            CercaliaError::ConnectionFailed(message)
        } else if decode {
            CercaliaError::ParseError(message)
        } else {
            CercaliaError::RequestFailed(message)
        }
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CercaliaError::RateLimitExceeded {
                retry_after_secs: response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok()),
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CercaliaError::AuthenticationFailed(format!("HTTP {status}")));
        }

        if !status.is_success() {
            return Err(CercaliaError::RequestFailed(format!("HTTP {status}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl CercaliaTransport for HttpTransport {
    #[instrument(skip(self, request), fields(operation = request.operation))]
    async fn execute(&self, request: &CercaliaRequest) -> Result<Value, CercaliaError> {
        let (url, query) = self.resolve(request);

        debug!(
            %url,
            cmd = ?request.cmd(),
            params = ?request.params.keys(),
            "Sending Cercalia request"
        );

        let response = self.get(&url, &query).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.map_http_error(e))?;

        match request.endpoint {
            Endpoint::Services { .. } => unwrap_envelope(request.operation, body),
            Endpoint::Suggest { .. } => check_suggest_error(request.operation, body),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, CercaliaError> {
        let response = self.get(url, &[]).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_http_error(e))?;

        debug!(len = bytes.len(), "Downloaded resource");
        Ok(bytes)
    }
}

/// Strip the `cercalia` envelope and surface embedded errors
pub(crate) fn unwrap_envelope(operation: &str, body: Value) -> Result<Value> {
    let root = match body {
        Value::Object(mut map) => match map.remove("cercalia") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };

    if let Some(err) = root.get("error").and_then(|node| vendor_error(operation, node)) {
        return Err(err);
    }

    Ok(root)
}

fn check_suggest_error(operation: &str, body: Value) -> Result<Value> {
    if let Some(err) = body.get("error").and_then(|node| vendor_error(operation, node)) {
        return Err(err);
    }
    Ok(body)
}

/// Map an embedded error node to an error, `None` when the node is empty
fn vendor_error(operation: &str, node: &Value) -> Option<CercaliaError> {
    let (code, message) = match node {
        Value::Null => return None,
        Value::Object(map) if map.is_empty() => return None,
        Value::String(text) => (None, Some(text.clone())),
        _ => (extract_str(node, ERROR_CODE), extract_str(node, ERROR_MESSAGE)),
    };

    let code = code.unwrap_or_else(|| "unknown".to_string());
    if NO_RESULTS_CODES.contains(&code.as_str()) {
        return Some(CercaliaError::NoResults {
            operation: operation.to_string(),
        });
    }

    let message = message.unwrap_or_default();
    warn!(%operation, %code, %message, "Cercalia returned an error");
    Some(CercaliaError::Vendor {
        operation: operation.to_string(),
        code,
        message,
    })
}
