//! Cercalia client configuration

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Configuration shared by every Cercalia service
///
/// Immutable once built; the client keeps it behind an `Arc`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CercaliaConfig {
    /// API key appended to every request as `key` (sensitive - uses `SecretString`)
    #[serde(skip_serializing)]
    pub api_key: SecretString,

    /// Base URL of the JSON services endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the suggest (autocomplete) endpoint
    #[serde(default = "default_suggest_url")]
    pub suggest_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Spatial reference sent as the fixed `srs` parameter
    #[serde(default = "default_srs")]
    pub srs: String,

    /// Response language sent as `lang` when set (e.g. "es", "en")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

fn default_base_url() -> String {
    "https://lb.cercalia.com/services/v2/json".to_string()
}

fn default_suggest_url() -> String {
    "https://lb.cercalia.com/suggest".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_srs() -> String {
    "EPSG:4326".to_string()
}

impl fmt::Debug for CercaliaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CercaliaConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("suggest_url", &self.suggest_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("srs", &self.srs)
            .field("language", &self.language)
            .finish()
    }
}

impl CercaliaConfig {
    /// Create a configuration with default endpoints
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: default_base_url(),
            suggest_url: default_suggest_url(),
            timeout_secs: default_timeout_secs(),
            srs: default_srs(),
            language: None,
        }
    }

    /// Create a configuration pointing both endpoints at a test server
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            suggest_url: format!("{base_url}/suggest"),
            timeout_secs: 5,
            ..Self::new("test-key")
        }
    }

    /// Load configuration from an optional `cercalia.toml` and `CERCALIA_*`
    /// environment variables (e.g. `CERCALIA_API_KEY`, `CERCALIA_BASE_URL`)
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available or a value has the wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Missing keys fall back to the serde defaults above
        let builder = config::Config::builder()
            .add_source(config::File::with_name("cercalia").required(false))
            .add_source(config::Environment::with_prefix("CERCALIA").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    /// The API key in clear text, for building requests only
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err("api_key must not be empty".to_string());
        }

        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.suggest_url.is_empty() {
            return Err("suggest_url must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
