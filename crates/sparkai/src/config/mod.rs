//! Client configuration.
//!
//! Values come from, in increasing precedence: built-in defaults,
//! `SPARKAI_*` environment variables, an optional TOML file, and the
//! `with_*` builder methods.

mod env;
mod file;

#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;

use crate::{Result, SparkError};

pub use env::{
    API_KEY_ENV, API_SECRET_ENV, APP_ID_ENV, DOMAIN_ENV, MAX_TOKENS_ENV, TEMPERATURE_ENV,
    TOP_K_ENV, URL_ENV,
};

pub const DEFAULT_SPARK_URL: &str = "wss://spark-api.xf-yun.com/v3.1/multimodal";
pub const DEFAULT_TEMPERATURE: f64 = 0.8;
pub const DEFAULT_TOP_K: u32 = 6;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_AUDITING: &str = "default";
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SparkConfig {
    pub url: String,
    pub app_id: String,
    pub api_key: String,
    pub api_secret: String,
    pub domain: String,
    pub temperature: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub auditing: String,
    pub handshake_timeout: Duration,
}

impl fmt::Debug for SparkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparkConfig")
            .field("url", &self.url)
            .field("app_id", &self.app_id)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("max_tokens", &self.max_tokens)
            .field("auditing", &self.auditing)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SPARK_URL.to_string(),
            app_id: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            domain: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
            auditing: DEFAULT_AUDITING.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl SparkConfig {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_auditing(mut self, auditing: impl Into<String>) -> Self {
        self.auditing = auditing.into();
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Check that everything needed to open a session is present.
    ///
    /// Fields are checked in a fixed order (URL, app id, API secret, API
    /// key, domain) and the first missing one is reported.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.url, "endpoint URL", URL_ENV),
            (&self.app_id, "app id", APP_ID_ENV),
            (&self.api_secret, "API secret", API_SECRET_ENV),
            (&self.api_key, "API key", API_KEY_ENV),
            (&self.domain, "domain", DOMAIN_ENV),
        ];
        for (value, what, var) in required {
            if value.trim().is_empty() {
                return Err(SparkError::Config(format!(
                    "missing the Spark {what}, set it in the {var} environment variable"
                )));
            }
        }
        Ok(())
    }
}
