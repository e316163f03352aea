//! TOML config file loading.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::SparkConfig;
use crate::{Result, SparkError};

/// On-disk shape. Every key is optional; absent keys leave the current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    url: Option<String>,
    app_id: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    domain: Option<String>,
    temperature: Option<f64>,
    top_k: Option<u32>,
    max_tokens: Option<u32>,
    auditing: Option<String>,
    handshake_timeout_secs: Option<u64>,
}

impl SparkConfig {
    /// Environment config overlaid with the TOML file at `path`.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        Self::from_env()?.merge_file(path)
    }

    /// Overlay the TOML file at `path` onto this config.
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SparkError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        self.merge_toml(&text)
    }

    /// Overlay TOML `text` onto this config.
    pub fn merge_toml(mut self, text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| SparkError::Config(format!("config parse error: {e}")))?;

        if let Some(url) = file.url {
            self.url = url;
        }
        if let Some(app_id) = file.app_id {
            self.app_id = app_id;
        }
        if let Some(api_key) = file.api_key {
            self.api_key = api_key;
        }
        if let Some(api_secret) = file.api_secret {
            self.api_secret = api_secret;
        }
        if let Some(domain) = file.domain {
            self.domain = domain;
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if let Some(top_k) = file.top_k {
            self.top_k = top_k;
        }
        if let Some(max_tokens) = file.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(auditing) = file.auditing {
            self.auditing = auditing;
        }
        if let Some(secs) = file.handshake_timeout_secs {
            self.handshake_timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }
}
