//! Environment variable fallbacks.

use std::str::FromStr;

use super::SparkConfig;
use crate::{Result, SparkError};

pub const URL_ENV: &str = "SPARKAI_URL";
pub const APP_ID_ENV: &str = "SPARKAI_APP_ID";
pub const API_KEY_ENV: &str = "SPARKAI_API_KEY";
pub const API_SECRET_ENV: &str = "SPARKAI_API_SECRET";
pub const DOMAIN_ENV: &str = "SPARKAI_DOMAIN";
pub const TEMPERATURE_ENV: &str = "SPARKAI_TEMPERATURE";
pub const TOP_K_ENV: &str = "SPARKAI_TOP_K";
pub const MAX_TOKENS_ENV: &str = "SPARKAI_MAX_TOKENS";

impl SparkConfig {
    /// Create config from the `SPARKAI_*` environment variables.
    ///
    /// Unset variables keep their defaults; the result is not validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SparkConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(URL_ENV) {
            config.url = url;
        }
        if let Some(app_id) = get(APP_ID_ENV) {
            config.app_id = app_id;
        }
        if let Some(api_key) = get(API_KEY_ENV) {
            config.api_key = api_key;
        }
        if let Some(api_secret) = get(API_SECRET_ENV) {
            config.api_secret = api_secret;
        }
        if let Some(domain) = get(DOMAIN_ENV) {
            config.domain = domain;
        }
        if let Some(raw) = get(TEMPERATURE_ENV) {
            config.temperature = parse_var(TEMPERATURE_ENV, &raw)?;
        }
        if let Some(raw) = get(TOP_K_ENV) {
            config.top_k = parse_var(TOP_K_ENV, &raw)?;
        }
        if let Some(raw) = get(MAX_TOKENS_ENV) {
            config.max_tokens = parse_var(MAX_TOKENS_ENV, &raw)?;
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SparkError::Config(format!("{name}={raw:?} is not valid: {e}")))
}
