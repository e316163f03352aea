//! Tests for config defaults, environment lookup, TOML overlay and validation.

use std::collections::HashMap;
use std::time::Duration;

use super::*;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

fn complete() -> SparkConfig {
    SparkConfig::new("app", "key", "secret").with_domain("generalv3.5")
}

#[test]
fn defaults() {
    let config = SparkConfig::default();
    assert_eq!(config.url, DEFAULT_SPARK_URL);
    assert_eq!(config.temperature, 0.8);
    assert_eq!(config.top_k, 6);
    assert_eq!(config.max_tokens, 2048);
    assert_eq!(config.auditing, "default");
    assert_eq!(config.handshake_timeout, Duration::from_secs(5));
}

#[test]
fn lookup_reads_every_variable() {
    let config = SparkConfig::from_lookup(lookup_from(&[
        (URL_ENV, "wss://spark-api.xf-yun.com/v3.5/chat"),
        (APP_ID_ENV, "app"),
        (API_KEY_ENV, "key"),
        (API_SECRET_ENV, "secret"),
        (DOMAIN_ENV, "generalv3.5"),
        (TEMPERATURE_ENV, "0.5"),
        (TOP_K_ENV, "4"),
        (MAX_TOKENS_ENV, "1024"),
    ]))
    .unwrap();

    assert_eq!(config.url, "wss://spark-api.xf-yun.com/v3.5/chat");
    assert_eq!(config.app_id, "app");
    assert_eq!(config.api_key, "key");
    assert_eq!(config.api_secret, "secret");
    assert_eq!(config.domain, "generalv3.5");
    assert_eq!(config.temperature, 0.5);
    assert_eq!(config.top_k, 4);
    assert_eq!(config.max_tokens, 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_variables_keep_defaults() {
    let config = SparkConfig::from_lookup(lookup_from(&[(URL_ENV, ""), (TOP_K_ENV, "  ")])).unwrap();
    assert_eq!(config.url, DEFAULT_SPARK_URL);
    assert_eq!(config.top_k, DEFAULT_TOP_K);
}

#[test]
fn unparseable_number_is_config_error() {
    let err = SparkConfig::from_lookup(lookup_from(&[(TEMPERATURE_ENV, "warm")])).unwrap_err();
    assert!(matches!(err, SparkError::Config(_)));
    assert!(err.to_string().contains(TEMPERATURE_ENV));
}

#[test]
fn validate_reports_first_missing_field() {
    let err = SparkConfig::default().validate().unwrap_err();
    assert!(err.to_string().contains(APP_ID_ENV), "{err}");

    let err = SparkConfig::new("app", "", "").validate().unwrap_err();
    assert!(err.to_string().contains(API_SECRET_ENV), "{err}");

    let err = SparkConfig::new("app", "", "secret").validate().unwrap_err();
    assert!(err.to_string().contains(API_KEY_ENV), "{err}");

    let err = SparkConfig::new("app", "key", "secret").validate().unwrap_err();
    assert!(err.to_string().contains(DOMAIN_ENV), "{err}");

    let err = complete().with_url("").validate().unwrap_err();
    assert!(err.to_string().contains(URL_ENV), "{err}");

    assert!(complete().validate().is_ok());
}

#[test]
fn debug_redacts_secrets() {
    let config = SparkConfig::new("app", "super-key", "super-secret");
    let debug = format!("{config:?}");
    assert!(debug.contains("app"));
    assert!(!debug.contains("super-key"));
    assert!(!debug.contains("super-secret"));
}

#[test]
fn toml_overlays_only_present_keys() {
    let config = complete()
        .merge_toml(
            r#"
domain = "4.0Ultra"
temperature = 0.0
handshake_timeout_secs = 10
"#,
        )
        .unwrap();

    assert_eq!(config.domain, "4.0Ultra");
    assert_eq!(config.temperature, 0.0);
    assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    // Untouched
    assert_eq!(config.app_id, "app");
    assert_eq!(config.top_k, DEFAULT_TOP_K);
}

#[test]
fn toml_unknown_key_is_config_error() {
    let err = complete().merge_toml("modle = \"typo\"").unwrap_err();
    assert!(matches!(err, SparkError::Config(_)));
}

#[test]
fn merge_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparkai.toml");
    std::fs::write(
        &path,
        r#"
url = "wss://spark-api.xf-yun.com/v3.5/chat"
app_id = "from-file"
max_tokens = 512
"#,
    )
    .unwrap();

    let config = complete().merge_file(&path).unwrap();
    assert_eq!(config.url, "wss://spark-api.xf-yun.com/v3.5/chat");
    assert_eq!(config.app_id, "from-file");
    assert_eq!(config.max_tokens, 512);
}

#[test]
fn merge_missing_file_is_config_error() {
    let err = complete()
        .merge_file(std::path::Path::new("/tmp/nonexistent_sparkai_config.toml"))
        .unwrap_err();
    assert!(matches!(err, SparkError::Config(_)));
}

#[test]
fn invalid_toml_is_config_error() {
    let err = complete().merge_toml("this is not valid toml {{{").unwrap_err();
    assert!(matches!(err, SparkError::Config(_)));
}
