//! Signed connection URLs.
//!
//! The service authenticates the WebSocket upgrade through query parameters:
//! an HMAC-SHA256 signature over `host`, `date` and the request line, wrapped
//! in an authorization descriptor and base64-encoded.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio_tungstenite::tungstenite::http::Uri;

use crate::{Result, SparkError};

type HmacSha256 = Hmac<Sha256>;

/// Signs endpoint URLs with an API key/secret pair.
#[derive(Clone)]
pub struct AuthUrlSigner {
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for AuthUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUrlSigner")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl AuthUrlSigner {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Build the signed URL for `url` at time `now`.
    ///
    /// The result is rebuilt from the parsed URL: any `#fragment` is dropped
    /// and a trailing `/` on the path is trimmed. Deterministic for a fixed
    /// `(url, key, secret, now)`.
    pub fn sign(&self, url: &str, now: DateTime<Utc>) -> Result<String> {
        let without_fragment = url.split_once('#').map_or(url, |(base, _)| base);
        let uri: Uri = without_fragment
            .parse()
            .map_err(|e| SparkError::Config(format!("invalid endpoint url {url:?}: {e}")))?;
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| SparkError::Config(format!("endpoint url {url:?} has no scheme")))?;
        let host = match (uri.host(), uri.port_u16()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SparkError::Config(format!(
                    "endpoint url {url:?} has no host"
                )))
            }
        };
        let path = match uri.path() {
            "" | "/" => "/",
            path => path.strip_suffix('/').unwrap_or(path),
        };

        let date = http_date(now);
        let signature = self.signature(&host, &date, path);
        let descriptor = format!(
            "hmac username=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", signature=\"{}\"",
            self.api_key, signature
        );
        let authorization = B64.encode(descriptor);

        let query = match uri.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&"),
            _ => String::new(),
        };
        Ok(format!(
            "{scheme}://{host}{path}?{query}host={}&date={}&authorization={}",
            urlencoding::encode(&host),
            urlencoding::encode(&date),
            urlencoding::encode(&authorization),
        ))
    }

    /// Base64 HMAC-SHA256 over the canonical signing string.
    pub(crate) fn signature(&self, host: &str, date: &str, path: &str) -> String {
        let canonical = format!("host: {host}\ndate: {date}\nGET {path} HTTP/1.1");
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(canonical.as_bytes());
        B64.encode(mac.finalize().into_bytes())
    }
}

/// Format `now` as an HTTP date (RFC 1123, GMT).
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
