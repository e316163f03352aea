use std::time::Duration;

pub type Result<T> = std::result::Result<T, SparkError>;

#[derive(Debug, thiserror::Error)]
pub enum SparkError {
    /// Missing or invalid configuration. Raised before any connection attempt.
    #[error("config error: {0}")]
    Config(String),

    #[error("handshake failed: HTTP {status}: {body}")]
    Handshake { status: u16, body: String },

    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// Read or write failure on an open connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service reported a non-zero code in a frame header.
    #[error("code != 0 {code}: {message}")]
    Protocol {
        code: i64,
        message: String,
        sid: String,
    },

    /// An inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("empty response")]
    EmptyResponse,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SparkError {
    /// The service-supplied error code, for protocol failures.
    pub fn code(&self) -> Option<i64> {
        match self {
            SparkError::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }
}
