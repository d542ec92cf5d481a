use thiserror::Error;

/// Failure taxonomy for the whole client. Every remote call and file
/// operation funnels into one of these; nothing panics past this boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or incomplete API settings (base URL / key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-2xx from the generative-image API.
    #[error("upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// 2xx upstream response whose payload is not usable.
    #[error("unexpected upstream response: {0}")]
    ResponseFormat(String),

    /// Application-level failure (code != 200) from a gallery endpoint.
    #[error("gallery error: {0}")]
    Gallery(String),

    /// Authentication failure: bad credentials, expired token, or 401/403.
    #[error("auth error: {0}")]
    Auth(String),

    /// Transport-level failure before any HTTP status was produced.
    #[error("network error: {0}")]
    Network(String),

    /// File read or image encode/decode failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Local persisted-state I/O failure.
    #[error("persistence error: {0}")]
    Persist(String),
}

impl ClientError {
    /// True when the caller should drop the local session (forced logout).
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::Auth(msg) if msg.contains("expired"))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}
