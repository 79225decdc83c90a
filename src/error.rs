use thiserror::Error;

/// Unified error type for the hybrid client.
///
/// The remote API is reverse-engineered and has no stable schema contract, so
/// the variants here are the *decision surface* for failover: the orchestrator
/// matches on them to decide whether the browser path should be attempted.
/// No collaborator error is ever allowed to cross the orchestrator boundary
/// unwrapped.
#[derive(Debug, Error)]
pub enum Error {
    /// No bearer token could be discovered. Permanent for the process:
    /// the orchestrator downgrades to browser-only mode.
    #[error("no API credential available")]
    CredentialMissing,

    /// Transport-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-2xx status.
    #[error("upstream rejected request: HTTP {status}: {message}")]
    UpstreamRejected { status: u16, message: String },

    /// The body decoded, but an expected field was absent. Covers the
    /// "HTTP 200 with no extractable content" case, which must count as a
    /// failure for fallback purposes.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The browser-automation collaborator failed. Terminal: there is no
    /// further fallback behind it.
    #[error("browser automation error: {message}")]
    Browser { message: String },

    /// Local I/O failure (reading a file attachment).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid base URL or endpoint path.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Error::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Error::Browser {
            message: message.into(),
        }
    }

    /// Whether the browser path should be attempted after this failure.
    ///
    /// Everything on the direct path is fallbackable; a browser failure is
    /// not, since nothing sits behind it.
    pub fn is_fallbackable(&self) -> bool {
        !matches!(self, Error::Browser { .. })
    }
}
