use thiserror::Error;

/// Top-level error type for the `fortisase-api` crate.
///
/// Covers every failure mode of the resource API surface:
/// authentication, transport, URL construction and response decoding.
/// `fortisase-core` maps these into diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange failed or the API rejected the bearer token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry path segments (e.g. `data:` URLs).
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// A `{placeholder}` in a path template had no value.
    #[error("Missing path parameter '{name}' for {template}")]
    MissingPathParam { name: String, template: String },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success answer from the resource API. `body` keeps the raw
    /// response for diagnostics.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    /// The addressed object does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The response was valid JSON but not an object.
    #[error("Unexpected response shape: {message}")]
    UnexpectedShape { message: String, body: String },
}

impl Error {
    /// Returns `true` if the bearer token was rejected and a fresh
    /// token exchange might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient network-level failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// HTTP status code, when the error came from an HTTP answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body, when one was captured.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. }
            | Self::Deserialization { body, .. }
            | Self::UnexpectedShape { body, .. } => Some(body),
            _ => None,
        }
    }
}
