// ── Core error types ──
//
// Errors raised while orchestrating a resource lifecycle. Transport-level
// failures arrive through `From<fortisase_api::Error>`; everything else is
// produced by the codec, schema validation, and the poller. Every variant
// is terminal to the current CRUD invocation.

use thiserror::Error;

use crate::codec::DecodeError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach FortiSASE at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{entity_type} '{identifier}' not found")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
        /// Raw response body, kept for the diagnostic detail.
        body: Option<String>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Invalid configuration for {resource}: {message}")]
    Validation { resource: String, message: String },

    #[error("Invalid import id '{id}': {reason}")]
    InvalidImportId { id: String, reason: String },

    #[error("Missing identifier for {resource}: {field} is not set")]
    MissingId { resource: String, field: String },

    #[error("Changing {} requires replacing {resource}", .attributes.join(", "))]
    RequiresReplace {
        resource: String,
        attributes: Vec<String>,
    },

    // ── Eventual consistency ─────────────────────────────────────────
    #[error("Timed out waiting for {what} after {attempts} attempts (last observed: {last_observed})")]
    PollTimeout {
        what: String,
        attempts: u32,
        last_observed: String,
    },

    #[error("{what} reported failure: {state}")]
    PollFailed { what: String, state: String },

    #[error("Operation cancelled while waiting for {what}")]
    Cancelled { what: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fortisase_api::Error> for CoreError {
    fn from(err: fortisase_api::Error) -> Self {
        match err {
            fortisase_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fortisase_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                        body: None,
                    }
                }
            }
            fortisase_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fortisase_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Invalid base URL: {url}"),
            },
            fortisase_api::Error::MissingPathParam { name, template } => CoreError::Internal(
                format!("path parameter '{name}' missing for {template}"),
            ),
            fortisase_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fortisase_api::Error::Api {
                status,
                message,
                body,
            } => CoreError::Api {
                message,
                status: Some(status),
                body: (!body.is_empty()).then_some(body),
            },
            fortisase_api::Error::NotFound { path } => CoreError::NotFound {
                entity_type: "object".into(),
                identifier: path,
            },
            fortisase_api::Error::Deserialization { message, body }
            | fortisase_api::Error::UnexpectedShape { message, body } => CoreError::Api {
                message,
                status: None,
                body: Some(body),
            },
        }
    }
}
