//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fortisase_config::ConfigError;
use fortisase_core::{CoreError, Diagnostics};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to FortiSASE at {url}")]
    #[diagnostic(
        code(fortisase::connection_failed),
        help(
            "Check the portal hostname and your network path.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fortisase::auth_failed),
        help(
            "Verify the IAM API user credentials or access token.\n\
             Run: fortisase config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(fortisase::no_credentials),
        help(
            "Configure credentials with: fortisase config init\n\
             Or set FORTISASE_PASSWORD / FORTISASE_ACCESS_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Unknown resource type '{type_name}'")]
    #[diagnostic(
        code(fortisase::unknown_type),
        help("Run: fortisase resources list")
    )]
    UnknownType { type_name: String },

    #[error("'{address}' is not tracked in {state_file}")]
    #[diagnostic(
        code(fortisase::not_tracked),
        help("Run: fortisase state list, or bring the object in with fortisase import")
    )]
    NotTracked { address: String, state_file: String },

    #[error("{entity_type} '{identifier}' not found")]
    #[diagnostic(code(fortisase::not_found))]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("'{address}' is already tracked")]
    #[diagnostic(
        code(fortisase::conflict),
        help("Remove it first with: fortisase state rm {address}")
    )]
    AlreadyTracked { address: String },

    /// The resource layer reported error diagnostics.
    #[error("{action} {address} failed")]
    #[diagnostic(code(fortisase::resource_failed), help("{details}"))]
    ResourceFailed {
        action: &'static str,
        address: String,
        details: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(fortisase::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fortisase::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fortisase::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fortisase config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No FortiSASE tenant configured")]
    #[diagnostic(
        code(fortisase::no_config),
        help(
            "Create a profile with: fortisase config init\n\
             Expected at: {path}\n\
             Or pass --hostname together with --access-token."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fortisase::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fortisase::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Aborted")]
    #[diagnostic(code(fortisase::aborted))]
    Aborted,

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(fortisase::timeout),
        help("Increase the timeout with --timeout or check portal responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(fortisase::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(fortisase::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NotTracked { .. } | Self::UnknownType { .. } => {
                exit_code::NOT_FOUND
            }
            Self::AlreadyTracked { .. } => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Json(_)
            | Self::ResourceFailed {
                action: "validate" | "plan",
                ..
            } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Fold error diagnostics into a single CLI error.
    pub fn from_diagnostics(action: &'static str, address: &str, diags: &Diagnostics) -> Self {
        let details = diags
            .errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self::ResourceFailed {
            action,
            address: address.to_owned(),
            details,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::Timeout => Self::Timeout,
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                entity_type,
                identifier,
            },
            CoreError::Validation { resource, message } => Self::Validation {
                field: resource,
                reason: message,
            },
            CoreError::InvalidImportId { id, reason } => Self::Validation {
                field: format!("import id '{id}'"),
                reason,
            },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            other => Self::Api {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => Self::Config(other),
        }
    }
}
