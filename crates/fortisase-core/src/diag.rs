// ── Diagnostics ──
//
// Terraform-style diagnostics returned by the type-erased resource
// interface. Errors never escape a CRUD call as `Err`; they are folded
// into a diagnostic with a short summary and a detail body.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path the diagnostic is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    #[must_use]
    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(attr) = &self.attribute {
            write!(f, " ({attr})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl From<CoreError> for Diagnostic {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api {
                message,
                status,
                body,
            } => {
                let mut detail = message;
                if let Some(status) = status {
                    detail.push_str(&format!("\nHTTP status: {status}"));
                }
                if let Some(body) = body {
                    detail.push_str(&format!("\nResponse body: {body}"));
                }
                Self::error("FortiSASE API request failed", detail)
            }
            CoreError::Decode(e) => {
                let path = e.path.clone();
                Self::error("Unexpected response shape", e.to_string()).at(path)
            }
            CoreError::Validation { .. } => Self::error("Invalid configuration", err.to_string()),
            CoreError::InvalidImportId { .. } => {
                Self::error("Unexpected import identifier", err.to_string())
            }
            CoreError::RequiresReplace { .. } => {
                Self::error("Resource must be replaced", err.to_string())
            }
            CoreError::PollTimeout { .. } | CoreError::PollFailed { .. } => {
                Self::error("Backend did not converge", err.to_string())
            }
            CoreError::Cancelled { .. } => Self::error("Operation cancelled", err.to_string()),
            CoreError::NotFound { .. } => Self::error("Object not found", err.to_string()),
            CoreError::AuthenticationFailed { .. } => {
                Self::error("Authentication failed", err.to_string())
            }
            CoreError::ConnectionFailed { .. } | CoreError::Timeout => {
                Self::error("Connection failed", err.to_string())
            }
            CoreError::MissingId { .. } | CoreError::Config { .. } | CoreError::Internal(_) => {
                Self::error("Provider error", err.to_string())
            }
        }
    }
}

// ── Collection ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.0.push(diagnostic.into());
    }

    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::error(summary, detail));
    }

    pub fn error_at(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.0.push(Diagnostic::error(summary, detail).at(attribute));
    }

    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::warning(summary, detail));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }
}

impl From<CoreError> for Diagnostics {
    fn from(err: CoreError) -> Self {
        Self(vec![err.into()])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;

    #[test]
    fn api_error_detail_carries_body() {
        let diag = Diagnostic::from(CoreError::Api {
            message: "duplicate entry".into(),
            status: Some(400),
            body: Some("{\"code\":-5}".into()),
        });
        assert!(diag.is_error());
        assert_eq!(diag.summary, "FortiSASE API request failed");
        assert!(diag.detail.contains("HTTP status: 400"));
        assert!(diag.detail.contains("Response body: {\"code\":-5}"));
    }

    #[test]
    fn decode_error_names_the_attribute() {
        let diag = Diagnostic::from(CoreError::Decode(DecodeError {
            path: "backup_links[0].ipsec_remote_gw".into(),
            expected: "a string",
            found: "a list",
        }));
        assert_eq!(
            diag.attribute.as_deref(),
            Some("backup_links[0].ipsec_remote_gw")
        );
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.warning("heads up", "");
        assert!(!diags.has_errors());
        diags.error("boom", "details");
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
    }

    #[test]
    fn display_includes_attribute() {
        let diag = Diagnostic::error("Missing required attribute", "set it").at("name");
        assert_eq!(
            diag.to_string(),
            "error: Missing required attribute (name): set it"
        );
    }
}
