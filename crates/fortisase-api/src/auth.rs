// FortiCloud IAM authentication for the FortiSASE resource API.
//
// The resource API takes a bearer token. Operators either paste a
// pre-issued access token, or hand over an API user's credentials that are
// exchanged at the FortiCloud IAM token endpoint.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;

/// FortiCloud IAM OAuth token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://customerapiauth.fortinet.com/api/v1/oauth/token/";

/// OAuth client id registered for FortiSASE.
pub const DEFAULT_CLIENT_ID: &str = "FortiSASE";

/// Credentials for authenticating with the resource API.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-issued bearer token, sent as-is.
    AccessToken(SecretString),

    /// IAM API user exchanged for a bearer token with `grant_type=password`.
    Password {
        username: String,
        password: SecretString,
        client_id: String,
    },
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: SecretString) -> Self {
        Self::Password {
            username: username.into(),
            password,
            client_id: DEFAULT_CLIENT_ID.into(),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
    client_id: &'a str,
    grant_type: &'static str,
}

/// Successful answer from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry, with a minute of slack so a token is never
    /// presented in its last seconds.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| now + Duration::seconds(secs) - Duration::seconds(60))
    }
}

/// Exchange IAM API user credentials for a bearer token.
pub async fn fetch_token(
    http: &reqwest::Client,
    auth_url: &Url,
    username: &str,
    password: &SecretString,
    client_id: &str,
) -> Result<TokenResponse, Error> {
    debug!(%auth_url, username, "requesting access token");

    let resp = http
        .post(auth_url.clone())
        .json(&TokenRequest {
            username,
            password: password.expose_secret(),
            client_id,
            grant_type: "password",
        })
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(Error::Authentication {
            message: format!("token endpoint returned HTTP {status}: {}", preview(&body)),
        });
    }

    let token: TokenResponse = serde_json::from_str(&body).map_err(|e| Error::Authentication {
        message: format!("malformed token response: {e}"),
    })?;

    match token.status.as_deref() {
        None | Some("success") => Ok(token),
        Some(other) => Err(Error::Authentication {
            message: token
                .message
                .clone()
                .unwrap_or_else(|| format!("token endpoint status '{other}'")),
        }),
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn expiry_keeps_a_minute_of_slack() {
        let token = TokenResponse {
            access_token: "t".into(),
            expires_in: Some(3600),
            refresh_token: None,
            token_type: Some("Bearer".into()),
            status: Some("success".into()),
            message: None,
        };
        let now = Utc::now();
        assert_eq!(token.expires_at(now), Some(now + Duration::seconds(3540)));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
