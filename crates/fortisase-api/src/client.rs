// Hand-crafted async HTTP client for the FortiSASE resource API.
//
// Base path: /resource-api/v2/
// Auth: Bearer token (pre-issued or exchanged at FortiCloud IAM)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{self, Credentials, DEFAULT_AUTH_URL};
use crate::error::Error;
use crate::input::{InputModel, JsonMap};
use crate::transport::TransportConfig;

const API_PREFIX: &str = "resource-api/v2";

// ── Resource API seam ────────────────────────────────────────────────

/// The four verbs every resource handler needs.
///
/// `path` is a template relative to the API root (e.g. `auth/ldap-servers`
/// or `security/{direction}/web-filter-profile`); see
/// [`InputModel::resolve`] for how it is expanded. Implemented by
/// [`SaseClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `POST {path}` with `input.body`.
    async fn create(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error>;

    /// `GET {path}/{mkey}`.
    async fn read(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error>;

    /// `PUT {path}/{mkey}` with `input.body`.
    async fn update(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error>;

    /// `DELETE {path}/{mkey}`.
    async fn delete(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error>;
}

// ── Client ───────────────────────────────────────────────────────────

struct CachedToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Async client for the FortiSASE resource API.
///
/// Holds a single `reqwest::Client` and a cached bearer token shared by
/// all concurrent callers.
pub struct SaseClient {
    http: reqwest::Client,
    base_url: Url,
    auth_url: Url,
    credentials: Credentials,
    token: RwLock<Option<CachedToken>>,
}

impl SaseClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a portal hostname, credentials, and transport config.
    ///
    /// `hostname` may be a bare host (`portal.prod.fortisase.com`) or a
    /// full URL; `/resource-api/v2/` is appended unless already present.
    pub fn new(
        hostname: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(hostname, http, credentials)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        hostname: &str,
        http: reqwest::Client,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(hostname)?,
            auth_url: Url::parse(DEFAULT_AUTH_URL)?,
            credentials,
            token: RwLock::new(None),
        })
    }

    /// Override the FortiCloud IAM token endpoint.
    pub fn with_auth_url(mut self, auth_url: &str) -> Result<Self, Error> {
        self.auth_url = Url::parse(auth_url)?;
        Ok(self)
    }

    /// Resource API root, always ending in `/resource-api/v2/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let raw = if raw.contains("://") {
            raw.to_owned()
        } else {
            format!("https://{raw}")
        };
        let mut url = Url::parse(&raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with(API_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/{API_PREFIX}/"));
        }

        Ok(url)
    }

    // ── Token management ─────────────────────────────────────────────

    async fn bearer(&self) -> Result<SecretString, Error> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let cached = match &self.credentials {
            Credentials::AccessToken(token) => CachedToken {
                token: token.clone(),
                expires_at: None,
            },
            Credentials::Password {
                username,
                password,
                client_id,
            } => {
                let resp =
                    auth::fetch_token(&self.http, &self.auth_url, username, password, client_id)
                        .await?;
                debug!("access token acquired");
                let expires_at = resp.expires_at(Utc::now());
                CachedToken {
                    token: SecretString::from(resp.access_token),
                    expires_at,
                }
            }
        };

        let token = cached.token.clone();
        *guard = Some(cached);
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn send(
        &self,
        method: Method,
        template: &str,
        input: &InputModel,
    ) -> Result<JsonMap, Error> {
        let url = input.resolve(&self.base_url, template)?;
        debug!("{method} {url}");

        let token = self.bearer().await?;
        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token.expose_secret());

        if method == Method::POST || method == Method::PUT {
            trace!(body = ?input.body, "request body");
            builder = builder.json(&input.body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            into_object(body)
        } else {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
            }
            Err(parse_error(status, url.path(), resp).await)
        }
    }
}

#[async_trait]
impl ResourceApi for SaseClient {
    async fn create(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error> {
        self.send(Method::POST, path, input).await
    }

    async fn read(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error> {
        self.send(Method::GET, path, input).await
    }

    async fn update(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error> {
        self.send(Method::PUT, path, input).await
    }

    async fn delete(&self, path: &str, input: &InputModel) -> Result<JsonMap, Error> {
        self.send(Method::DELETE, path, input).await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Decode a success body into a JSON object.
///
/// Empty bodies become an empty object; a `{"data": {...}}` envelope is
/// unwrapped; anything that is not an object is rejected.
fn into_object(body: String) -> Result<JsonMap, Error> {
    if body.trim().is_empty() {
        return Ok(JsonMap::new());
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })?;

    match value {
        Value::Object(mut map) => {
            if matches!(map.get("data"), Some(Value::Object(_))) {
                if let Some(Value::Object(inner)) = map.remove("data") {
                    return Ok(inner);
                }
            }
            Ok(map)
        }
        Value::Null => Ok(JsonMap::new()),
        other => Err(Error::UnexpectedShape {
            message: format!("expected a JSON object, got {}", kind_of(&other)),
            body,
        }),
    }
}

async fn parse_error(status: reqwest::StatusCode, path: &str, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Authentication {
            message: extract_message(&raw).unwrap_or_else(|| "bearer token rejected".into()),
        };
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Error::NotFound {
            path: path.to_owned(),
        };
    }

    Error::Api {
        status: status.as_u16(),
        message: extract_message(&raw).unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                preview(&raw).to_owned()
            }
        }),
        body: raw,
    }
}

/// Pull a human-readable message out of a JSON error body.
fn extract_message(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    ["message", "error", "detail", "error_description"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
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
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_hostname_gets_scheme_and_prefix() {
        let url = SaseClient::normalize_base_url("portal.prod.fortisase.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://portal.prod.fortisase.com/resource-api/v2/"
        );
    }

    #[test]
    fn existing_prefix_is_kept() {
        let url = SaseClient::normalize_base_url("http://127.0.0.1:8080/resource-api/v2").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/resource-api/v2/");
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert!(into_object(String::new()).unwrap().is_empty());
        assert!(into_object("null".into()).unwrap().is_empty());
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let body = json!({ "data": { "primaryKey": "ldap1" }, "status": "ok" }).to_string();
        let map = into_object(body).unwrap();
        assert_eq!(map.get("primaryKey"), Some(&json!("ldap1")));
        assert!(!map.contains_key("status"));
    }

    #[test]
    fn array_body_is_unexpected_shape() {
        let err = into_object("[1,2]".into()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedShape { .. }), "got {err:?}");
    }

    #[test]
    fn message_is_extracted_from_known_keys() {
        assert_eq!(
            extract_message(r#"{"error":"duplicate name"}"#).as_deref(),
            Some("duplicate name")
        );
        assert_eq!(extract_message("not json"), None);
    }
}
