// ── Runtime provider configuration ──
//
// These types describe *how* to reach a FortiSASE tenant. They carry
// credential data and connection tuning, but never touch disk. The CLI
// (or a protocol shim) builds a `ProviderConfig` and hands it in.

use std::time::Duration;

use fortisase_api::{Credentials, SaseClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::poll::PollPolicy;

/// How to authenticate with the resource API.
///
/// Carries the actual credential data; converted to
/// `fortisase_api::Credentials` when the client is built.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Pre-issued bearer token.
    AccessToken(SecretString),
    /// FortiCloud IAM API user.
    Password {
        username: String,
        password: SecretString,
        /// OAuth client id; `FortiSASE` when unset.
        client_id: Option<String>,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). FortiSASE portals carry public certificates.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (intercepting proxies in lab setups).
    DangerAcceptInvalid,
}

/// Poll tuning for eventually-consistent resources.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    /// Wait for `config_state` after create/update.
    pub apply: PollPolicy,
    /// Wait for the object to disappear after delete.
    pub delete: PollPolicy,
    /// One-shot wait after action resources fire.
    pub settle: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            apply: PollPolicy::default(),
            delete: PollPolicy::default(),
            settle: Duration::from_secs(30),
        }
    }
}

/// Configuration for talking to one FortiSASE tenant.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Portal hostname (`portal.prod.fortisase.com`) or full base URL.
    pub hostname: String,
    /// Token endpoint override; FortiCloud IAM when unset.
    pub auth_url: Option<Url>,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub proxy: Option<Url>,
    pub poll: PollSettings,
}

impl ProviderConfig {
    pub fn new(hostname: impl Into<String>, auth: AuthCredentials) -> Self {
        Self {
            hostname: hostname.into(),
            auth_url: None,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            proxy: None,
            poll: PollSettings::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            proxy: self.proxy.clone(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        match &self.auth {
            AuthCredentials::AccessToken(token) => Credentials::AccessToken(token.clone()),
            AuthCredentials::Password {
                username,
                password,
                client_id,
            } => match client_id {
                Some(id) => Credentials::Password {
                    username: username.clone(),
                    password: password.clone(),
                    client_id: id.clone(),
                },
                None => Credentials::password(username.clone(), password.clone()),
            },
        }
    }

    /// Build the HTTP client for this tenant.
    pub fn build_client(&self) -> Result<SaseClient, CoreError> {
        if self.hostname.trim().is_empty() {
            return Err(CoreError::Config {
                message: "hostname is required".into(),
            });
        }
        let client = SaseClient::new(&self.hostname, self.credentials(), &self.transport())?;
        match &self.auth_url {
            Some(url) => Ok(client.with_auth_url(url.as_str())?),
            None => Ok(client),
        }
    }
}
