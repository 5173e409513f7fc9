//! Shared configuration for FortiSASE tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `fortisase_core::ProviderConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fortisase_core::{AuthCredentials, PollSettings, ProviderConfig, TlsVerification};

/// Keyring service name; entries are `{profile}/password` and
/// `{profile}/access-token`.
pub const KEYRING_SERVICE: &str = "fortisase";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named tenant profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile by explicit name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Local state file used by the CLI.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            state_file: default_state_file(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_state_file() -> PathBuf {
    PathBuf::from("fortisase.state.json")
}

/// A named tenant profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Portal hostname (e.g., "portal.prod.fortisase.com").
    pub hostname: String,

    /// Auth mode: "password" (FortiCloud IAM API user) or "token".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// FortiCloud IAM token endpoint override.
    pub auth_url: Option<String>,

    /// OAuth client id override.
    pub client_id: Option<String>,

    /// IAM API user name.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Pre-issued access token (plaintext; prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,

    /// HTTPS proxy URL.
    pub proxy: Option<String>,

    /// Poll tuning for eventually-consistent resources.
    #[serde(default)]
    pub poll: PollTuning,
}

fn default_auth_mode() -> String {
    "password".into()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            auth_mode: default_auth_mode(),
            auth_url: None,
            client_id: None,
            username: None,
            password: None,
            password_env: None,
            access_token: None,
            access_token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            proxy: None,
            poll: PollTuning::default(),
        }
    }
}

/// Overrides for the poll defaults; unset fields keep the defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollTuning {
    pub interval_secs: Option<u64>,
    pub max_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub deadline_secs: Option<u64>,
    pub settle_secs: Option<u64>,
}

impl PollTuning {
    pub fn apply_to(&self, mut settings: PollSettings) -> PollSettings {
        for policy in [&mut settings.apply, &mut settings.delete] {
            if let Some(secs) = self.interval_secs {
                policy.initial_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = self.max_interval_secs {
                policy.max_interval = Duration::from_secs(secs);
            }
            if let Some(attempts) = self.max_attempts {
                policy.max_attempts = attempts;
            }
            if let Some(secs) = self.deadline_secs {
                policy.deadline = Some(Duration::from_secs(secs));
            }
        }
        if let Some(secs) = self.settle_secs {
            settings.settle = Duration::from_secs(secs);
        }
        settings
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fortisase", "fortisase").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fortisase");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// Nested keys use a double underscore:
/// `FORTISASE_PROFILES__PROD__HOSTNAME=portal.prod.fortisase.com`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FORTISASE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Store a secret (`password` or `access-token`) for a profile.
pub fn store_secret(profile_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}"))?;
    entry.set_password(secret)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Where secrets come from besides the profile itself.
struct Sources<'a> {
    env: &'a dyn Fn(&str) -> Option<String>,
    keyring: bool,
}

impl Sources<'_> {
    fn secret(
        &self,
        env_name: Option<&str>,
        fallback_env: &str,
        profile_name: &str,
        keyring_kind: &str,
        plaintext: Option<&String>,
    ) -> Option<SecretString> {
        // 1. Env var (profile-named first, then the well-known one)
        if let Some(val) = env_name.and_then(self.env).or_else(|| (self.env)(fallback_env)) {
            return Some(SecretString::from(val));
        }

        // 2. System keyring
        if self.keyring {
            if let Some(secret) = keyring_secret(profile_name, keyring_kind) {
                return Some(secret);
            }
        }

        // 3. Plaintext in config
        plaintext.map(|s| SecretString::from(s.clone()))
    }
}

fn system_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolve `AuthCredentials` from a profile's `auth_mode` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    resolve_auth_with(
        profile,
        profile_name,
        &Sources {
            env: &system_env,
            keyring: true,
        },
    )
}

fn resolve_auth_with(
    profile: &Profile,
    profile_name: &str,
    sources: &Sources<'_>,
) -> Result<AuthCredentials, ConfigError> {
    let missing = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };
    match profile.auth_mode.as_str() {
        "token" => sources
            .secret(
                profile.access_token_env.as_deref(),
                "FORTISASE_ACCESS_TOKEN",
                profile_name,
                "access-token",
                profile.access_token.as_ref(),
            )
            .map(AuthCredentials::AccessToken)
            .ok_or_else(missing),
        "password" => {
            let username = profile
                .username
                .clone()
                .or_else(|| (sources.env)("FORTISASE_USERNAME"))
                .ok_or_else(missing)?;
            let password = sources
                .secret(
                    profile.password_env.as_deref(),
                    "FORTISASE_PASSWORD",
                    profile_name,
                    "password",
                    profile.password.as_ref(),
                )
                .ok_or_else(missing)?;
            Ok(AuthCredentials::Password {
                username,
                password,
                client_id: profile.client_id.clone(),
            })
        }
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'password' or 'token', got '{other}'"),
        }),
    }
}

fn parse_url(field: &str, raw: Option<&str>) -> Result<Option<url::Url>, ConfigError> {
    raw.map(|raw| {
        raw.parse().map_err(|_| ConfigError::Validation {
            field: field.into(),
            reason: format!("invalid URL: {raw}"),
        })
    })
    .transpose()
}

/// Build a `ProviderConfig` from a profile, with no CLI overrides.
pub fn profile_to_provider_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ProviderConfig, ConfigError> {
    let auth = resolve_auth(profile, profile_name)?;
    build_provider_config(profile, auth)
}

fn build_provider_config(
    profile: &Profile,
    auth: AuthCredentials,
) -> Result<ProviderConfig, ConfigError> {
    if profile.hostname.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "hostname".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ProviderConfig::new(profile.hostname.clone(), auth);
    config.auth_url = parse_url("auth_url", profile.auth_url.as_deref())?;
    config.proxy = parse_url("proxy", profile.proxy.as_deref())?;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(default_timeout()));
    config.poll = profile.poll.apply_to(PollSettings::default());
    Ok(config)
}
