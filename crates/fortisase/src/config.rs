//! CLI configuration: a thin layer over `fortisase_config`.
//!
//! Adds `GlobalOpts` flag overrides (--hostname, --access-token, etc.)
//! on top of the profile resolved from the config file.

use std::path::PathBuf;

use fortisase_core::ProviderConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fortisase_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// State file: flag / env first, then `defaults.state_file`.
pub fn state_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    global
        .state
        .clone()
        .unwrap_or_else(|| config.defaults.state_file.clone())
}

/// Apply flag overrides to a profile. Flags win over profile values.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref hostname) = global.hostname {
        profile.hostname.clone_from(hostname);
    }
    if let Some(ref token) = global.access_token {
        profile.auth_mode = "token".into();
        profile.access_token = Some(token.clone());
        profile.access_token_env = None;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }
    profile
}

/// Build the `ProviderConfig` for this invocation.
///
/// Uses the active profile when one exists; otherwise falls back to
/// `--hostname` + `--access-token` alone.
pub fn resolve_provider_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ProviderConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let base = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.hostname.is_some() => Profile {
            auth_mode: "token".into(),
            ..Profile::default()
        },
        None if global.profile.is_some() => {
            let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(base, global);
    Ok(fortisase_config::profile_to_provider_config(
        &profile,
        &profile_name,
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use fortisase_core::{AuthCredentials, TlsVerification};

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["fortisase"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["state", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_alone_build_a_token_config() {
        let opts = global(&["--hostname", "portal.example.com", "--access-token", "t0k", "-k"]);
        let provider = resolve_provider_config(&opts, &Config::default()).unwrap();
        assert_eq!(provider.hostname, "portal.example.com");
        assert_eq!(provider.tls, TlsVerification::DangerAcceptInvalid);
        assert!(matches!(provider.auth, AuthCredentials::AccessToken(_)));
    }

    #[test]
    fn hostname_flag_overrides_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                hostname: "portal.prod.fortisase.com".into(),
                auth_mode: "token".into(),
                access_token: Some("from-file".into()),
                ..Profile::default()
            },
        );
        let opts = global(&["--hostname", "portal.lab.example.com", "--timeout", "5"]);
        let provider = resolve_provider_config(&opts, &cfg).unwrap();
        assert_eq!(provider.hostname, "portal.lab.example.com");
        assert_eq!(provider.timeout.as_secs(), 5);
    }

    #[test]
    fn unknown_explicit_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("prod".into(), Profile::default());
        let opts = global(&["--profile", "lab"]);
        match resolve_provider_config(&opts, &cfg) {
            Err(CliError::ProfileNotFound { name, available }) => {
                assert_eq!(name, "lab");
                assert_eq!(available, "prod");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
