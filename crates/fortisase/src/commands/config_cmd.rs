//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Input, Select};

use fortisase_config::{KEYRING_SERVICE, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(
        out,
        "state_file = \"{}\"",
        cfg.defaults.state_file.display()
    );

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "hostname = \"{}\"", p.hostname);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if p.access_token.is_some() {
            let _ = writeln!(out, "access_token = \"****\"");
        }
        if let Some(ref env) = p.access_token_env {
            let _ = writeln!(out, "access_token_env = \"{env}\"");
        }
        if let Some(ref id) = p.client_id {
            let _ = writeln!(out, "client_id = \"{id}\"");
        }
        if let Some(ref url) = p.auth_url {
            let _ = writeln!(out, "auth_url = \"{url}\"");
        }
        if let Some(ref proxy) = p.proxy {
            let _ = writeln!(out, "proxy = \"{proxy}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Serializable view of the config with secrets masked.
fn redacted_value(cfg: &Config) -> Result<serde_json::Value, CliError> {
    let mut value = serde_json::to_value(cfg)?;
    if let Some(profiles) = value
        .get_mut("profiles")
        .and_then(serde_json::Value::as_object_mut)
    {
        for profile in profiles.values_mut().filter_map(|p| p.as_object_mut()) {
            for key in ["password", "access_token"] {
                if profile.get(key).is_some_and(|v| !v.is_null()) {
                    profile.insert(key.into(), "****".into());
                }
            }
        }
    }
    Ok(value)
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret(prompt: &str, field: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    profile_name: &str,
    kind: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(profile_name, kind, secret)?;
        eprintln!("   ✓ {label} stored in system keyring ({KEYRING_SERVICE})");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

fn save_config(cfg: &Config) -> Result<PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("FortiSASE configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let hostname: String = Input::new()
                .with_prompt("Portal hostname")
                .default("portal.prod.fortisase.com".into())
                .interact_text()
                .map_err(prompt_err)?;

            let auth_choices = &["IAM API user (username/password)", "Access token"];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                hostname,
                ..Profile::default()
            };
            if auth_selection == 0 {
                let username: String = Input::new()
                    .with_prompt("IAM API user")
                    .interact_text()
                    .map_err(prompt_err)?;
                let password = prompt_secret("Password: ", "password")?;
                profile.auth_mode = "password".into();
                profile.username = Some(username);
                profile.password =
                    prompt_keyring_storage(&password, &profile_name, "password", "password")?;
            } else {
                let token = prompt_secret("Access token: ", "access_token")?;
                profile.auth_mode = "token".into();
                profile.access_token =
                    prompt_keyring_storage(&token, &profile_name, "access-token", "access token")?;
            }

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            let path = save_config(&cfg)?;
            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: fortisase resources list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                crate::cli::OutputFormat::Table | crate::cli::OutputFormat::Plain => {
                    format_config_redacted(&cfg)
                }
                format => {
                    let value = redacted_value(&cfg)?;
                    output::render_single(format, &value, |_| String::new(), |_| String::new())?
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "hostname" => profile.hostname = value,
                "auth_mode" | "auth-mode" => {
                    if !matches!(value.as_str(), "password" | "token") {
                        return Err(CliError::Validation {
                            field: "auth_mode".into(),
                            reason: "must be 'password' or 'token'".into(),
                        });
                    }
                    profile.auth_mode = value;
                }
                "username" => profile.username = Some(value),
                "password_env" | "password-env" => profile.password_env = Some(value),
                "access_token_env" | "access-token-env" => profile.access_token_env = Some(value),
                "client_id" | "client-id" => profile.client_id = Some(value),
                "auth_url" | "auth-url" => profile.auth_url = Some(value),
                "proxy" => profile.proxy = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "insecure" => {
                    profile.insecure = Some(parse_flag("insecure", &value, "must be 'true' or 'false'")?);
                }
                "timeout" => {
                    profile.timeout =
                        Some(parse_flag("timeout", &value, "must be a number (seconds)")?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: hostname, auth_mode, \
                             username, password_env, access_token_env, client_id, auth_url, \
                             proxy, ca_cert, insecure, timeout"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: fortisase config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ────────────────────────────────────────────
        ConfigCommand::SetPassword { token } => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let (kind, label) = if token {
                ("access-token", "Access token")
            } else {
                ("password", "Password")
            };
            let secret = prompt_secret(&format!("{label}: "), kind)?;
            store_secret(&profile_name, kind, &secret)?;
            eprintln!("✓ {label} stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                hostname: "portal.prod.fortisase.com".into(),
                auth_mode: "password".into(),
                username: Some("api-user".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn redacted_text_masks_password() {
        let out = format_config_redacted(&sample());
        assert!(out.contains("[profiles.prod]"));
        assert!(out.contains("password = \"****\""));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn redacted_value_masks_password() {
        let value = redacted_value(&sample()).unwrap();
        assert_eq!(value["profiles"]["prod"]["password"], "****");
        assert_eq!(value["profiles"]["prod"]["username"], "api-user");
    }
}
