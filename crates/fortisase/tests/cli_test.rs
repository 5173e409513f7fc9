//! Integration tests for the `fortisase` CLI binary.
//!
//! Everything here runs offline: argument parsing, introspection,
//! validation and planning against a temporary state file.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `fortisase` binary with env isolation.
///
/// Clears `FORTISASE_*` variables and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fortisase_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fortisase");
    cmd.env("HOME", "/tmp/fortisase-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fortisase-cli-test-nonexistent")
        .env_remove("FORTISASE_PROFILE")
        .env_remove("FORTISASE_HOSTNAME")
        .env_remove("FORTISASE_ACCESS_TOKEN")
        .env_remove("FORTISASE_STATE")
        .env_remove("FORTISASE_OUTPUT")
        .env_remove("FORTISASE_INSECURE")
        .env_remove("FORTISASE_TIMEOUT")
        .env_remove("FORTISASE_USERNAME")
        .env_remove("FORTISASE_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path.display().to_string()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fortisase_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    fortisase_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("FortiSASE")
            .and(predicate::str::contains("apply"))
            .and(predicate::str::contains("import"))
            .and(predicate::str::contains("refresh")),
    );
}

#[test]
fn test_version_flag() {
    fortisase_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fortisase"));
}

#[test]
fn test_completions_zsh() {
    fortisase_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = fortisase_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

// ── Introspection ───────────────────────────────────────────────────

#[test]
fn test_resources_list_plain() {
    fortisase_cmd()
        .args(["resources", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("fortisase_network_hosts")
                .and(predicate::str::contains(
                    "fortisase_private_access_service_connections",
                ))
                .and(predicate::str::contains("fortisase_endpoint_disconnect")),
        );
}

#[test]
fn test_resource_schema_json() {
    let output = fortisase_cmd()
        .args(["resources", "schema", "fortisase_auth_ldap_servers", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["attributes"]["password"]["sensitive"], json!(true));
}

#[test]
fn test_unknown_resource_type() {
    let output = fortisase_cmd()
        .args(["resources", "schema", "fortisase_nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("fortisase_nope"));
}

// ── Validate / plan ─────────────────────────────────────────────────

#[test]
fn test_validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "host.json",
        &json!({ "primary_key": "web01", "type": "ipmask", "subnet": "10.1.1.1/32" }),
    );
    fortisase_cmd()
        .args(["validate", "fortisase_network_hosts.web01", "-f", &file])
        .assert()
        .success()
        .stderr(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "host.json",
        &json!({ "primary_key": "web01", "type": "subnet" }),
    );
    let output = fortisase_cmd()
        .args(["--color", "never", "validate", "fortisase_network_hosts.web01", "-f", &file])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("on attribute type"));
}

#[test]
fn test_bad_address_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "host.json", &json!({}));
    let output = fortisase_cmd()
        .args(["validate", "fortisase_network_hosts", "-f", &file])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_plan_create_against_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "host.json",
        &json!({ "primary_key": "web01", "type": "fqdn", "fqdn": "example.com" }),
    );
    let state = dir.path().join("state.json");
    fortisase_cmd()
        .args(["plan", "fortisase_network_hosts.web01", "-f", &file])
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("will be created"));
    // Planning never writes state.
    assert!(!state.exists());
}

#[test]
fn test_plan_replace_against_tracked_state() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "host.json",
        &json!({ "primary_key": "web01", "type": "fqdn", "fqdn": "example.com" }),
    );
    let state = write_json(
        dir.path(),
        "state.json",
        &json!({
            "version": 1,
            "resources": {
                "fortisase_network_hosts.web01": {
                    "type_name": "fortisase_network_hosts",
                    "state": { "id": "web01", "primary_key": "web01", "type": "ipmask" }
                }
            }
        }),
    );
    let output = fortisase_cmd()
        .args(["plan", "fortisase_network_hosts.web01", "-f", &file, "--state", &state, "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["action"], json!("replace"));
    assert_eq!(plan["replace_paths"], json!(["type"]));
}

// ── State / tenant errors ───────────────────────────────────────────

#[test]
fn test_state_list_empty() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    fortisase_cmd()
        .args(["state", "list", "-o", "json"])
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_destroy_untracked_address() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let output = fortisase_cmd()
        .args(["destroy", "fortisase_network_hosts.web01", "--yes"])
        .arg("--state")
        .arg(&state)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("not tracked"));
}

#[test]
fn test_apply_without_tenant() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "host.json",
        &json!({ "primary_key": "web01", "type": "fqdn", "fqdn": "example.com" }),
    );
    let state = dir.path().join("state.json");
    let output = fortisase_cmd()
        .args(["apply", "fortisase_network_hosts.web01", "-f", &file, "--yes"])
        .arg("--state")
        .arg(&state)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("No FortiSASE tenant configured"));
    assert!(!state.exists());
}
