//! Local state file: what the CLI believes exists on the tenant.
//!
//! One JSON document keyed by resource address (`<type>.<name>`). Saved
//! through a sibling temp file and a rename so a crash never leaves a
//! half-written state behind.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::CliError;

const STATE_VERSION: u32 = 1;

// ── Address ──────────────────────────────────────────────────────────

/// `<type>.<name>`, e.g. `fortisase_network_hosts.web01`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address {
    pub type_name: String,
    pub name: String,
}

impl FromStr for Address {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CliError::Validation {
            field: "address".into(),
            reason: format!("'{s}' {reason}; expected <type>.<name>"),
        };
        let (type_name, name) = s.split_once('.').ok_or_else(|| invalid("has no '.'"))?;
        if type_name.is_empty() || name.is_empty() {
            return Err(invalid("has an empty part"));
        }
        if name.contains('.') {
            return Err(invalid("has more than one '.'"));
        }
        Ok(Self {
            type_name: type_name.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

// ── State document ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedResource {
    pub type_name: String,
    pub state: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, TrackedResource>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load from `path`; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let state: Self = serde_json::from_str(&contents)?;
                if state.version != STATE_VERSION {
                    return Err(CliError::Validation {
                        field: "state file".into(),
                        reason: format!(
                            "{} has version {}, expected {STATE_VERSION}",
                            path.display(),
                            state.version
                        ),
                    });
                }
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file, starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = temp_sibling(path);
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), resources = self.resources.len(), "state saved");
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&Value> {
        self.resources.get(&address.to_string()).map(|r| &r.state)
    }

    pub fn put(&mut self, address: &Address, state: Value) {
        self.resources.insert(
            address.to_string(),
            TrackedResource {
                type_name: address.type_name.clone(),
                state,
            },
        );
    }

    pub fn remove(&mut self, address: &Address) -> Option<Value> {
        self.resources.remove(&address.to_string()).map(|r| r.state)
    }

    /// Tracked addresses in sorted order.
    pub fn addresses(&self) -> Result<Vec<Address>, CliError> {
        self.resources.keys().map(|k| k.parse()).collect()
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
