// ── Bitwarden CLI lookup ──
//
// Passwords can live in a Bitwarden vault instead of the config file. The
// `bw` binary must be installed and unlocked (`BW_SESSION` exported); this
// module only shells out to it and picks the right item.

use std::process::Command;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::ConfigError;

/// One vault item as printed by `bw list items`.
#[derive(Debug, Clone, Deserialize)]
pub struct BitwardenItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub login: Option<BitwardenLogin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitwardenLogin {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Thin wrapper around the `bw` executable.
#[derive(Debug, Clone)]
pub struct BitwardenCli {
    program: String,
}

impl Default for BitwardenCli {
    fn default() -> Self {
        Self::new("bw")
    }
}

impl BitwardenCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Pull the vault, then search it for `query`.
    pub fn search(&self, query: &str) -> Result<Vec<BitwardenItem>, ConfigError> {
        self.run(&["sync"])?;
        let stdout = self.run(&["list", "items", "--search", query])?;
        parse_items(&stdout)
    }

    /// Resolve the login password of the item named `item`.
    pub fn password(&self, item: &str) -> Result<SecretString, ConfigError> {
        let items = self.search(item)?;
        debug!(count = items.len(), "bitwarden search for '{item}'");
        select_password(&items, item)
    }

    fn run(&self, args: &[&str]) -> Result<String, ConfigError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| ConfigError::Bitwarden {
                reason: format!("failed to execute '{}': {e}", self.program),
            })?;

        if !output.status.success() {
            return Err(ConfigError::Bitwarden {
                reason: format!(
                    "'{} {}' failed: {}",
                    self.program,
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub(crate) fn parse_items(stdout: &str) -> Result<Vec<BitwardenItem>, ConfigError> {
    serde_json::from_str(stdout).map_err(|e| ConfigError::Bitwarden {
        reason: format!("failed to parse search result: {e}"),
    })
}

/// Prefer the item whose name equals `name`; otherwise take the first hit.
pub(crate) fn select_password(
    items: &[BitwardenItem],
    name: &str,
) -> Result<SecretString, ConfigError> {
    let item = items
        .iter()
        .find(|i| i.name == name)
        .or_else(|| items.first())
        .ok_or_else(|| ConfigError::Bitwarden {
            reason: format!("no item matches '{name}'"),
        })?;

    item.login
        .as_ref()
        .and_then(|login| login.password.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::Bitwarden {
            reason: format!("item '{}' has no login password", item.name),
        })
}
