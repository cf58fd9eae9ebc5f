//! Configuration for pihole-sync.
//!
//! YAML config file, credential resolution (env + keyring + Bitwarden +
//! plaintext), and translation to `pihole_sync_core` instance configs and
//! desired state.

pub mod bitwarden;

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use pihole_sync_core::{
    ApiVersion, DesiredAllowEntry, DesiredDnsRecord, DesiredState, InstanceConfig,
    TlsVerification,
};

pub use bitwarden::BitwardenCli;

/// Keyring service name under which instance passwords are stored.
pub const KEYRING_SERVICE: &str = "pihole-sync";

/// Environment prefix for overrides, e.g. `PIHOLE_SYNC_SETTINGS__TIMEOUT`.
pub const ENV_PREFIX: &str = "PIHOLE_SYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for Pi-hole '{instance}'")]
    NoCredentials { instance: String },

    #[error("bitwarden lookup failed: {reason}")]
    Bitwarden { reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── YAML config structs ─────────────────────────────────────────────

/// Top-level YAML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,

    /// Target Pi-hole instances.
    #[serde(default)]
    pub pi_holes: Vec<PiHoleEntry>,

    /// Domains that must be allow-listed on every instance.
    #[serde(default)]
    pub allowed_domains: Vec<DesiredAllowEntry>,

    /// Local DNS records that must exist on every instance.
    #[serde(default)]
    pub local_dns_records: Vec<DesiredDnsRecord>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// PEM bundle trusted in addition to the system roots. Ignored when
    /// `insecure` is set.
    #[serde(default, alias = "ca_cert", skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// One configured Pi-hole.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PiHoleEntry {
    /// Base URL (e.g., "http://192.168.1.2").
    pub url: String,

    /// Display name; defaults to the URL.
    pub name: Option<String>,

    /// API generation, 5 or 6. Defaults to 6.
    pub version: Option<u8>,

    /// Password (plaintext, prefer one of the other sources).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Look the password up in the system keyring.
    #[serde(default)]
    pub password_keyring: bool,

    /// Bitwarden item whose login password is the Pi-hole password.
    pub bitwarden_item: Option<String>,
}

impl PiHoleEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` plus `PIHOLE_SYNC_*` environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(
        path = %path.display(),
        instances = config.pi_holes.len(),
        allowed_domains = config.allowed_domains.len(),
        local_dns_records = config.local_dns_records.len(),
        "configuration loaded"
    );
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an instance password from the credential chain.
///
/// Order: `password-env`, keyring (when `password-keyring` is set),
/// `bitwarden-item`, plaintext `password`. An unset env var or an empty
/// keyring slot falls through to the next source; a failing Bitwarden
/// lookup is an error.
pub fn resolve_password(
    entry: &PiHoleEntry,
    bitwarden: &BitwardenCli,
) -> Result<SecretString, ConfigError> {
    let name = entry.display_name();

    // 1. Env var
    if let Some(ref env_name) = entry.password_env {
        if let Ok(val) = std::env::var(env_name) {
            debug!("password for '{name}' from ${env_name}");
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if entry.password_keyring {
        if let Ok(slot) = keyring::Entry::new(KEYRING_SERVICE, name) {
            if let Ok(pw) = slot.get_password() {
                debug!("password for '{name}' from keyring");
                return Ok(SecretString::from(pw));
            }
        }
    }

    // 3. Bitwarden
    if let Some(ref item) = entry.bitwarden_item {
        let pw = bitwarden.password(item)?;
        debug!("password for '{name}' from bitwarden");
        return Ok(pw);
    }

    // 4. Plaintext in config
    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        instance: name.into(),
    })
}

// ── Translation to core types ───────────────────────────────────────

/// Everything one sync run needs.
#[derive(Debug)]
pub struct SyncPlan {
    pub instances: Vec<InstanceConfig>,
    pub desired: DesiredState,
}

impl Config {
    /// Validate every instance, resolve its password and build the plan.
    pub fn into_plan(self, bitwarden: &BitwardenCli) -> Result<SyncPlan, ConfigError> {
        let timeout = Duration::from_secs(self.settings.timeout);
        let tls = if self.settings.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.settings.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let instances = self
            .pi_holes
            .iter()
            .map(|entry| {
                let mut cfg = instance_config(entry, bitwarden)?;
                cfg.tls = tls.clone();
                cfg.timeout = timeout;
                Ok(cfg)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(SyncPlan {
            instances,
            desired: DesiredState {
                allowed_domains: self.allowed_domains,
                local_dns_records: self.local_dns_records,
            },
        })
    }
}

/// Build the core `InstanceConfig` for one entry.
pub fn instance_config(
    entry: &PiHoleEntry,
    bitwarden: &BitwardenCli,
) -> Result<InstanceConfig, ConfigError> {
    let url: url::Url = entry.url.parse().map_err(|e| ConfigError::Validation {
        field: "pi-holes.url".into(),
        reason: format!("'{}' is not a valid URL: {e}", entry.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "pi-holes.url".into(),
            reason: format!("'{}' must use http or https", entry.url),
        });
    }

    let api_version = match entry.version {
        None => ApiVersion::default(),
        Some(v) => ApiVersion::try_from(v).map_err(|v| ConfigError::Validation {
            field: "pi-holes.version".into(),
            reason: format!("expected 5 or 6, got {v}"),
        })?,
    };

    let password = resolve_password(entry, bitwarden)?;

    let mut cfg = InstanceConfig::new(url, password).with_name(entry.display_name());
    cfg.api_version = api_version;
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn entry(url: &str) -> PiHoleEntry {
        PiHoleEntry {
            url: url.into(),
            password: Some("pw".into()),
            ..PiHoleEntry::default()
        }
    }

    fn no_bitwarden() -> BitwardenCli {
        BitwardenCli::new("/nonexistent/bw-for-tests")
    }

    #[test]
    fn name_defaults_to_url() {
        let cfg = instance_config(&entry("http://192.168.1.2"), &no_bitwarden()).unwrap();
        assert_eq!(cfg.name, "http://192.168.1.2");
        assert_eq!(cfg.api_version, ApiVersion::V6);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut e = entry("http://pi.hole");
        e.version = Some(4);
        let err = instance_config(&e, &no_bitwarden()).unwrap_err();
        assert!(err.to_string().contains("expected 5 or 6, got 4"));
    }

    #[test]
    fn v5_is_accepted_at_load_time() {
        let mut e = entry("http://pi.hole");
        e.version = Some(5);
        let cfg = instance_config(&e, &no_bitwarden()).unwrap();
        assert_eq!(cfg.api_version, ApiVersion::V5);
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = instance_config(&entry("not a url"), &no_bitwarden()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        let err = instance_config(&entry("ftp://pi.hole"), &no_bitwarden()).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn missing_env_var_falls_through_to_plaintext() {
        let mut e = entry("http://pi.hole");
        e.password_env = Some("PIHOLE_SYNC_TEST_UNSET_VARIABLE_9F3A".into());
        let pw = resolve_password(&e, &no_bitwarden()).unwrap();
        assert_eq!(pw.expose_secret(), "pw");
    }

    #[test]
    fn bitwarden_failure_is_not_masked_by_plaintext() {
        let mut e = entry("http://pi.hole");
        e.bitwarden_item = Some("pihole".into());
        let err = resolve_password(&e, &no_bitwarden()).unwrap_err();
        assert!(matches!(err, ConfigError::Bitwarden { .. }));
    }

    #[test]
    fn no_source_is_no_credentials() {
        let e = PiHoleEntry {
            url: "http://pi.hole".into(),
            name: Some("primary".into()),
            ..PiHoleEntry::default()
        };
        let err = resolve_password(&e, &no_bitwarden()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no credentials configured for Pi-hole 'primary'"
        );
    }
}
