// ── Runtime instance configuration ──
//
// These types describe *how* to reach one Pi-hole instance. They carry
// credential data and connection tuning, but never touch disk. The config
// crate builds an `InstanceConfig` per configured instance and hands it in.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use pihole_sync_api::{TlsMode, TransportConfig};

/// Pi-hole API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Pi-hole v5 (`/admin/api.php`). Not supported by the client.
    V5,
    /// Pi-hole v6 REST API.
    #[default]
    V6,
}

impl ApiVersion {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::V5 => 5,
            Self::V6 => 6,
        }
    }
}

impl TryFrom<u8> for ApiVersion {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::V5),
            6 => Ok(Self::V6),
            other => Err(other),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one Pi-hole instance.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Display name used in logs and reports. Falls back to the URL.
    pub name: String,
    /// Appliance URL (e.g. `http://192.168.1.2`).
    pub url: Url,
    /// Web interface / API password.
    pub password: SecretString,
    pub api_version: ApiVersion,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl InstanceConfig {
    /// Minimal config with defaults; the name is the URL.
    pub fn new(url: Url, password: SecretString) -> Self {
        Self {
            name: url.to_string(),
            url,
            password,
            api_version: ApiVersion::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Transport settings for this instance's HTTP client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_url() {
        let cfg = InstanceConfig::new(
            "http://192.168.1.2".parse().unwrap(),
            SecretString::from("pw"),
        );
        assert_eq!(cfg.name, "http://192.168.1.2/");
        assert_eq!(cfg.with_name("primary").name, "primary");
    }

    #[test]
    fn api_version_from_number() {
        assert_eq!(ApiVersion::try_from(6), Ok(ApiVersion::V6));
        assert_eq!(ApiVersion::try_from(5), Ok(ApiVersion::V5));
        assert_eq!(ApiVersion::try_from(4), Err(4));
        assert_eq!(ApiVersion::V6.to_string(), "v6");
    }

    #[test]
    fn insecure_tls_maps_to_transport() {
        let mut cfg = InstanceConfig::new(
            "https://pi.hole".parse().unwrap(),
            SecretString::from("pw"),
        );
        cfg.tls = TlsVerification::DangerAcceptInvalid;
        cfg.timeout = Duration::from_secs(5);
        let transport = cfg.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }
}
