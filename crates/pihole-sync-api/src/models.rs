// Pi-hole v6 API response types
//
// Only the fields the sync engine reads are modelled explicitly. Fields use
// `#[serde(default)]` liberally because error payloads and older FTL builds
// omit or null out parts of the documented shape.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Authentication ───────────────────────────────────────────────────

/// Response of `POST /api/auth`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub session: SessionInfo,
    #[serde(default)]
    pub took: f64,
}

/// The `session` object. `valid == false` is a normal outcome (wrong
/// password, TOTP required), not a transport failure.
#[derive(Debug, Deserialize)]
pub struct SessionInfo {
    pub valid: bool,
    #[serde(default)]
    pub totp: bool,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub csrf: Option<String>,
    /// Seconds the session stays valid without activity.
    #[serde(default)]
    pub validity: i64,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Error envelope ───────────────────────────────────────────────────

/// `{"error": {"key": "...", "message": "...", "hint": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub message: String,
}

// ── Domains ──────────────────────────────────────────────────────────

/// Which allow list a domain lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    /// `/api/domains/allow/exact`
    Exact,
    /// `/api/domains/allow/regex`
    Regex,
}

impl DomainKind {
    /// The path segment used by the domains endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An allow-list entry as reported by the appliance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowEntry {
    pub domain: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub unicode: Option<String>,
    #[serde(default, rename = "type")]
    pub list_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub groups: Vec<u32>,
    #[serde(default)]
    pub date_added: Option<i64>,
    #[serde(default)]
    pub date_modified: Option<i64>,
}

/// Response of `POST /api/domains/allow/{kind}`.
#[derive(Debug, Deserialize)]
pub(crate) struct AddDomainResponse {
    #[serde(default)]
    pub processed: Option<Processed>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Processed {
    #[serde(default)]
    pub success: Vec<serde::de::IgnoredAny>,
    #[serde(default)]
    pub errors: Vec<ProcessedError>,
}

/// FTL reports per-item errors as `{item, error}`; older builds used bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProcessedError {
    Detailed { item: String, error: String },
    Message(String),
}

impl fmt::Display for ProcessedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detailed { item, error } => write!(f, "{item}: {error}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

/// Outcome of adding one allow-list entry.
///
/// A rejection is a value, not an error: one domain failing must not stop
/// the remaining ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Rejected { reason: String },
}

// ── DNS hosts ────────────────────────────────────────────────────────

/// A local DNS record in Pi-hole's `"<ip> <domain>"` wire format.
///
/// This is the only place that format is parsed or produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnsHost {
    pub ip: String,
    pub domain: String,
}

impl DnsHost {
    pub fn new(ip: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            domain: domain.into(),
        }
    }
}

impl FromStr for DnsHost {
    type Err = Infallible;

    /// `ip domain [alias...]`. Aliases are dropped. A line with no domain
    /// yields an empty one, which never matches a configured record.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let ip = fields.next().unwrap_or_default();
        let domain = fields.next().unwrap_or_default();
        Ok(Self::new(ip, domain))
    }
}

impl fmt::Display for DnsHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ip, self.domain)
    }
}
