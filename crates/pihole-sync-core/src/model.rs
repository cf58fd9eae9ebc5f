// ── Domain model ──
//
// Desired state as declared in configuration, and the per-run results the
// reconciler produces. Remote-side types (`AllowEntry`, `DnsHost`) come from
// the api crate.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use pihole_sync_api::{DnsHost, DomainKind};

/// How an allow-list domain is matched by the appliance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchKind {
    #[default]
    ExactAllow,
    RegexAllow,
}

impl From<MatchKind> for DomainKind {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::ExactAllow => Self::Exact,
            MatchKind::RegexAllow => Self::Regex,
        }
    }
}

/// A domain that must be present in an allow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredAllowEntry {
    pub domain: String,
    #[serde(default, rename = "type")]
    pub kind: MatchKind,
}

impl DesiredAllowEntry {
    pub fn exact(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            kind: MatchKind::ExactAllow,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            domain: pattern.into(),
            kind: MatchKind::RegexAllow,
        }
    }
}

/// A local DNS record that must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredDnsRecord {
    pub domain: String,
    pub ip: String,
}

impl DesiredDnsRecord {
    pub fn new(domain: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ip: ip.into(),
        }
    }

    /// Equality against a remote host is on the (domain, ip) pair.
    pub fn matches(&self, host: &DnsHost) -> bool {
        self.domain == host.domain && self.ip == host.ip
    }
}

impl From<&DesiredDnsRecord> for DnsHost {
    fn from(record: &DesiredDnsRecord) -> Self {
        Self::new(record.ip.clone(), record.domain.clone())
    }
}

/// Everything the configuration wants present on every instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub allowed_domains: Vec<DesiredAllowEntry>,
    pub local_dns_records: Vec<DesiredDnsRecord>,
}

// ── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    AllowList,
    DnsHosts,
}

/// One item that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

/// Outcome of reconciling one resource kind on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub instance: String,
    pub kind: ResourceKind,
    pub added: Vec<String>,
    pub already_present: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl ReconciliationResult {
    pub fn new(instance: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            instance: instance.into(),
            kind,
            added: Vec::new(),
            already_present: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(ItemFailure {
            item: item.into(),
            reason: reason.into(),
        });
    }
}
