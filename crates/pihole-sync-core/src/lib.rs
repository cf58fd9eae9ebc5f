//! Reconciliation engine between `pihole-sync-api` and the CLI.
//!
//! This crate owns the domain model and the sync logic:
//!
//! - **[`Reconciler`]** brings one authenticated instance in line with the
//!   desired state. It is additive only: missing allow-list entries and
//!   local DNS records are added, nothing is ever removed or modified.
//!
//! - **[`Orchestrator`]** runs one pipeline per configured instance
//!   concurrently (authenticate, allow list, DNS hosts, logout) and folds
//!   every outcome into a [`SyncReport`]. A failing instance never affects
//!   its siblings.
//!
//! - **Domain model** ([`model`]) holds the desired-state types read from
//!   configuration and the per-run [`ReconciliationResult`].

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ApiVersion, InstanceConfig, TlsVerification};
pub use error::CoreError;
pub use model::{
    DesiredAllowEntry, DesiredDnsRecord, DesiredState, ItemFailure, MatchKind,
    ReconciliationResult, ResourceKind,
};
pub use orchestrator::{InstanceReport, Orchestrator, SyncReport};
pub use reconcile::{DnsAbort, Reconciler};
