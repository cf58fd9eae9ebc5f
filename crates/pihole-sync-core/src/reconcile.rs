// ── Reconciler ──
//
// Additive-only diff-and-apply against one authenticated client:
// fetch the remote set once, add whatever desired entry is missing, never
// touch entries that exist remotely but are not declared.
//
// Failure policy differs per resource kind. A rejected allow-list entry is
// recorded and the loop moves on. A failed DNS-host add is recorded, then
// ends that instance's DNS-host work with an error that still carries the
// partial result.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use pihole_sync_api::{AddOutcome, DnsHost, DomainKind, PiHoleClient};

use crate::error::CoreError;
use crate::model::{
    DesiredAllowEntry, DesiredDnsRecord, MatchKind, ReconciliationResult, ResourceKind,
};

/// DNS-host reconciliation that stopped early.
#[derive(Debug)]
pub struct DnsAbort {
    /// What was applied before the failure. `None` when the remote list
    /// could not be fetched.
    pub partial: Option<ReconciliationResult>,
    pub error: CoreError,
}

impl From<CoreError> for DnsAbort {
    fn from(error: CoreError) -> Self {
        Self {
            partial: None,
            error,
        }
    }
}

/// Applies desired state to one instance.
pub struct Reconciler<'a> {
    client: &'a PiHoleClient,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a PiHoleClient) -> Self {
        Self { client }
    }

    /// Make sure every desired allow-list entry exists.
    ///
    /// The remote list is fetched once per match kind that occurs in
    /// `desired`. Adds run sequentially; per-item failures never abort.
    pub async fn allow_list(
        &self,
        desired: &[DesiredAllowEntry],
    ) -> Result<ReconciliationResult, CoreError> {
        let mut result = ReconciliationResult::new(self.client.name(), ResourceKind::AllowList);
        if desired.is_empty() {
            return Ok(result);
        }

        info!("Syncing allow list...");

        let mut remote: HashMap<MatchKind, HashSet<String>> = HashMap::new();
        for entry in desired {
            if remote.contains_key(&entry.kind) {
                continue;
            }
            let entries = self.client.fetch_allow_list(entry.kind.into()).await?;
            info!("Fetched {} {} entries", entries.len(), entry.kind);
            remote.insert(
                entry.kind,
                entries.into_iter().map(|e| e.domain).collect(),
            );
        }

        for entry in desired {
            let present = remote.entry(entry.kind).or_default();

            if present.contains(&entry.domain) {
                info!("Domain {} is already in the allow list", entry.domain);
                result.already_present.push(entry.domain.clone());
                continue;
            }

            warn!(
                "Domain {} is not in the allow list, adding it now...",
                entry.domain
            );
            let kind: DomainKind = entry.kind.into();
            match self.client.add_allow_entry(&entry.domain, kind).await {
                Ok(AddOutcome::Added) => {
                    present.insert(entry.domain.clone());
                    result.added.push(entry.domain.clone());
                }
                Ok(AddOutcome::Rejected { reason }) => result.fail(&entry.domain, reason),
                Err(e) => result.fail(&entry.domain, CoreError::from(e).to_string()),
            }
        }

        info!(
            added = result.added.len(),
            present = result.already_present.len(),
            failed = result.failures.len(),
            "Allow list sync complete"
        );
        Ok(result)
    }

    /// Make sure every desired local DNS record exists.
    ///
    /// Membership is on the (domain, ip) pair. The first failed add is
    /// recorded in `failures` and stops the remaining DNS-host work.
    pub async fn dns_hosts(
        &self,
        desired: &[DesiredDnsRecord],
    ) -> Result<ReconciliationResult, DnsAbort> {
        let mut result = ReconciliationResult::new(self.client.name(), ResourceKind::DnsHosts);
        if desired.is_empty() {
            return Ok(result);
        }

        info!("Syncing local DNS records...");

        let mut remote: Vec<DnsHost> = self
            .client
            .fetch_dns_hosts()
            .await
            .map_err(CoreError::from)?;
        info!("Fetched {} local DNS records", remote.len());

        for record in desired {
            let label = format!("{} ({})", record.domain, record.ip);

            if remote.iter().any(|host| record.matches(host)) {
                info!("Local DNS record {label} already exists");
                result.already_present.push(label);
                continue;
            }

            warn!("Local DNS record {label} does not exist, adding it now...");
            let host = DnsHost::from(record);
            if let Err(e) = self.client.add_dns_host(&host).await {
                let error = CoreError::from(e);
                result.fail(&label, error.to_string());
                return Err(DnsAbort {
                    partial: Some(result),
                    error,
                });
            }
            remote.push(host);
            result.added.push(label);
        }

        info!(
            added = result.added.len(),
            present = result.already_present.len(),
            "Local DNS records sync complete"
        );
        Ok(result)
    }
}
