// ── Orchestrator ──
//
// One task per configured instance: authenticate, reconcile the allow list,
// reconcile DNS hosts, log out. Tasks run concurrently and share nothing
// mutable. Every error is caught at the instance boundary and folded into
// that instance's `InstanceReport`; siblings never see it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span};

use pihole_sync_api::PiHoleClient;

use crate::config::{ApiVersion, InstanceConfig};
use crate::error::CoreError;
use crate::model::{DesiredState, ReconciliationResult};
use crate::reconcile::Reconciler;

// ── Reports ─────────────────────────────────────────────────────────

/// Outcome of one instance's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceReport {
    pub instance: String,
    pub url: String,
    /// Results completed before any instance-level error.
    pub results: Vec<ReconciliationResult>,
    /// Instance-level error that stopped the pipeline, if any.
    pub error: Option<String>,
}

impl InstanceReport {
    fn new(config: &InstanceConfig) -> Self {
        Self {
            instance: config.name.clone(),
            url: config.url.to_string(),
            results: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated outcome of a sync run, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub instances: Vec<InstanceReport>,
}

impl SyncReport {
    pub fn failed_instances(&self) -> impl Iterator<Item = &InstanceReport> {
        self.instances.iter().filter(|r| !r.is_success())
    }

    /// `true` when every instance finished without an instance-level error.
    /// Per-item allow-list failures do not count.
    pub fn is_success(&self) -> bool {
        self.failed_instances().next().is_none()
    }
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Fans reconciliation out across all instances.
pub struct Orchestrator {
    instances: Vec<InstanceConfig>,
    desired: Arc<DesiredState>,
}

impl Orchestrator {
    pub fn new(instances: Vec<InstanceConfig>, desired: DesiredState) -> Self {
        Self {
            instances,
            desired: Arc::new(desired),
        }
    }

    /// Run every instance pipeline concurrently and wait for all of them.
    pub async fn run(self) -> SyncReport {
        if self.instances.is_empty() {
            error!("No Pi-hole instances found in the configuration");
            return SyncReport::default();
        }

        info!(
            "Found {} Pi-hole(s): {}",
            self.instances.len(),
            self.instances
                .iter()
                .map(|i| i.url.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut slots: Vec<Option<InstanceReport>> = vec![None; self.instances.len()];
        let mut fallback: Vec<InstanceReport> =
            self.instances.iter().map(InstanceReport::new).collect();
        let mut task_index = HashMap::new();
        let mut tasks = JoinSet::new();

        for (index, instance) in self.instances.into_iter().enumerate() {
            let desired = Arc::clone(&self.desired);
            let span = info_span!("instance", name = %instance.name);
            let handle = tasks.spawn(
                async move { (index, sync_instance(&instance, &desired).await) }.instrument(span),
            );
            task_index.insert(handle.id(), index);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (index, report))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(report);
                    }
                }
                Err(join_err) => {
                    // A panicked or cancelled pipeline: aggregation failure.
                    let Some(&index) = task_index.get(&join_err.id()) else {
                        error!(error = %join_err, "sync task failed");
                        continue;
                    };
                    if let Some(report) = fallback.get_mut(index) {
                        error!(
                            instance = %report.instance,
                            error = %join_err,
                            "Synchronization task for {} did not complete",
                            report.url
                        );
                        report.error = Some(format!("sync task failed: {join_err}"));
                    }
                }
            }
        }

        let instances = slots
            .into_iter()
            .zip(fallback)
            .map(|(slot, fallback)| slot.unwrap_or(fallback))
            .collect();
        let report = SyncReport { instances };

        let failed = report.failed_instances().count();
        if failed == 0 {
            info!("Synchronization completed successfully");
        } else {
            error!(
                "Synchronization finished with {failed} of {} instance(s) failing",
                report.instances.len()
            );
        }
        report
    }
}

/// One instance's full pipeline. Never fails: errors land in the report.
async fn sync_instance(config: &InstanceConfig, desired: &DesiredState) -> InstanceReport {
    let mut report = InstanceReport::new(config);

    let mut client = match connect(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Error synchronizing Pi-hole at {}: {e}", config.url);
            report.error = Some(e.to_string());
            return report;
        }
    };

    if let Err(e) = run_pipeline(&mut client, desired, &mut report).await {
        error!("Error synchronizing Pi-hole at {}: {e}", config.url);
        report.error = Some(e.to_string());
    }

    client.logout().await;
    report
}

fn connect(config: &InstanceConfig) -> Result<PiHoleClient, CoreError> {
    if config.api_version != ApiVersion::V6 {
        return Err(CoreError::UnsupportedApiVersion {
            instance: config.name.clone(),
            version: config.api_version.to_string(),
        });
    }
    let client = PiHoleClient::new(
        config.name.clone(),
        config.url.clone(),
        config.password.clone(),
        &config.transport(),
    )?;
    Ok(client)
}

async fn run_pipeline(
    client: &mut PiHoleClient,
    desired: &DesiredState,
    report: &mut InstanceReport,
) -> Result<(), CoreError> {
    client.authenticate().await?;
    if !client.is_authenticated() {
        return Err(CoreError::Unauthenticated {
            instance: client.name().to_owned(),
        });
    }

    let reconciler = Reconciler::new(client);
    report
        .results
        .push(reconciler.allow_list(&desired.allowed_domains).await?);
    match reconciler.dns_hosts(&desired.local_dns_records).await {
        Ok(result) => {
            report.results.push(result);
            Ok(())
        }
        Err(abort) => {
            if let Some(partial) = abort.partial {
                report.results.push(partial);
            }
            Err(abort.error)
        }
    }
}
