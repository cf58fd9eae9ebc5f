//! `pihole-sync sync`: load the config, reconcile every instance, report.

use tracing::{debug, info};

use pihole_sync_config::{BitwardenCli, load_config};
use pihole_sync_core::Orchestrator;

use crate::cli::{GlobalOpts, SyncArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    info!("Using config file {}", args.config.display());

    let config = load_config(&args.config)?;
    if config.pi_holes.is_empty() {
        return Err(CliError::NoInstances {
            path: args.config.display().to_string(),
        });
    }

    let plan = config.into_plan(&BitwardenCli::default())?;
    debug!(
        instances = plan.instances.len(),
        allowed_domains = plan.desired.allowed_domains.len(),
        local_dns_records = plan.desired.local_dns_records.len(),
        "starting sync"
    );

    let report = Orchestrator::new(plan.instances, plan.desired).run().await;

    let color = output::should_color(&global.color, output::stdout_is_terminal());
    let rendered = output::render_report(&args.output, &report, color)?;
    output::print_output(&rendered, global.quiet)?;

    let failed = report.failed_instances().count();
    if failed > 0 {
        return Err(CliError::SyncFailed {
            failed,
            total: report.instances.len(),
        });
    }
    Ok(())
}
