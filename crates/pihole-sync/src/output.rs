//! Sync report rendering: table, JSON, YAML.
//!
//! Table output is one row per instance and resource kind, followed by the
//! individual item failures. Structured formats serialize the whole
//! `SyncReport` via serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use pihole_sync_core::{InstanceReport, ReconciliationResult, SyncReport};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// Determine whether color output should be enabled for a stream.
pub fn should_color(mode: &ColorMode, is_terminal: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_terminal && std::env::var_os("NO_COLOR").is_none(),
    }
}

pub fn stdout_is_terminal() -> bool {
    io::stdout().is_terminal()
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Present")]
    present: String,
    #[tabled(rename = "Failed")]
    failed: String,
    #[tabled(rename = "Status")]
    status: String,
}

enum Status {
    Ok,
    Partial,
    Failed,
}

impl Status {
    fn paint(&self, color: bool) -> String {
        let label = match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        if !color {
            return label.to_owned();
        }
        match self {
            Self::Ok => label.green().to_string(),
            Self::Partial => label.yellow().to_string(),
            Self::Failed => label.red().bold().to_string(),
        }
    }
}

fn result_row(result: &ReconciliationResult, color: bool) -> ReportRow {
    let status = if result.is_clean() {
        Status::Ok
    } else {
        Status::Partial
    };
    ReportRow {
        instance: result.instance.clone(),
        resource: result.kind.to_string(),
        added: result.added.len().to_string(),
        present: result.already_present.len().to_string(),
        failed: result.failures.len().to_string(),
        status: status.paint(color),
    }
}

fn instance_rows(report: &InstanceReport, color: bool) -> Vec<ReportRow> {
    let mut rows: Vec<_> = report
        .results
        .iter()
        .map(|r| result_row(r, color))
        .collect();

    if report.error.is_some() {
        rows.push(ReportRow {
            instance: report.instance.clone(),
            resource: "-".into(),
            added: "-".into(),
            present: "-".into(),
            failed: "-".into(),
            status: Status::Failed.paint(color),
        });
    }
    rows
}

// ── Renderers ────────────────────────────────────────────────────────

/// Render the report in the chosen format.
pub fn render_report(
    format: &OutputFormat,
    report: &SyncReport,
    color: bool,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => render_table(report, color),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
    })
}

fn render_table(report: &SyncReport, color: bool) -> String {
    let rows: Vec<ReportRow> = report
        .instances
        .iter()
        .flat_map(|r| instance_rows(r, color))
        .collect();
    let mut out = Table::new(rows).with(Style::rounded()).to_string();

    let mut problems = Vec::new();
    for inst in &report.instances {
        for result in &inst.results {
            for failure in &result.failures {
                problems.push(format!(
                    "  {} {}: {}: {}",
                    inst.instance, result.kind, failure.item, failure.reason
                ));
            }
        }
        if let Some(ref error) = inst.error {
            problems.push(format!("  {}: {error}", inst.instance));
        }
    }
    if !problems.is_empty() {
        out.push_str("\n\nProblems:\n");
        out.push_str(&problems.join("\n"));
    }
    out
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) -> Result<(), CliError> {
    if quiet || output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pihole_sync_core::{ItemFailure, ResourceKind};

    use super::*;

    fn sample() -> SyncReport {
        let mut allow = ReconciliationResult::new("primary", ResourceKind::AllowList);
        allow.added.push("ads.example.com".into());
        allow.failures.push(ItemFailure {
            item: "bad..domain".into(),
            reason: "Invalid domain".into(),
        });
        let dns = ReconciliationResult::new("primary", ResourceKind::DnsHosts);

        SyncReport {
            instances: vec![
                InstanceReport {
                    instance: "primary".into(),
                    url: "http://192.168.1.2/".into(),
                    results: vec![allow, dns],
                    error: None,
                },
                InstanceReport {
                    instance: "secondary".into(),
                    url: "http://192.168.1.3/".into(),
                    results: Vec::new(),
                    error: Some("Not authenticated with secondary".into()),
                },
            ],
        }
    }

    #[test]
    fn table_lists_rows_and_problems() {
        let out = render_report(&OutputFormat::Table, &sample(), false).unwrap();
        assert!(out.contains("allow-list"));
        assert!(out.contains("dns-hosts"));
        assert!(out.contains("partial"));
        assert!(out.contains("failed"));
        assert!(out.contains("primary allow-list: bad..domain: Invalid domain"));
        assert!(out.contains("secondary: Not authenticated with secondary"));
    }

    #[test]
    fn table_without_color_has_no_escapes() {
        let out = render_report(&OutputFormat::Table, &sample(), false).unwrap();
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn json_serializes_full_report() {
        let out = render_report(&OutputFormat::Json, &sample(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["instances"][0]["results"][0]["kind"], "allow-list");
        assert_eq!(value["instances"][1]["error"], "Not authenticated with secondary");
    }

    #[test]
    fn color_modes() {
        assert!(should_color(&ColorMode::Always, false));
        assert!(!should_color(&ColorMode::Never, true));
        assert!(!should_color(&ColorMode::Auto, false));
    }
}
