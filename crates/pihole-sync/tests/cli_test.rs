//! Integration tests for the `pihole-sync` binary.
//!
//! Argument parsing, config errors and exit codes run without any network;
//! the sync tests drive the binary against wiremock Pi-holes.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the binary with env isolation.
fn pihole_sync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pihole-sync");
    cmd.env_remove("RUST_LOG")
        .env_remove("PIHOLE_SYNC_SETTINGS__TIMEOUT")
        .env_remove("PIHOLE_SYNC_SETTINGS__INSECURE")
        .env_remove("PIHOLE_SYNC_SETTINGS__CA_CERT")
        .env("NO_COLOR", "1");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run_sync(config: &NamedTempFile, extra: &[&str]) -> std::process::Output {
    let mut cmd = pihole_sync_cmd();
    cmd.arg("sync").arg("--config").arg(config.path()).args(extra);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mount_pihole(server: &MockServer, auth_valid: bool) {
    let (status, session) = if auth_valid {
        (200, json!({ "valid": true, "sid": "sid-1", "csrf": "csrf-1", "validity": 300 }))
    } else {
        (401, json!({ "valid": false, "sid": null, "validity": -1, "message": "password incorrect" }))
    };
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "session": session })))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/domains/allow/exact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "domains": [] })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/domains/allow/exact"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "processed": { "success": [{ "item": "ads.example.com" }], "errors": [] }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/config/dns/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": { "dns": { "hosts": ["192.168.1.10 nas.local"] } }
        })))
        .mount(server)
        .await;
}

fn sync_config(instances: &[(&str, &str)]) -> NamedTempFile {
    let mut yaml = String::from("pi-holes:\n");
    for (name, url) in instances {
        yaml.push_str(&format!("  - url: {url}\n    name: {name}\n    password: pw\n"));
    }
    yaml.push_str(
        "allowed-domains:\n  - domain: ads.example.com\n\
         local-dns-records:\n  - domain: nas.local\n    ip: 192.168.1.10\n",
    );
    write_config(&yaml)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = pihole_sync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    pihole_sync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Pi-hole")
            .and(predicate::str::contains("sync"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    pihole_sync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pihole-sync"));
}

#[test]
fn test_completions_bash() {
    pihole_sync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_sync_requires_config() {
    let output = pihole_sync_cmd().arg("sync").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--config"));
}

#[test]
fn test_invalid_output_format() {
    let output = pihole_sync_cmd()
        .args(["sync", "--config", "x.yaml", "--output", "xml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let output = pihole_sync_cmd()
        .arg("sync")
        .arg("--config")
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("not found"), "{text}");
}

#[test]
fn test_config_without_instances() {
    let file = write_config("allowed-domains:\n  - domain: ads.example.com\n");
    let output = pihole_sync_cmd()
        .arg("sync")
        .arg("--config")
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No Pi-hole instances configured"));
}

#[test]
fn test_instance_without_password() {
    let file = write_config("pi-holes:\n  - url: http://127.0.0.1:9\n    name: primary\n");
    let output = pihole_sync_cmd()
        .arg("sync")
        .arg("--config")
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No credentials configured for Pi-hole 'primary'"));
}

#[test]
fn test_invalid_timeout_override() {
    let file = write_config("pi-holes:\n  - url: http://127.0.0.1:9\n    password: pw\n");
    let output = pihole_sync_cmd()
        .env("PIHOLE_SYNC_SETTINGS__TIMEOUT", "soon")
        .arg("sync")
        .arg("--config")
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Sync against mocked Pi-holes ────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_success_json_report() {
    let server = MockServer::start().await;
    mount_pihole(&server, true).await;
    let config = sync_config(&[("primary", server.uri().as_str())]);

    let output = run_sync(&config, &["--output", "json"]).await;
    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        combined_output(&output)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let inst = &report["instances"][0];
    assert_eq!(inst["instance"], "primary");
    assert_eq!(inst["error"], serde_json::Value::Null);
    assert_eq!(inst["results"][0]["added"], json!(["ads.example.com"]));
    assert_eq!(
        inst["results"][1]["already_present"],
        json!(["nas.local (192.168.1.10)"])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_one_failing_instance_exits_1() {
    let bad = MockServer::start().await;
    mount_pihole(&bad, false).await;
    let good = MockServer::start().await;
    mount_pihole(&good, true).await;
    let config = sync_config(&[("bad", bad.uri().as_str()), ("good", good.uri().as_str())]);

    let output = run_sync(&config, &[]).await;
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("good"), "{stdout}");
    assert!(stdout.contains("Problems:"), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 2 Pi-hole instance(s) failed"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_quiet_suppresses_report() {
    let server = MockServer::start().await;
    mount_pihole(&server, true).await;
    let config = sync_config(&[("primary", server.uri().as_str())]);

    let output = run_sync(&config, &["--quiet"]).await;
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreadable_ca_bundle_fails_the_instance() {
    let server = MockServer::start().await;
    mount_pihole(&server, true).await;
    let dir = tempfile::tempdir().unwrap();
    let ca = dir.path().join("missing-ca.pem");
    let config = write_config(&format!(
        "settings:\n  ca-cert: {}\npi-holes:\n  - url: {}\n    name: primary\n    password: pw\n",
        ca.display(),
        server.uri()
    ));

    let output = run_sync(&config, &[]).await;
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("missing-ca.pem"), "{text}");
}
