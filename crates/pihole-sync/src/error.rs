//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` variants into user-facing errors with actionable help
//! text. Per-instance sync errors never reach this type individually; they
//! are logged by the orchestrator and summarized by `SyncFailed`.

use miette::Diagnostic;
use thiserror::Error;

use pihole_sync_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    /// At least one instance failed to synchronize.
    pub const SYNC_FAILED: i32 = 1;
    /// Bad invocation or unusable configuration.
    pub const USAGE: i32 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(pihole_sync::no_config),
        help("Pass the path of an existing YAML file with --config.")
    )]
    NoConfig { path: String },

    #[error("No Pi-hole instances configured in {path}")]
    #[diagnostic(
        code(pihole_sync::no_instances),
        help("Add at least one entry under `pi-holes:`, each with a `url` and a password source.")
    )]
    NoInstances { path: String },

    #[error("No credentials configured for Pi-hole '{instance}'")]
    #[diagnostic(
        code(pihole_sync::no_credentials),
        help(
            "Set one of `password`, `password-env`, `password-keyring` or \
             `bitwarden-item` for this entry."
        )
    )]
    NoCredentials { instance: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pihole_sync::validation))]
    Validation { field: String, reason: String },

    #[error("Bitwarden lookup failed: {reason}")]
    #[diagnostic(
        code(pihole_sync::bitwarden),
        help("Make sure `bw` is installed, logged in and unlocked (export BW_SESSION).")
    )]
    Bitwarden { reason: String },

    #[error(transparent)]
    #[diagnostic(code(pihole_sync::config))]
    Config(Box<figment::Error>),

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("{failed} of {total} Pi-hole instance(s) failed to synchronize")]
    #[diagnostic(
        code(pihole_sync::sync_failed),
        help("See the log above for the error reported by each failing instance.")
    )]
    SyncFailed { failed: usize, total: usize },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON report: {0}")]
    #[diagnostic(code(pihole_sync::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML report: {0}")]
    #[diagnostic(code(pihole_sync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SyncFailed { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => {
                exit_code::SYNC_FAILED
            }
            Self::NoConfig { .. }
            | Self::NoInstances { .. }
            | Self::NoCredentials { .. }
            | Self::Validation { .. }
            | Self::Bitwarden { .. }
            | Self::Config(_) => exit_code::USAGE,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { instance } => CliError::NoCredentials { instance },
            ConfigError::Bitwarden { reason } => CliError::Bitwarden { reason },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}
