// ── Core error types ──
//
// Domain-level errors for one instance pipeline. The
// `From<pihole_sync_api::Error>` impl translates transport-layer errors into
// these variants; nothing here escapes the orchestrator's instance boundary.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    /// A resource call was made without a session, which after
    /// `authenticate()` means the appliance rejected the login.
    #[error("Not authenticated with {instance} (authentication failed or was skipped)")]
    Unauthenticated { instance: String },

    #[error("{instance} uses Pi-hole API {version}, only v6 is supported")]
    UnsupportedApiVersion { instance: String, version: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out: {reason}")]
    Timeout { reason: String },

    // ── Appliance responses ──────────────────────────────────────────
    #[error("Unexpected response from {endpoint}")]
    MalformedResponse { endpoint: String },

    #[error("Pi-hole API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    #[error("Unable to add local DNS record '{host}': {reason}")]
    DnsHostRejected { host: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pihole_sync_api::Error> for CoreError {
    fn from(err: pihole_sync_api::Error) -> Self {
        use pihole_sync_api::Error as ApiError;

        match err {
            ApiError::MissingSession { instance } => CoreError::Unauthenticated { instance },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        reason: e.to_string(),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                status,
                key,
                message,
            } => CoreError::Api {
                message,
                code: Some(key),
                status: Some(status),
            },
            ApiError::MalformedResponse { endpoint, body: _ } => {
                CoreError::MalformedResponse { endpoint }
            }
            ApiError::DnsHostRejected { host, status, body } => CoreError::DnsHostRejected {
                host,
                reason: format!("HTTP {status}: {body}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
