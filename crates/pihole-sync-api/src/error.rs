use thiserror::Error;

/// Top-level error type for the `pihole-sync-api` crate.
///
/// Covers every failure mode of a single Pi-hole instance: missing session,
/// transport, malformed payloads, and the appliance's own error envelope.
/// `pihole-sync-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// A resource call was attempted before a session was established.
    /// Raised before any request is built.
    #[error("No session for {instance} -- authenticate() must succeed first")]
    MissingSession { instance: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Pi-hole API ─────────────────────────────────────────────────
    /// Structured error from the appliance (`{"error": {"key", "message"}}`).
    #[error("Pi-hole API error (HTTP {status}) {key}: {message}")]
    Api {
        status: u16,
        key: String,
        message: String,
    },

    /// The payload does not match the documented shape (e.g. the list
    /// that should be an array is missing).
    #[error("Unexpected response from {endpoint}")]
    MalformedResponse { endpoint: String, body: String },

    /// A local DNS host was not created (anything other than 201).
    #[error("Unable to add local DNS record '{host}' (HTTP {status}): {body}")]
    DnsHostRejected {
        host: String,
        status: u16,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
