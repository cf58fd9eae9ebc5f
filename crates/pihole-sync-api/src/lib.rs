// pihole-sync-api: Async Rust client for the Pi-hole v6 REST API

pub mod auth;
pub mod client;
pub mod dns;
pub mod domains;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Session;
pub use client::PiHoleClient;
pub use error::Error;
pub use models::{AddOutcome, AllowEntry, DnsHost, DomainKind};
pub use transport::{TlsMode, TransportConfig};
