// Local DNS host endpoints
//
// `GET /api/config/dns/hosts` returns `{config: {dns: {hosts: [...]}}}` with
// each entry formatted as `"<ip> <domain>"`. `PUT` on the encoded pair
// creates the record and answers 201 Created.

use reqwest::StatusCode;
use tracing::{debug, error, info};

use crate::client::PiHoleClient;
use crate::domains::malformed;
use crate::error::Error;
use crate::models::DnsHost;

impl PiHoleClient {
    /// List the local DNS records.
    ///
    /// Fails the whole fetch with [`Error::MalformedResponse`] if the host
    /// list is missing or not an array.
    pub async fn fetch_dns_hosts(&self) -> Result<Vec<DnsHost>, Error> {
        let url = self.api_url(&["config", "dns", "hosts"])?;
        let endpoint = url.path().to_owned();
        let body = self.get_json(url).await?;

        let Some(hosts) = body
            .pointer("/config/dns/hosts")
            .and_then(serde_json::Value::as_array)
        else {
            return Err(malformed(self.name(), endpoint, &body));
        };

        let mut parsed = Vec::with_capacity(hosts.len());
        for host in hosts {
            let Some(line) = host.as_str() else {
                return Err(malformed(self.name(), endpoint, &body));
            };
            let Ok(host) = line.parse::<DnsHost>();
            parsed.push(host);
        }

        debug!(
            count = parsed.len(),
            took = body.get("took").and_then(serde_json::Value::as_f64),
            "fetched local DNS records"
        );
        Ok(parsed)
    }

    /// Create a local DNS record.
    ///
    /// Idempotent upsert keyed by the encoded `"<ip> <domain>"` pair. Any
    /// status other than 201 is returned as [`Error::DnsHostRejected`].
    pub async fn add_dns_host(&self, host: &DnsHost) -> Result<(), Error> {
        let entry = host.to_string();
        let url = self.api_url(&["config", "dns", "hosts", &entry])?;

        let resp = self.put(url).await?;
        let status = resp.status();

        if status == StatusCode::CREATED {
            info!(
                instance = %self.name(),
                "Local DNS record {}:{} added successfully to DNS hosts",
                host.domain,
                host.ip
            );
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        error!(
            instance = %self.name(),
            "Unable to add local DNS record {entry}: {body}"
        );
        Err(Error::DnsHostRejected {
            host: entry,
            status: status.as_u16(),
            body,
        })
    }
}
