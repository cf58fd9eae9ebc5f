// Allow-list endpoints
//
// `GET  /api/domains/allow/{exact|regex}` lists entries.
// `POST /api/domains/allow/{exact|regex}` adds one; per-item failures come
// back in `processed.errors` and are returned as `AddOutcome::Rejected`.

use chrono::Local;
use serde_json::json;
use tracing::{debug, error, info};

use crate::client::{PiHoleClient, api_error};
use crate::error::Error;
use crate::models::{AddDomainResponse, AddOutcome, AllowEntry, DomainKind};

impl PiHoleClient {
    /// List the allow-list entries of the given kind.
    ///
    /// Fails with [`Error::MalformedResponse`] when `domains` is not an
    /// array, which is how the appliance disguises some errors as 200 OK.
    pub async fn fetch_allow_list(&self, kind: DomainKind) -> Result<Vec<AllowEntry>, Error> {
        let url = self.api_url(&["domains", "allow", kind.as_str()])?;
        let endpoint = url.path().to_owned();
        let mut body = self.get_json(url).await?;

        if !body.get("domains").is_some_and(serde_json::Value::is_array) {
            return Err(malformed(self.name(), endpoint, &body));
        }
        let domains = body
            .get_mut("domains")
            .map(serde_json::Value::take)
            .unwrap_or_default();

        let entries: Vec<AllowEntry> =
            serde_json::from_value(domains).map_err(|e| Error::Deserialization {
                message: format!("{e} (from {endpoint})"),
                body: body.to_string(),
            })?;

        debug!(
            count = entries.len(),
            took = body.get("took").and_then(serde_json::Value::as_f64),
            "fetched {kind} allow list"
        );
        Ok(entries)
    }

    /// Add one domain to the allow list of the given kind.
    ///
    /// Success means exactly one processed success item. Anything else is
    /// logged and returned as [`AddOutcome::Rejected`]; only transport and
    /// session problems are errors.
    pub async fn add_allow_entry(
        &self,
        domain: &str,
        kind: DomainKind,
    ) -> Result<AddOutcome, Error> {
        let url = self.api_url(&["domains", "allow", kind.as_str()])?;
        let comment = format!(
            "Added by pihole-sync on {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let payload = json!({
            "domain": domain,
            "comment": comment,
            "enabled": true,
        });

        let resp = self.post_json(url, &payload).await?;
        let status = resp.status();
        let text = resp.text().await?;

        let outcome = match serde_json::from_str::<AddDomainResponse>(&text) {
            Ok(AddDomainResponse {
                processed: Some(processed),
            }) => {
                if processed.success.len() == 1 && processed.errors.is_empty() {
                    AddOutcome::Added
                } else if processed.errors.is_empty() {
                    AddOutcome::Rejected {
                        reason: format!("{} items reported as added", processed.success.len()),
                    }
                } else {
                    AddOutcome::Rejected {
                        reason: processed
                            .errors
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", "),
                    }
                }
            }
            _ => AddOutcome::Rejected {
                reason: match api_error(status, &text) {
                    Some(err) => err.to_string(),
                    None => format!("unexpected response (HTTP {status})"),
                },
            },
        };

        match &outcome {
            AddOutcome::Added => info!(
                instance = %self.name(),
                "Domain {domain} added successfully to allowed domains"
            ),
            AddOutcome::Rejected { reason } => error!(
                instance = %self.name(),
                "Failed to add domain {domain} to allowed domains: {reason}"
            ),
        }
        Ok(outcome)
    }
}

pub(crate) fn malformed(instance: &str, endpoint: String, body: &serde_json::Value) -> Error {
    let body = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    error!(instance, "Unexpected response from {endpoint}: {body}");
    Error::MalformedResponse { endpoint, body }
}
