// Pi-hole API HTTP client
//
// Wraps `reqwest::Client` with Pi-hole URL construction, session header
// injection, and error-envelope parsing. Endpoint groups (auth, domains,
// DNS hosts) are implemented as inherent methods in sibling modules to keep
// this module focused on transport mechanics.

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::error::Error;
use crate::models::ErrorEnvelope;
use crate::transport::TransportConfig;

/// Header carrying the session id.
const SID_HEADER: &str = "X-FTL-SID";
/// Header carrying the CSRF token.
const CSRF_HEADER: &str = "X-FTL-CSRF";

/// Raw HTTP client for one Pi-hole instance.
///
/// Owns its [`Session`] exclusively. Every method other than
/// [`authenticate`](Self::authenticate) refuses to build a request while no
/// session is held and returns [`Error::MissingSession`] instead.
pub struct PiHoleClient {
    http: reqwest::Client,
    base_url: Url,
    name: String,
    password: SecretString,
    pub(crate) session: Option<Session>,
}

impl PiHoleClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the appliance root (e.g. `http://192.168.1.2`); the
    /// `/api/...` paths are appended to it.
    pub fn new(
        name: impl Into<String>,
        base_url: Url,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, name, base_url, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        name: impl Into<String>,
        base_url: Url,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            name: name.into(),
            password,
            session: None,
        }
    }

    /// Display name of the instance (used in logs and reports).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`. Each segment is percent-encoded,
    /// so `"192.168.1.10 nas.local"` becomes `192.168.1.10%20nas.local`.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    // ── Session guard ────────────────────────────────────────────────

    fn require_session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or_else(|| Error::MissingSession {
            instance: self.name.clone(),
        })
    }

    /// Attach the session headers. Fails before any I/O when unauthenticated.
    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let session = self.require_session()?;
        Ok(builder
            .header(SID_HEADER, session.sid().expose_secret())
            .header(CSRF_HEADER, session.csrf()))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET, returning the parsed JSON body of a 2xx response.
    pub(crate) async fn get_json(&self, url: Url) -> Result<serde_json::Value, Error> {
        debug!("GET {}", url);
        let builder = self.authorize(self.http.get(url.clone()))?;
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body).unwrap_or(Error::MalformedResponse {
                endpoint: url.path().to_owned(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (from {})", url.path()),
            body,
        })
    }

    /// Authenticated POST with a JSON body. The response is returned as-is
    /// because some endpoints report per-item failures in 4xx bodies.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Response, Error> {
        debug!("POST {}", url);
        let builder = self.authorize(self.http.post(url).json(body))?;
        Ok(builder.send().await?)
    }

    /// Authenticated PUT without a body.
    pub(crate) async fn put(&self, url: Url) -> Result<Response, Error> {
        debug!("PUT {}", url);
        let builder = self.authorize(self.http.put(url))?;
        Ok(builder.send().await?)
    }

    /// Authenticated DELETE.
    pub(crate) async fn delete(&self, url: Url) -> Result<Response, Error> {
        debug!("DELETE {}", url);
        let builder = self.authorize(self.http.delete(url))?;
        Ok(builder.send().await?)
    }
}

/// Parse Pi-hole's `{"error": {...}}` envelope into [`Error::Api`].
pub(crate) fn api_error(status: StatusCode, body: &str) -> Option<Error> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    Some(Error::Api {
        status: status.as_u16(),
        key: envelope.error.key,
        message: envelope.error.message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> PiHoleClient {
        PiHoleClient::with_client(
            reqwest::Client::new(),
            "test",
            Url::parse(base).unwrap(),
            SecretString::from("secret"),
        )
    }

    #[test]
    fn api_url_appends_to_root() {
        let c = client("http://pi.hole");
        let url = c.api_url(&["domains", "allow", "exact"]).unwrap();
        assert_eq!(url.as_str(), "http://pi.hole/api/domains/allow/exact");
    }

    #[test]
    fn api_url_keeps_base_path_prefix() {
        let c = client("https://proxy.lan/pihole/");
        let url = c.api_url(&["auth"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.lan/pihole/api/auth");
    }

    #[test]
    fn api_url_encodes_host_pair() {
        let c = client("http://pi.hole");
        let url = c
            .api_url(&["config", "dns", "hosts", "192.168.1.10 nas.local"])
            .unwrap();
        assert_eq!(
            url.path(),
            "/api/config/dns/hosts/192.168.1.10%20nas.local"
        );
    }

    #[test]
    fn error_envelope_maps_to_api_error() {
        let body = r#"{"error":{"key":"unauthorized","message":"Unauthorized","hint":null}}"#;
        let err = api_error(StatusCode::UNAUTHORIZED, body).unwrap();
        match err {
            Error::Api {
                status,
                key,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(key, "unauthorized");
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn non_envelope_body_is_not_an_api_error() {
        assert!(api_error(StatusCode::OK, r#"{"domains":[]}"#).is_none());
    }
}
