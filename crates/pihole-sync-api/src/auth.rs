// Session authentication
//
// `POST /api/auth` exchanges the instance password for a session id and
// CSRF token. Both ride along as headers on every later request. A rejected
// login is logged and leaves the client without a session; it is not an
// error, so callers observe it through `Error::MissingSession` on their
// next call.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, error, info};

use crate::client::{PiHoleClient, api_error};
use crate::error::Error;
use crate::models::AuthResponse;

/// An authenticated Pi-hole session. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    sid: SecretString,
    csrf: String,
}

impl Session {
    pub fn new(sid: SecretString, csrf: String) -> Self {
        Self { sid, csrf }
    }

    pub fn sid(&self) -> &SecretString {
        &self.sid
    }

    pub fn csrf(&self) -> &str {
        &self.csrf
    }
}

impl PiHoleClient {
    /// Authenticate with the instance password.
    ///
    /// One attempt, no retry. On success the session is stored on the
    /// client. When the appliance answers `valid: false` (wrong password,
    /// 2FA required) the reason is logged and `Ok(())` is returned with no
    /// session held. Transport failures and unparseable bodies are errors.
    pub async fn authenticate(&mut self) -> Result<(), Error> {
        let url = self.api_url(&["auth"])?;
        debug!("authenticating at {}", url);

        let body = json!({ "password": self.password().expose_secret() });
        let resp = self.http().post(url).json(&body).send().await?;

        // A wrong password comes back as 401 with a regular session body,
        // so the body is parsed regardless of status.
        let status = resp.status();
        let text = resp.text().await?;

        let parsed: AuthResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(api_error(status, &text).unwrap_or(Error::Deserialization {
                    message: format!("{e} (auth, HTTP {status})"),
                    body: text,
                }));
            }
        };

        self.session = None;
        let session = parsed.session;

        if !session.valid {
            let reason = session
                .message
                .unwrap_or_else(|| "no reason given".into());
            error!(
                instance = %self.name(),
                "Authentication failed for {}: {reason}",
                self.base_url()
            );
            return Ok(());
        }

        let sid = match session.sid {
            Some(sid) if !sid.is_empty() => sid,
            _ => {
                error!(
                    instance = %self.name(),
                    "Authentication for {} returned no session id",
                    self.base_url()
                );
                return Ok(());
            }
        };

        debug!("session valid for {}s", session.validity);
        self.session = Some(Session::new(
            SecretString::from(sid),
            session.csrf.unwrap_or_default(),
        ));

        info!(
            instance = %self.name(),
            "Authenticated successfully for {}",
            self.base_url()
        );
        Ok(())
    }

    /// End the current session (`DELETE /api/auth`).
    ///
    /// Best-effort: the local session is dropped regardless of the outcome,
    /// and failures are only logged at debug level. No-op without a session.
    pub async fn logout(&mut self) {
        if self.session.is_none() {
            return;
        }

        let result = match self.api_url(&["auth"]) {
            Ok(url) => self.delete(url).await.map(|resp| resp.status()),
            Err(e) => Err(e),
        };

        match result {
            Ok(status) if status.is_success() => debug!("session closed"),
            Ok(status) => debug!(%status, "logout returned non-success status"),
            Err(e) => debug!(error = %e, "logout failed"),
        }

        self.session = None;
    }
}
