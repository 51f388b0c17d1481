//! HTTP client for the Skoola backend.
//!
//! The backend contract is external; the client's obligations here are
//! narrow: normalize the configured base URL, attach the active identity's
//! bearer token to authenticated calls, and map non-2xx responses into
//! [`ApiError::Status`] with whatever message the server supplied. Retry
//! behavior is whatever reqwest does by default — none is added.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::session::{IdentityRecord, SessionStore, UserProfile};

/// Failures surfaced to the invoking UI region.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no active identity; sign in first")]
    Unauthenticated,
    #[error("api returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("base url must use http:// or https:// and include a host, got `{0}`")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserProfile,
}

/// Error body shape the backend uses for non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client over the Skoola REST API, bound to a session store for
/// credential lookup.
pub struct SkoolaApi {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
}

impl SkoolaApi {
    pub fn new(config: &ApiConfig, store: Arc<SessionStore>) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            store,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<IdentityRecord, ApiError> {
        self.store.active_identity().ok_or(ApiError::Unauthenticated)
    }

    /// Exchange credentials for a fresh identity record. Does not touch the
    /// session store; the caller decides whether to add and activate it.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityRecord, ApiError> {
        let email = email.trim().to_lowercase();
        let response = self
            .http
            .post(self.endpoint("/auth/login"))
            .json(&LoginRequest {
                email: &email,
                password,
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: LoginResponse = response.json().await?;

        tracing::info!(user_id = %body.user.id, "signed in");
        Ok(IdentityRecord {
            user_id: body.user.id.clone(),
            token: body.token,
            refresh_token: body.refresh_token,
            expires_at: body.expires_at,
            user: body.user,
        })
    }

    /// Profile of the active identity, as the server currently sees it.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let identity = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint("/users/me"))
            .bearer_auth(&identity.token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Invalidate one credential server-side. The local record is the
    /// caller's to remove.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.endpoint("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Trim whitespace and trailing slashes; require an http(s) scheme and host.
fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let remainder = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match remainder {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(trimmed.to_string()),
        _ => Err(ApiError::InvalidBaseUrl(raw.trim().to_string())),
    }
}

/// Map non-2xx responses to [`ApiError::Status`], consuming the body for
/// the server's message when it parses.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(status.as_u16(), &body),
    })
}

fn error_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| format!("http status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_trims_and_drops_trailing_slash() {
        let normalized = normalize_base_url(" https://api.skoola.app/ ").unwrap();
        assert_eq!(normalized, "https://api.skoola.app");
    }

    #[test]
    fn normalize_base_url_requires_scheme_and_host() {
        assert!(matches!(
            normalize_base_url("api.skoola.app"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("https:///path-only"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("   "),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn error_message_prefers_server_message_field() {
        let msg = error_message(403, r#"{"message":"insufficient permissions"}"#);
        assert_eq!(msg, "insufficient permissions");

        let msg = error_message(404, r#"{"error":"term not found"}"#);
        assert_eq!(msg, "term not found");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "http status 502");
        assert_eq!(error_message(500, ""), "http status 500");
    }

    #[test]
    fn login_response_tolerates_missing_optional_fields() {
        let body = r#"{"token":"tok","user":{"id":"u1","email":"u1@school.test"}}"#;
        let parsed: LoginResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.token, "tok");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_at.is_none());
        assert_eq!(parsed.user.id, "u1");
    }

    #[test]
    fn unauthenticated_when_no_active_identity() {
        use crate::session::MemoryStateStore;

        let store = Arc::new(SessionStore::open(Arc::new(MemoryStateStore::default())));
        let api = SkoolaApi::new(
            &ApiConfig {
                base_url: "https://api.skoola.app".to_string(),
                timeout_secs: 5,
            },
            store,
        )
        .unwrap();

        assert!(matches!(api.bearer(), Err(ApiError::Unauthenticated)));
    }
}
