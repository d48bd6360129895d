//! GitHub sign-in: authorize redirect, code exchange, profile fetch, and
//! the one-time `state` values that tie a callback to its redirect.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::error::ApiError;

const STATE_TTL: Duration = Duration::from_secs(10 * 60);
const MAX_PENDING_LOGINS: usize = 10_000;
const SCOPE: &str = "read:user user:email";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("provider refused sign-in: {0}")]
    Denied(String),

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Denied(reason) => {
                warn!("GitHub sign-in denied: {}", reason);
                ApiError::Unauthorized
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl GithubConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorize_url: "https://github.com/login/oauth/authorize".into(),
            token_url: "https://github.com/login/oauth/access_token".into(),
            api_url: "https://api.github.com".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubProfile {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl GithubProfile {
    /// Public links are built from this, so fall back to the login when the
    /// profile has no display name.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
            .to_string()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub struct GithubOAuth {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubOAuth {
    pub fn new(config: GithubConfig) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("askbox/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn authorize_url(&self, state: &str) -> Result<Url, ApiError> {
        Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| ApiError::Internal(e.into()))
    }

    /// Trade the callback `code` for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let res: TokenResponse = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match res.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(OAuthError::Denied(
                res.error_description
                    .or(res.error)
                    .unwrap_or_else(|| "no access token".into()),
            )),
        }
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GithubProfile, OAuthError> {
        let url = format!("{}/user", self.config.api_url.trim_end_matches('/'));
        let res = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if res.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OAuthError::Denied("access token rejected".into()));
        }

        Ok(res.error_for_status()?.json().await?)
    }
}

/// Outstanding sign-in `state` values. Each is valid once, for a few minutes,
/// and at most `capacity` are outstanding at a time.
pub struct PendingLogins {
    states: Mutex<HashMap<String, Instant>>,
    capacity: usize,
}

impl Default for PendingLogins {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_LOGINS)
    }
}

impl PendingLogins {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn issue(&self) -> Result<String, ApiError> {
        let now = Instant::now();
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.retain(|_, issued| now.duration_since(*issued) < STATE_TTL);
        if states.len() >= self.capacity {
            warn!("{} sign-ins already pending, refusing another", states.len());
            return Err(ApiError::TooManyRequests);
        }

        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        let state = URL_SAFE_NO_PAD.encode(bytes);
        states.insert(state.clone(), now);
        Ok(state)
    }

    /// True if `state` was issued and has not expired. Consumes it either way.
    pub fn consume(&self, state: &str) -> bool {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states
            .remove(state)
            .is_some_and(|issued| issued.elapsed() < STATE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_single_use() {
        let pending = PendingLogins::default();
        let state = pending.issue().unwrap();

        assert!(pending.consume(&state));
        assert!(!pending.consume(&state));
        assert!(!pending.consume("never-issued"));
    }

    #[test]
    fn states_are_distinct() {
        let pending = PendingLogins::default();
        assert_ne!(pending.issue().unwrap(), pending.issue().unwrap());
    }

    #[test]
    fn issuing_stops_at_capacity() {
        let pending = PendingLogins::with_capacity(2);
        let first = pending.issue().unwrap();
        pending.issue().unwrap();
        assert!(matches!(pending.issue(), Err(ApiError::TooManyRequests)));

        // Consuming one frees a slot
        assert!(pending.consume(&first));
        assert!(pending.issue().is_ok());
    }

    #[test]
    fn display_name_falls_back_to_login() {
        let mut profile = GithubProfile {
            id: 1,
            login: "t3dotgg".into(),
            name: Some("Theo".into()),
            email: None,
            avatar_url: None,
        };
        assert_eq!(profile.display_name(), "Theo");

        profile.name = Some("  ".into());
        assert_eq!(profile.display_name(), "t3dotgg");

        profile.name = None;
        assert_eq!(profile.display_name(), "t3dotgg");
    }

    #[test]
    fn authorize_url_carries_state() {
        let oauth = GithubOAuth::new(GithubConfig::new(
            "client".into(),
            "secret".into(),
            "http://localhost:3000/auth/github/callback".into(),
        ))
        .unwrap();

        let url = oauth.authorize_url("abc").unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(params["client_id"], "client");
        assert_eq!(params["state"], "abc");
        assert_eq!(params["scope"], SCOPE);
    }
}
