use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use askbox_db::Database;
use askbox_relay::RelayClient;

use crate::error::ApiError;
use crate::oauth::{GithubOAuth, PendingLogins};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub relay: RelayClient,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Absent when no OAuth app is configured; sign-in routes then 404.
    pub github: Option<GithubOAuth>,
    pub pending_logins: PendingLogins,
}

impl AppStateInner {
    pub fn new(db: Database, relay: RelayClient, jwt_secret: String) -> Self {
        Self {
            db,
            relay,
            jwt_secret,
            token_ttl: chrono::Duration::days(30),
            github: None,
            pending_logins: PendingLogins::default(),
        }
    }
}

/// Run a blocking DB call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("database task failed"))
        })?
        .map_err(ApiError::from)
}
