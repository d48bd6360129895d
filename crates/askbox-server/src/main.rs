mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use askbox_api::oauth::{GithubConfig, GithubOAuth};
use askbox_api::{AppStateInner, router};
use askbox_db::Database;
use askbox_relay::{Credentials, LocalRelay, RelayClient};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "askbox=debug,askbox_api=debug,askbox_relay=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;

    let relay = match config.pusher.clone() {
        Some(pusher) => {
            info!("Publishing through relay cluster at {}", pusher.base_url());
            RelayClient::pusher(pusher)?
        }
        None => {
            warn!("No relay credentials configured; events stay in-process");
            RelayClient::local(LocalRelay::new(), Credentials::local(&config.jwt_secret))
        }
    };

    let mut state = AppStateInner::new(db, relay, config.jwt_secret.clone());
    state.token_ttl = chrono::Duration::days(config.token_ttl_days);
    state.github = match &config.github {
        Some(app) => Some(GithubOAuth::new(GithubConfig::new(
            app.client_id.clone(),
            app.client_secret.clone(),
            config.github_redirect_uri(),
        ))?),
        None => {
            warn!("No GitHub OAuth app configured; sign-in is disabled");
            None
        }
    };

    let app = router(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Askbox server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
