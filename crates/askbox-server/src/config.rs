use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use askbox_relay::{Credentials, PusherConfig};

/// Ten years; sessions longer than that are a misconfiguration.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct GithubApp {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Origin browsers reach the server on; OAuth redirects are built from it.
    pub public_url: String,
    pub github: Option<GithubApp>,
    /// `None` runs the in-process relay.
    pub pusher: Option<PusherConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Blank counts as unset
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("ASKBOX_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ASKBOX_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("ASKBOX_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("ASKBOX_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("ASKBOX_PORT must be a port number")?;
        let db_path: PathBuf = var("ASKBOX_DB_PATH").unwrap_or_else(|| "askbox.db".into()).into();
        let token_ttl_days: i64 = match var("ASKBOX_TOKEN_TTL_DAYS") {
            Some(raw) => raw.parse().context("ASKBOX_TOKEN_TTL_DAYS must be a whole number")?,
            None => 30,
        };
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("ASKBOX_TOKEN_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }
        let public_url = var("ASKBOX_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let github = match (var("ASKBOX_GITHUB_CLIENT_ID"), var("ASKBOX_GITHUB_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GithubApp {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("ASKBOX_GITHUB_CLIENT_ID and ASKBOX_GITHUB_CLIENT_SECRET must be set together"),
        };

        let pusher = match (
            var("ASKBOX_PUSHER_APP_ID"),
            var("ASKBOX_PUSHER_KEY"),
            var("ASKBOX_PUSHER_SECRET"),
        ) {
            (Some(app_id), Some(key), Some(secret)) => Some(PusherConfig {
                credentials: Credentials {
                    app_id,
                    key,
                    secret,
                },
                cluster: var("ASKBOX_PUSHER_CLUSTER").unwrap_or_else(|| "mt1".into()),
                host: var("ASKBOX_PUSHER_HOST"),
            }),
            (None, None, None) => None,
            _ => bail!(
                "ASKBOX_PUSHER_APP_ID, ASKBOX_PUSHER_KEY and ASKBOX_PUSHER_SECRET must be set together"
            ),
        };

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            token_ttl_days,
            public_url,
            github,
            pusher,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("bad listen address {}:{}", self.host, self.port))
    }

    pub fn github_redirect_uri(&self) -> String {
        format!("{}/auth/github/callback", self.public_url)
    }
}
