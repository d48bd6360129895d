use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::signature::{self, Credentials};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the relay's REST API lives and how to sign for it.
#[derive(Debug, Clone)]
pub struct PusherConfig {
    pub credentials: Credentials,
    pub cluster: String,
    /// Full base URL override (self-hosted relays, tests). When unset the
    /// hosted cluster endpoint is used.
    pub host: Option<String>,
}

impl PusherConfig {
    pub fn base_url(&self) -> String {
        match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://api-{}.pusher.com", self.cluster),
        }
    }
}

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    /// The relay expects event data as a JSON-encoded string.
    data: String,
}

/// Client for the relay's HTTP publish API.
#[derive(Clone)]
pub struct PusherClient {
    http: reqwest::Client,
    config: PusherConfig,
    base_url: String,
}

impl PusherClient {
    pub fn new(config: PusherConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = config.base_url();
        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Publish `event` with `data` on `channel`.
    pub async fn trigger(&self, channel: &str, event: &str, data: &Value) -> Result<(), RelayError> {
        signature::validate_channel_name(channel)?;
        signature::validate_event_name(event)?;

        let data = serde_json::to_string(data)?;
        signature::validate_payload(&data)?;

        let body = serde_json::to_vec(&TriggerBody {
            name: event,
            channels: [channel],
            data,
        })?;

        let path = format!("/apps/{}/events", self.config.credentials.app_id);
        let query = signature::signed_query(
            &self.config.credentials,
            "POST",
            &path,
            &body,
            chrono::Utc::now().timestamp(),
        );

        let res = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Relay rejected '{}' on {}: {} {}", event, channel, status, body);
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Triggered '{}' on {}", event, channel);
        Ok(())
    }
}
