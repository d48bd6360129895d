use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::RelayError;
use crate::signature;

/// One event as it would have been handed to the hosted relay.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub channel: String,
    pub event: String,
    pub data: Value,
}

/// In-process stand-in for the hosted relay. Every trigger is fanned out to
/// whoever subscribed; nobody listening is not an error.
#[derive(Clone)]
pub struct LocalRelay {
    inner: Arc<LocalRelayInner>,
}

struct LocalRelayInner {
    tx: broadcast::Sender<Published>,
}

impl LocalRelay {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(LocalRelayInner { tx }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.inner.tx.subscribe()
    }

    pub fn trigger(&self, channel: &str, event: &str, data: &Value) -> Result<(), RelayError> {
        signature::validate_channel_name(channel)?;
        signature::validate_event_name(event)?;
        signature::validate_payload(&serde_json::to_string(data)?)?;

        let receivers = self
            .inner
            .tx
            .send(Published {
                channel: channel.to_string(),
                event: event.to_string(),
                data: data.clone(),
            })
            .unwrap_or(0);

        debug!("Local relay: '{}' on {} ({} listeners)", event, channel, receivers);
        Ok(())
    }
}

impl Default for LocalRelay {
    fn default() -> Self {
        Self::new()
    }
}
