//! Bridge between server-side question mutations and browser sessions.
//!
//! Delivery is the hosted relay's job. This crate only publishes named
//! events over its REST API and signs the grants browsers need before the
//! relay lets them into private or presence channels. [`LocalRelay`] keeps
//! the same surface in-process for development and tests.

pub mod error;
pub mod local;
pub mod pusher;
pub mod signature;

use serde_json::Value;
use uuid::Uuid;

use askbox_types::events::{RelayEvent, user_channel};

pub use error::RelayError;
pub use local::{LocalRelay, Published};
pub use pusher::{PusherClient, PusherConfig};
pub use signature::{ChannelGrant, Credentials, PresenceMember, UserGrant};

#[derive(Clone)]
enum Transport {
    Pusher(PusherClient),
    Local(LocalRelay),
}

/// Publishing and grant signing, whichever transport is configured.
#[derive(Clone)]
pub struct RelayClient {
    transport: Transport,
    credentials: Credentials,
}

impl RelayClient {
    pub fn pusher(config: PusherConfig) -> Result<Self, RelayError> {
        let credentials = config.credentials.clone();
        Ok(Self {
            transport: Transport::Pusher(PusherClient::new(config)?),
            credentials,
        })
    }

    /// Grants are still signed with `credentials`, so a browser SDK pointed
    /// at a self-hosted relay with the same secret keeps working.
    pub fn local(relay: LocalRelay, credentials: Credentials) -> Self {
        Self {
            transport: Transport::Local(relay),
            credentials,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.transport, Transport::Local(_))
    }

    /// Publish a question lifecycle event on the owner's channel.
    pub async fn publish(&self, owner: Uuid, event: &RelayEvent) -> Result<(), RelayError> {
        self.trigger(&user_channel(owner), event.name(), &event.payload())
            .await
    }

    pub async fn trigger(&self, channel: &str, event: &str, data: &Value) -> Result<(), RelayError> {
        match &self.transport {
            Transport::Pusher(client) => client.trigger(channel, event, data).await,
            Transport::Local(relay) => relay.trigger(channel, event, data),
        }
    }

    pub fn authorize_channel(
        &self,
        socket_id: &str,
        channel: &str,
        member: Option<&PresenceMember>,
    ) -> Result<ChannelGrant, RelayError> {
        signature::authorize_channel(&self.credentials, socket_id, channel, member)
    }

    pub fn authenticate_user(&self, socket_id: &str, user: &Value) -> Result<UserGrant, RelayError> {
        signature::authenticate_user(&self.credentials, socket_id, user)
    }
}
