//! Request and grant signing for the hosted relay.
//!
//! Everything the relay trusts is an HMAC-SHA256 over a well-known string,
//! hex encoded, keyed by the app secret:
//!
//! - REST calls sign `METHOD\nPATH\nsorted_query` and carry `body_md5`.
//! - Private channel grants sign `socket_id:channel`.
//! - Presence channel grants sign `socket_id:channel:channel_data`.
//! - User sign-in grants sign `socket_id::user::user_data`.

use std::collections::BTreeMap;
use std::fmt;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use askbox_types::events::is_presence_channel;

use crate::error::RelayError;

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_VERSION: &str = "1.0";
const MAX_CHANNEL_NAME_LEN: usize = 200;
const MAX_EVENT_NAME_LEN: usize = 200;
const LOCAL_SECRET_LABEL: &str = "askbox local relay grants v1";

/// Relay limit on a single event's data.
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024;

/// App credentials issued by the relay.
#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub key: String,
    pub secret: String,
}

impl Credentials {
    /// Credentials for the in-process relay. The grant secret is derived
    /// from `master` under a fixed label so `master` itself never signs
    /// anything a caller can request.
    pub fn local(master: &str) -> Self {
        Self {
            app_id: "local".into(),
            key: "local".into(),
            secret: sign(master, LOCAL_SECRET_LABEL),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Member record announced to a presence channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceMember {
    pub user_id: String,
    pub user_info: Value,
}

/// Signed answer to a channel authorization request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelGrant {
    pub auth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

/// Signed answer to a user sign-in request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserGrant {
    pub auth: String,
    pub user_data: String,
}

/// Hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn sign(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn body_md5(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

/// Query parameters for a signed REST call, `auth_signature` included.
pub fn signed_query(
    credentials: &Credentials,
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: i64,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("auth_key".to_string(), credentials.key.clone());
    params.insert("auth_timestamp".to_string(), timestamp.to_string());
    params.insert("auth_version".to_string(), AUTH_VERSION.to_string());
    params.insert("body_md5".to_string(), body_md5(body));

    // BTreeMap iterates in key order, which is the order the relay signs in
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let to_sign = format!("{}\n{}\n{}", method.to_uppercase(), path, query);

    params.insert("auth_signature".to_string(), sign(&credentials.secret, &to_sign));
    params
}

pub fn validate_socket_id(socket_id: &str) -> Result<(), RelayError> {
    let valid = socket_id
        .split_once('.')
        .is_some_and(|(a, b)| is_digits(a) && is_digits(b));
    if valid {
        Ok(())
    } else {
        Err(RelayError::InvalidSocketId(socket_id.to_string()))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_channel_name(channel: &str) -> Result<(), RelayError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || "_-=@,.;".contains(c);
    if channel.is_empty() || channel.len() > MAX_CHANNEL_NAME_LEN || !channel.chars().all(allowed) {
        return Err(RelayError::InvalidChannelName(channel.to_string()));
    }
    Ok(())
}

/// `data` is the JSON-encoded event payload as it goes on the wire.
pub fn validate_payload(data: &str) -> Result<(), RelayError> {
    if data.len() > MAX_PAYLOAD_BYTES {
        return Err(RelayError::PayloadTooLarge(data.len()));
    }
    Ok(())
}

pub fn validate_event_name(event: &str) -> Result<(), RelayError> {
    if event.is_empty() || event.len() > MAX_EVENT_NAME_LEN {
        return Err(RelayError::InvalidEventName(event.to_string()));
    }
    Ok(())
}

/// Grant a socket access to a private or presence channel. Presence
/// channels need `member`; for other channels it is ignored.
pub fn authorize_channel(
    credentials: &Credentials,
    socket_id: &str,
    channel: &str,
    member: Option<&PresenceMember>,
) -> Result<ChannelGrant, RelayError> {
    validate_socket_id(socket_id)?;
    validate_channel_name(channel)?;

    let (to_sign, channel_data) = if is_presence_channel(channel) {
        let member = member.ok_or_else(|| RelayError::MissingPresenceMember(channel.to_string()))?;
        let data = serde_json::to_string(member)?;
        (format!("{}:{}:{}", socket_id, channel, data), Some(data))
    } else {
        (format!("{}:{}", socket_id, channel), None)
    };

    Ok(ChannelGrant {
        auth: format!("{}:{}", credentials.key, sign(&credentials.secret, &to_sign)),
        channel_data,
    })
}

/// Sign in a socket as `user`, which must carry a string `id`.
pub fn authenticate_user(
    credentials: &Credentials,
    socket_id: &str,
    user: &Value,
) -> Result<UserGrant, RelayError> {
    validate_socket_id(socket_id)?;

    let has_id = user
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        return Err(RelayError::InvalidUserData);
    }

    let user_data = serde_json::to_string(user)?;
    let to_sign = format!("{}::user::{}", socket_id, user_data);

    Ok(UserGrant {
        auth: format!("{}:{}", credentials.key, sign(&credentials.secret, &to_sign)),
        user_data,
    })
}
