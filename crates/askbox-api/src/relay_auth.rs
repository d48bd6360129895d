//! Grants for the relay's browser SDK. The SDK posts a form and passes the
//! viewer's id in a `user_id` header; viewers are anonymous, so every member
//! is announced as a guest.

use axum::{
    Form, Json,
    extract::State,
    http::HeaderMap,
};
use serde_json::json;
use tracing::debug;

use askbox_relay::{ChannelGrant, PresenceMember, UserGrant};
use askbox_types::api::{ChannelAuthRequest, UserAuthRequest};
use askbox_types::events::is_presence_channel;

use crate::error::ApiError;
use crate::state::AppState;

const USER_ID_HEADER: &str = "user_id";
const GUEST_NAME: &str = "guest";

fn caller_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(ApiError::NotFound("User"))
}

/// POST /relay/auth-channel
pub async fn auth_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<ChannelAuthRequest>,
) -> Result<Json<ChannelGrant>, ApiError> {
    let user_id = caller_id(&headers)?;

    let member = is_presence_channel(&req.channel_name).then(|| PresenceMember {
        user_id: user_id.clone(),
        user_info: json!({ "name": GUEST_NAME }),
    });

    let grant = state
        .relay
        .authorize_channel(&req.socket_id, &req.channel_name, member.as_ref())?;

    debug!("Granted {} to socket {} ({})", req.channel_name, req.socket_id, user_id);
    Ok(Json(grant))
}

/// POST /relay/auth-user
pub async fn auth_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<UserAuthRequest>,
) -> Result<Json<UserGrant>, ApiError> {
    let user_id = caller_id(&headers)?;
    let grant = state
        .relay
        .authenticate_user(&req.socket_id, &json!({ "id": user_id, "name": GUEST_NAME }))?;
    Ok(Json(grant))
}
