use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use askbox_types::api::PublicProfile;

use crate::error::ApiError;
use crate::state::{AppState, with_db};

/// GET /users/{name}
///
/// Backs the public ask page, so only what the page shows is exposed.
pub async fn public_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = with_db(&state, move |db| {
        db.get_user_by_name(&name)?.map(|row| row.into_user()).transpose()
    })
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(PublicProfile {
        id: user.id,
        name: user.name,
        image: user.image,
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
