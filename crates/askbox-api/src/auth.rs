use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use askbox_db::models::OAuthProfile;
use askbox_types::api::{AuthResponse, Claims, OAuthCallbackQuery};
use askbox_types::models::User;

use crate::error::ApiError;
use crate::oauth::GithubOAuth;
use crate::state::{AppState, with_db};

const PROVIDER: &str = "github";

fn github(state: &AppState) -> Result<&GithubOAuth, ApiError> {
    state.github.as_ref().ok_or(ApiError::NotFound("Sign-in provider"))
}

/// GET /auth/github
pub async fn github_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let github = github(&state)?;
    let login_state = state.pending_logins.issue()?;
    let url = github.authorize_url(&login_state)?;
    Ok(Redirect::to(url.as_str()))
}

/// GET /auth/github/callback
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let github = github(&state)?;

    if !state.pending_logins.consume(&query.state) {
        warn!("GitHub callback with unknown or expired state");
        return Err(ApiError::Unauthorized);
    }

    let access_token = github.exchange_code(&query.code).await?;
    let gh = github.fetch_profile(&access_token).await?;

    let account_id = gh.id.to_string();
    let profile = OAuthProfile {
        name: Some(gh.display_name()),
        email: gh.email,
        image: gh.avatar_url,
    };

    let user = with_db(&state, move |db| {
        db.upsert_oauth_user(PROVIDER, &account_id, &profile)?
            .into_user()
    })
    .await?;

    let token = create_token(&state.jwt_secret, user.id, user.name.as_deref(), state.token_ttl)?;
    info!("User {} signed in with GitHub", user.id);

    Ok(Json(AuthResponse {
        user_id: user.id,
        name: user.name,
        token,
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let user_id = claims.sub.to_string();
    let row = with_db(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(row.into_user()?))
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    name: Option<&str>,
    ttl: chrono::Duration,
) -> Result<String, ApiError> {
    let exp = chrono::Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("token lifetime {} overflows", ttl)))?;

    let claims = Claims {
        sub: user_id,
        name: name.map(str::to_string),
        exp: exp.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(token)
}
