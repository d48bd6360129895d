use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, questions, relay_auth, users};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(users::health))
        .route("/users/{name}", get(users::public_profile))
        .route("/questions", post(questions::submit_question))
        .route("/relay/auth-channel", post(relay_auth::auth_channel))
        .route("/relay/auth-user", post(relay_auth::auth_user))
        .route("/auth/github", get(auth::github_login))
        .route("/auth/github/callback", get(auth::github_callback));

    let protected_routes = Router::new()
        .route("/questions", get(questions::list_questions))
        .route("/questions/unpin", post(questions::unpin_question))
        .route("/questions/{id}/pin", post(questions::pin_question))
        .route("/questions/{id}/archive", post(questions::archive_question))
        .route("/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
