#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use askbox_api::auth::create_token;
use askbox_api::{AppState, AppStateInner, router};
use askbox_db::Database;
use askbox_db::models::OAuthProfile;
use askbox_relay::{Credentials, LocalRelay, RelayClient};

pub const JWT_SECRET: &str = "test-secret";

pub fn credentials() -> Credentials {
    Credentials {
        app_id: "3887".into(),
        key: "278d425bdf160c739803".into(),
        secret: "7ad3773142a6692b25b8".into(),
    }
}

pub struct TestApp {
    pub state: AppState,
    pub relay: LocalRelay,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    /// Build state, letting the caller adjust it before it is shared.
    pub fn with(configure: impl FnOnce(&mut AppStateInner)) -> Self {
        let db = Database::open_in_memory().unwrap();
        let relay = LocalRelay::new();
        let mut inner = AppStateInner::new(
            db,
            RelayClient::local(relay.clone(), credentials()),
            JWT_SECRET.into(),
        );
        configure(&mut inner);
        Self {
            state: Arc::new(inner),
            relay,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Create a signed-in user and return its id and bearer token.
    pub fn user(&self, name: &str) -> (Uuid, String) {
        let row = self
            .state
            .db
            .upsert_oauth_user(
                "github",
                &format!("gh-{}", name),
                &OAuthProfile {
                    name: Some(name.into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let id: Uuid = row.id.parse().unwrap();
        let token = create_token(JWT_SECRET, id, Some(name), chrono::Duration::days(1)).unwrap();
        (id, token)
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, user_id: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(user_id) = user_id {
        builder = builder.header("user_id", user_id);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}
