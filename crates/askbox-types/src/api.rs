use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims issued at sign-in and checked by the bearer middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: Option<String>,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub token: String,
}

/// What the public ask page needs to know about a question's recipient.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

// -- Questions --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitQuestionRequest {
    pub user_id: Uuid,
    pub question: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveResponse {
    pub count: usize,
}

// -- Relay authorization --

/// Form body posted by the relay's browser SDK when it joins a private or
/// presence channel.
#[derive(Debug, Deserialize)]
pub struct ChannelAuthRequest {
    pub socket_id: String,
    pub channel_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserAuthRequest {
    pub socket_id: String,
}
