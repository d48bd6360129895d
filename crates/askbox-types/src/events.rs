use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Prefix the relay uses to mark membership-tracking channels.
pub const PRESENCE_PREFIX: &str = "presence-";

/// Per-owner broadcast channel: `user-<id>`.
pub fn user_channel(user_id: Uuid) -> String {
    format!("user-{}", user_id)
}

/// Membership-tracking twin of [`user_channel`]: `presence-user-<id>`.
pub fn presence_channel(user_id: Uuid) -> String {
    format!("{}{}", PRESENCE_PREFIX, user_channel(user_id))
}

pub fn is_presence_channel(channel: &str) -> bool {
    channel.starts_with(PRESENCE_PREFIX)
}

/// Question lifecycle events published on an owner's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A question arrived; clients refetch their list.
    NewQuestion,

    /// The owner put a question on screen.
    QuestionPinned { question: String },

    /// The owner cleared whatever was on screen.
    QuestionUnpinned,
}

#[derive(Serialize, Deserialize)]
struct PinnedPayload {
    question: String,
}

impl RelayEvent {
    pub const NEW_QUESTION: &'static str = "new-question";
    pub const QUESTION_PINNED: &'static str = "question-pinned";
    pub const QUESTION_UNPINNED: &'static str = "question-unpinned";

    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewQuestion => Self::NEW_QUESTION,
            Self::QuestionPinned { .. } => Self::QUESTION_PINNED,
            Self::QuestionUnpinned => Self::QUESTION_UNPINNED,
        }
    }

    /// JSON payload attached to the event.
    pub fn payload(&self) -> Value {
        match self {
            Self::QuestionPinned { question } => json!({ "question": question }),
            Self::NewQuestion | Self::QuestionUnpinned => json!({}),
        }
    }

    /// Rebuild an event from what a subscriber receives. Unknown names and
    /// malformed pinned payloads yield `None`.
    pub fn from_wire(name: &str, data: &Value) -> Option<Self> {
        match name {
            Self::NEW_QUESTION => Some(Self::NewQuestion),
            Self::QUESTION_UNPINNED => Some(Self::QuestionUnpinned),
            Self::QUESTION_PINNED => {
                let payload: PinnedPayload = serde_json::from_value(data.clone()).ok()?;
                Some(Self::QuestionPinned {
                    question: payload.question,
                })
            }
            _ => None,
        }
    }
}
