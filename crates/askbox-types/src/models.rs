use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum question length, counted in characters.
pub const MAX_QUESTION_CHARS: usize = 400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a question. PENDING questions show up in the owner's list,
/// ANSWERED ones are archived out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionStatus {
    #[default]
    Pending,
    Answered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Answered => "ANSWERED",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for QuestionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pending") {
            Ok(Self::Pending)
        } else if s.eq_ignore_ascii_case("answered") {
            Ok(Self::Answered)
        } else {
            Err(UnknownStatus(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("pending".parse::<QuestionStatus>().unwrap(), QuestionStatus::Pending);
        assert_eq!("ANSWERED".parse::<QuestionStatus>().unwrap(), QuestionStatus::Answered);
        let err = "deleted".parse::<QuestionStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("deleted".into()));
        assert_eq!(err.to_string(), "unknown question status 'deleted'");
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&QuestionStatus::Answered).unwrap();
        assert_eq!(json, "\"ANSWERED\"");
    }

    #[test]
    fn question_uses_camel_case_fields() {
        let q = Question {
            id: Uuid::now_v7(),
            user_id: Uuid::new_v4(),
            body: "why rust?".into(),
            status: QuestionStatus::Pending,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&q).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["status"], "PENDING");
    }
}
