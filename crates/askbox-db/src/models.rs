/// Database row types, mapping directly to SQLite rows.
/// Kept apart from the askbox-types API models so the DB layer stays independent.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

use askbox_types::models::{Question, QuestionStatus, User};

pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
}

pub struct QuestionRow {
    pub id: String,
    pub user_id: String,
    pub body: String,
    pub status: String,
    pub created_at: String,
}

/// Profile fields copied from the OAuth provider at first sign-in.
#[derive(Debug, Clone, Default)]
pub struct OAuthProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id.parse().with_context(|| format!("corrupt user id '{}'", self.id))?,
            created_at: parse_timestamp(&self.created_at)?,
            name: self.name,
            email: self.email,
            image: self.image,
        })
    }
}

impl QuestionRow {
    pub fn into_question(self) -> Result<Question> {
        Ok(Question {
            id: self.id.parse().with_context(|| format!("corrupt question id '{}'", self.id))?,
            user_id: self
                .user_id
                .parse()
                .with_context(|| format!("corrupt owner '{}' on question '{}'", self.user_id, self.id))?,
            status: self.status.parse::<QuestionStatus>()?,
            created_at: parse_timestamp(&self.created_at)?,
            body: self.body,
        })
    }
}

/// Timestamps are written as RFC 3339; rows edited by hand may carry
/// SQLite's `datetime('now')` format instead.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}
