use crate::Database;
use crate::models::{OAuthProfile, QuestionRow, UserRow};
use anyhow::{Result, anyhow};
use askbox_types::models::QuestionStatus;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, image, created_at";
const QUESTION_COLUMNS: &str = "id, user_id, body, status, created_at";

impl Database {
    // -- Users --

    /// Find the user linked to a provider account, creating user and link on
    /// first sign-in. Existing users are returned untouched.
    pub fn upsert_oauth_user(
        &self,
        provider: &str,
        provider_account_id: &str,
        profile: &OAuthProfile,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let linked: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM accounts WHERE provider = ?1 AND provider_account_id = ?2",
                    (provider, provider_account_id),
                    |row| row.get(0),
                )
                .optional()?;

            let user_id = match linked {
                Some(user_id) => user_id,
                None => {
                    let user_id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO users (id, name, email, image, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![
                            user_id,
                            profile.name,
                            profile.email,
                            profile.image,
                            Utc::now().to_rfc3339()
                        ],
                    )?;
                    tx.execute(
                        "INSERT INTO accounts (id, user_id, provider, provider_account_id) VALUES (?1, ?2, ?3, ?4)",
                        (Uuid::new_v4().to_string(), &user_id, provider, provider_account_id),
                    )?;
                    info!("Created user {} for {} account {}", user_id, provider, provider_account_id);
                    user_id
                }
            };

            let user = query_user_by_id(&tx, &user_id)?
                .ok_or_else(|| anyhow!("Linked user {} is missing", user_id))?;
            tx.commit()?;
            Ok(user)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Case-insensitive lookup by display name, as typed into a public link.
    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE name = ?1 COLLATE NOCASE ORDER BY created_at LIMIT 1"
            ))?;
            Ok(stmt.query_row([name], user_from_row).optional()?)
        })
    }

    // -- Questions --

    pub fn insert_question(
        &self,
        id: &str,
        user_id: &str,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO questions (id, user_id, body, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    id,
                    user_id,
                    body,
                    QuestionStatus::Pending.as_str(),
                    created_at.to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_question(&self, id: &str) -> Result<Option<QuestionRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"))?;
            Ok(stmt.query_row([id], question_from_row).optional()?)
        })
    }

    /// Owner's questions in one status, newest first (ids are time-ordered).
    pub fn list_questions(&self, user_id: &str, status: QuestionStatus) -> Result<Vec<QuestionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUESTION_COLUMNS} FROM questions
                 WHERE user_id = ?1 AND status = ?2
                 ORDER BY id DESC"
            ))?;

            let rows = stmt
                .query_map((user_id, status.as_str()), question_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Mark a question ANSWERED if `user_id` owns it. Returns rows affected,
    /// so zero means missing or not owned.
    pub fn archive_question(&self, id: &str, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE questions SET status = ?1 WHERE id = ?2 AND user_id = ?3",
                (QuestionStatus::Answered.as_str(), id, user_id),
            )?;
            Ok(changed)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    Ok(stmt.query_row([id], user_from_row).optional()?)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        image: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<QuestionRow> {
    Ok(QuestionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        body: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> OAuthProfile {
        OAuthProfile {
            name: Some(name.to_string()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            image: None,
        }
    }

    fn owner(db: &Database, name: &str) -> String {
        db.upsert_oauth_user("github", name, &profile(name)).unwrap().id
    }

    fn ask(db: &Database, user_id: &str, body: &str) -> String {
        let id = Uuid::now_v7().to_string();
        db.insert_question(&id, user_id, body, Utc::now()).unwrap();
        id
    }

    #[test]
    fn first_sign_in_creates_then_reuses_user() {
        let db = Database::open_in_memory().unwrap();

        let first = db.upsert_oauth_user("github", "42", &profile("Theo")).unwrap();
        let again = db
            .upsert_oauth_user("github", "42", &profile("Renamed"))
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.name.as_deref(), Some("Theo"));

        let other = db.upsert_oauth_user("github", "43", &profile("Other")).unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn name_lookup_ignores_case() {
        let db = Database::open_in_memory().unwrap();
        let id = owner(&db, "Theo");

        let found = db.get_user_by_name("theo").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(db.get_user_by_name("nobody").unwrap().is_none());
    }

    #[test]
    fn new_questions_are_pending_and_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let user = owner(&db, "Theo");

        let older = ask(&db, &user, "first");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = ask(&db, &user, "second");

        let stored = db.get_question(&older).unwrap().unwrap();
        assert_eq!(stored.status, "PENDING");

        let listed = db.list_questions(&user, QuestionStatus::Pending).unwrap();
        let ids: Vec<_> = listed.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[test]
    fn question_needs_existing_owner() {
        let db = Database::open_in_memory().unwrap();
        let result = db.insert_question(
            &Uuid::now_v7().to_string(),
            &Uuid::new_v4().to_string(),
            "anyone there?",
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn body_longer_than_limit_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = owner(&db, "Theo");

        let long = "x".repeat(401);
        assert!(
            db.insert_question(&Uuid::now_v7().to_string(), &user, &long, Utc::now())
                .is_err()
        );

        // Limit counts characters, not bytes
        let wide = "é".repeat(400);
        assert!(
            db.insert_question(&Uuid::now_v7().to_string(), &user, &wide, Utc::now())
                .is_ok()
        );
    }

    #[test]
    fn archive_only_touches_owned_questions() {
        let db = Database::open_in_memory().unwrap();
        let theo = owner(&db, "Theo");
        let mallory = owner(&db, "Mallory");
        let id = ask(&db, &theo, "keep me");

        assert_eq!(db.archive_question(&id, &mallory).unwrap(), 0);
        assert_eq!(db.get_question(&id).unwrap().unwrap().status, "PENDING");

        assert_eq!(db.archive_question(&id, &theo).unwrap(), 1);
        assert!(db.list_questions(&theo, QuestionStatus::Pending).unwrap().is_empty());

        let answered = db.list_questions(&theo, QuestionStatus::Answered).unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].status, "ANSWERED");
    }
}
