use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use askbox_types::api::{ArchiveResponse, Claims, ListQuestionsQuery, SubmitQuestionRequest};
use askbox_types::events::RelayEvent;
use askbox_types::models::{MAX_QUESTION_CHARS, Question, QuestionStatus};

use crate::error::ApiError;
use crate::state::{AppState, with_db};

fn validate_body(body: &str) -> Result<(), ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("Question must not be empty".into()));
    }
    if body.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Question must be at most {} characters",
            MAX_QUESTION_CHARS
        )));
    }
    Ok(())
}

/// POST /questions
///
/// Anonymous: anyone holding the owner's public link may ask.
pub async fn submit_question(
    State(state): State<AppState>,
    Json(req): Json<SubmitQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_body(&req.question)?;

    let owner = req.user_id;
    let question_id = Uuid::now_v7();
    let created_at = Utc::now();

    let question = with_db(&state, move |db| {
        let oid = owner.to_string();
        if db.get_user_by_id(&oid)?.is_none() {
            return Ok(None);
        }
        db.insert_question(&question_id.to_string(), &oid, &req.question, created_at)?;
        Ok(Some(Question {
            id: question_id,
            user_id: owner,
            body: req.question,
            status: QuestionStatus::Pending,
            created_at,
        }))
    })
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    state.relay.publish(owner, &RelayEvent::NewQuestion).await?;
    debug!("Question {} submitted to {}", question.id, owner);

    Ok((StatusCode::CREATED, Json(question)))
}

/// GET /questions?status=
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => raw
            .parse::<QuestionStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => QuestionStatus::Pending,
    };

    let user_id = claims.sub.to_string();
    let questions = with_db(&state, move |db| {
        db.list_questions(&user_id, status)?
            .into_iter()
            .map(|row| row.into_question())
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(questions))
}

/// Load a question the caller owns. Missing and foreign look the same.
async fn owned_question(state: &AppState, id: Uuid, owner: Uuid) -> Result<Question, ApiError> {
    let row = with_db(state, move |db| db.get_question(&id.to_string()))
        .await?
        .ok_or(ApiError::NotYourQuestion)?;

    let question = row.into_question()?;
    if question.user_id != owner {
        return Err(ApiError::NotYourQuestion);
    }
    Ok(question)
}

/// POST /questions/{id}/pin
pub async fn pin_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Question>, ApiError> {
    let question = owned_question(&state, question_id, claims.sub).await?;

    state
        .relay
        .publish(
            question.user_id,
            &RelayEvent::QuestionPinned {
                question: question.body.clone(),
            },
        )
        .await?;

    Ok(Json(question))
}

/// POST /questions/unpin
pub async fn unpin_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    state
        .relay
        .publish(claims.sub, &RelayEvent::QuestionUnpinned)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /questions/{id}/archive
pub async fn archive_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ArchiveResponse>, ApiError> {
    let owner = claims.sub.to_string();
    let count = with_db(&state, move |db| {
        db.archive_question(&question_id.to_string(), &owner)
    })
    .await?;

    if count == 0 {
        return Err(ApiError::NotYourQuestion);
    }
    Ok(Json(ArchiveResponse { count }))
}
