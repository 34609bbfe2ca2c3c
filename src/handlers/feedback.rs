// src/handlers/feedback.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::feedback::{CreateCommentRequest, FeedbackComment},
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

async fn ensure_assessment(state: &AppState, id: &str) -> Result<(), AppError> {
    state
        .stores
        .assessments
        .get(id)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Assessment not found".to_string()))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.stores.feedback.get(&id).await?))
}

pub async fn upvote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_assessment(&state, &id).await?;
    let feedback = state
        .stores
        .feedback
        .update(&id, |f| f.upvotes += 1)
        .await?;
    Ok(Json(feedback))
}

pub async fn downvote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_assessment(&state, &id).await?;
    let feedback = state
        .stores
        .feedback
        .update(&id, |f| f.downvotes += 1)
        .await?;
    Ok(Json(feedback))
}

/// Adds a comment. The text is trimmed and sanitized before storage.
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let text = clean_html(payload.text.trim());
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
    }
    ensure_assessment(&state, &id).await?;

    let author = state
        .stores
        .users
        .find_by_id(&claims.sub)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| claims.sub.clone());

    let comment = FeedbackComment {
        id: uuid::Uuid::new_v4().simple().to_string(),
        author,
        text,
        date: Utc::now(),
    };
    let feedback = state
        .stores
        .feedback
        .update(&id, move |f| f.comments.push(comment))
        .await?;

    Ok((StatusCode::CREATED, Json(feedback)))
}
