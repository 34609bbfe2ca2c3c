// src/handlers/assessments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::assessment::{
        ImportRequest, PublicAssessment, UpsertAssessmentRequest, new_assessment_id,
    },
    services::{import, stats},
    state::AppState,
    utils::jwt::Claims,
};

/// Lists assessments as shown on the dashboard (no answer keys).
pub async fn list_assessments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let assessments = state.stores.assessments.list().await?;
    let public: Vec<PublicAssessment> = assessments.iter().map(PublicAssessment::from).collect();
    Ok(Json(public))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .stores
        .assessments
        .get(&id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    Ok(Json(PublicAssessment::from(&assessment)))
}

/// The signed-in user's completed attempts, newest first.
pub async fn my_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let mut history = state.stores.history.list_for_user(&claims.sub).await?;
    history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(Json(history))
}

pub async fn my_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let total = state.stores.assessments.list().await?.len();
    let history = state.stores.history.list_for_user(&claims.sub).await?;
    Ok(Json(stats::dashboard(total, history, Utc::now().date_naive())))
}

/// Full assessment including answer keys.
/// Admin only.
pub async fn admin_get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .stores
        .assessments
        .get(&id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;
    Ok(Json(assessment))
}

/// Admin only.
pub async fn admin_list_assessments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.stores.assessments.list().await?))
}

/// Creates an assessment with a generated id.
/// Admin only.
pub async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<UpsertAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let now = Utc::now();
    let assessment = payload.into_assessment(new_assessment_id(), now, now);
    state.stores.assessments.upsert(assessment.clone()).await?;
    tracing::info!("Created assessment {} ({})", assessment.id, assessment.title);

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// Replaces an assessment, or creates it under the given id.
/// Admin only.
pub async fn update_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpsertAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let now = Utc::now();
    let created_at = state
        .stores
        .assessments
        .get(&id)
        .await?
        .map_or(now, |existing| existing.created_at);

    let assessment = payload.into_assessment(id, created_at, now);
    let created = state.stores.assessments.upsert(assessment.clone()).await?;
    tracing::info!(
        "{} assessment {}",
        if created { "Created" } else { "Updated" },
        assessment.id
    );

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(assessment)))
}

/// History and transactions of the assessment are kept.
/// Admin only.
pub async fn delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.assessments.delete(&id).await? {
        return Err(AppError::NotFound("Assessment not found".to_string()));
    }
    tracing::info!("Deleted assessment {}", id);

    Ok(Json(json!({ "message": "Assessment deleted successfully!" })))
}

/// Parses an uploaded question file without saving anything.
/// Admin only.
pub async fn preview_import(Json(payload): Json<ImportRequest>) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let imported = import::parse_question_file(&payload.filename, &payload.content)
        .inspect_err(|e| tracing::warn!("Import of '{}' rejected: {}", payload.filename, e))?;
    tracing::info!(
        "Parsed {} questions from '{}'",
        imported.questions.len(),
        payload.filename
    );

    Ok(Json(imported))
}

/// Appends the questions of an uploaded file to an assessment.
/// Nothing is saved if the file is rejected.
/// Admin only.
pub async fn import_into_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let imported = import::parse_question_file(&payload.filename, &payload.content)
        .inspect_err(|e| tracing::warn!("Import of '{}' rejected: {}", payload.filename, e))?;
    let added = imported.questions.len();

    let now = Utc::now();
    let assessment = state
        .stores
        .assessments
        .modify(&id, move |assessment| {
            assessment.questions.extend(imported.questions);
            assessment.updated_at = now;
        })
        .await?;
    tracing::info!("Imported {} questions into assessment {}", added, id);

    Ok(Json(json!({
        "message": format!("Successfully imported {} questions.", added),
        "imported": added,
        "assessment": assessment,
    })))
}
