// src/handlers/courses.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{Course, CreateCourseRequest},
    services::courses,
    state::AppState,
    utils::jwt::Claims,
};

async fn find_course(state: &AppState, id: i64) -> Result<Course, AppError> {
    state
        .stores
        .courses
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))
}

pub async fn list_courses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.stores.courses.list().await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_course(&state, id).await?))
}

/// Lesson completion and accessibility for the signed-in user.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state, id).await?;
    let purchased = state
        .stores
        .progress
        .purchased_courses(&claims.sub)
        .await?
        .contains(&id);
    let completed = state.stores.progress.completed_lessons(&claims.sub, id).await?;

    Ok(Json(courses::course_progress(&course, purchased, &completed)))
}

/// Records a (mock) purchase. Buying twice is a no-op.
pub async fn purchase_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state, id).await?;
    if !course.is_paid {
        return Err(AppError::BadRequest("This course is free".to_string()));
    }

    let added = state.stores.progress.add_purchase(&claims.sub, id).await?;
    if added {
        tracing::info!("User {} purchased course {}", claims.sub, id);
    }

    Ok(Json(json!({
        "message": if added { "Course purchased successfully!" } else { "Course already purchased" },
        "courseId": id,
    })))
}

/// Marks an accessible lesson as completed.
pub async fn complete_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, lesson_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state, id).await?;
    let (module_index, lesson_index) = courses::locate_lesson(&course, lesson_id)
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

    let purchased = state
        .stores
        .progress
        .purchased_courses(&claims.sub)
        .await?
        .contains(&id);
    let completed = state.stores.progress.completed_lessons(&claims.sub, id).await?;

    if !courses::is_lesson_accessible(&course, purchased, &completed, module_index, lesson_index) {
        tracing::warn!(
            "User {} tried to complete locked lesson {} of course {}",
            claims.sub,
            lesson_id,
            id
        );
        return Err(AppError::Forbidden(
            "Complete the previous lessons first".to_string(),
        ));
    }

    let completed = state
        .stores
        .progress
        .mark_completed(&claims.sub, id, lesson_id)
        .await?;

    Ok(Json(courses::course_progress(&course, purchased, &completed)))
}

/// Adds a course to the catalogue.
/// Admin only.
pub async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = state
        .stores
        .courses
        .insert_with(|id| courses::build_course(id, payload))
        .await?;
    tracing::info!("Created course {} ({})", course.id, course.title);

    Ok((StatusCode::CREATED, Json(course)))
}
