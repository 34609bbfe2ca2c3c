// src/handlers/session.rs

//! Self-assessment session endpoints. Every response carries the new
//! session state and the notices raised by the action.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::feedback::ShareResultRequest,
    services::payment::{PaymentCategory, PaymentMethod},
    state::AppState,
    utils::{jwt::Claims, mailer::ResultShare},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[validate(length(min = 1))]
    pub assessment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    pub option: usize,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: PaymentCategory,
}

#[derive(Debug, Deserialize)]
pub struct MethodRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CouponRequest {
    #[validate(length(min = 1, max = 50, message = "Please enter a coupon code."))]
    pub code: String,
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    Json(state.sessions.snapshot(&claims.session_user()).await)
}

pub async fn start(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = state
        .sessions
        .start(&claims.session_user(), &payload.assessment_id)
        .await?;
    Ok(Json(response))
}

pub async fn answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .sessions
        .answer(&claims.session_user(), &payload.question_id, payload.option)
        .await?;
    Ok(Json(response))
}

pub async fn next(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.next(&claims.session_user()).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.complete(&claims.session_user()).await?))
}

pub async fn back(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.back(&claims.session_user()).await?))
}

pub async fn open_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.open_admin(&claims.session_user()).await?))
}

pub async fn open_admin_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .sessions
            .open_admin_payments(&claims.session_user())
            .await?,
    ))
}

pub async fn select_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .sessions
        .select_payment_category(&claims.session_user(), payload.category)
        .await?;
    Ok(Json(response))
}

pub async fn clear_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .sessions
            .clear_payment_category(&claims.session_user())
            .await?,
    ))
}

pub async fn select_method(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MethodRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .sessions
        .select_payment_method(&claims.session_user(), payload.method)
        .await?;
    Ok(Json(response))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CouponRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = state
        .sessions
        .apply_coupon(&claims.session_user(), &payload.code)
        .await?;
    Ok(Json(response))
}

pub async fn simulate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .sessions
            .simulate_payment(&claims.session_user())
            .await?,
    ))
}

/// E-mails the result currently on screen.
pub async fn share_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ShareResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = state
        .sessions
        .last_result(&claims.sub)
        .await
        .ok_or(AppError::BadRequest("There is no result to share".to_string()))?;

    let share = ResultShare::new(payload.email.trim(), &result.assessment_title, result.score);
    state.mailer.send_result(&share).await?;

    Ok(Json(json!({ "message": "Result summary sent successfully!" })))
}
