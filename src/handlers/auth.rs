// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
    services::auth,
    state::AppState,
    utils::jwt::Claims,
};

/// Registers a new student account and signs it in.
///
/// Returns 201 Created with the token and the user (without password).
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = auth::register(&state.stores, payload).await?;
    let response = auth::open_session(&state.stores, &state.config, &user).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown e-mail addresses are signed up as students on the spot.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = auth::authenticate(&state.stores, payload.email.trim(), &payload.password).await?;
    let response = auth::open_session(&state.stores, &state.config, &user).await?;

    Ok(Json(response))
}

/// Removes the session record; the token stops working immediately.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    state.stores.users.close_session(&claims.sub).await?;
    state.sessions.discard(&claims.sub).await;
    tracing::info!("User {} signed out", claims.sub);

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::current_user(&state.stores, &claims.sub).await?;
    Ok(Json(user))
}

/// Updates the display name.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .stores
        .users
        .set_name(&claims.sub, payload.name.trim())
        .await?;
    state.stores.users.refresh_session(&user).await?;

    Ok(Json(PublicUser::from(&user)))
}
