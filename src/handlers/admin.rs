// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        transaction::{Transaction, TransactionListParams, TransactionSummary},
        user::{PublicUser, Role, UpdateRoleRequest, UserListParams},
    },
    services::{
        payment::{self, LedgerAction, LedgerFilter},
        stats,
    },
    state::AppState,
};

/// Lists users, filtered by name/e-mail substring and role.
/// Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let role = match params.role.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(r) => Some(
            Role::parse(r).ok_or_else(|| AppError::BadRequest(format!("Unknown role '{}'", r)))?,
        ),
    };
    let search = params.search.unwrap_or_default().trim().to_lowercase();

    let users: Vec<PublicUser> = state
        .stores
        .users
        .list()
        .await?
        .iter()
        .filter(|u| role.is_none_or(|r| u.role == r))
        .filter(|u| {
            search.is_empty()
                || u.name.to_lowercase().contains(&search)
                || u.email.to_lowercase().contains(&search)
        })
        .map(PublicUser::from)
        .collect();

    Ok(Json(users))
}

/// Admin only.
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.stores.users.set_role(&id, payload.role).await?;
    state.stores.users.refresh_session(&user).await?;
    tracing::info!("User {} is now {}", user.id, user.role.as_str());

    Ok(Json(PublicUser::from(&user)))
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub transactions: Vec<Transaction>,
    pub summary: TransactionSummary,
}

/// Lists transactions matching the filters, newest first.
/// The summary covers the whole ledger.
/// Admin only.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = LedgerFilter::from_params(&params)?;
    let ledger = state.stores.transactions.list().await?;
    let summary = payment::summarize(&ledger);

    let mut transactions: Vec<Transaction> =
        ledger.into_iter().filter(|t| filter.matches(t)).collect();
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(Json(LedgerResponse {
        transactions,
        summary,
    }))
}

async fn apply_ledger_action(
    state: &AppState,
    id: &str,
    action: LedgerAction,
) -> Result<Transaction, AppError> {
    let txn = state
        .stores
        .transactions
        .transition(id, |current| payment::apply_action(action, current))
        .await
        .inspect_err(|e| tracing::warn!("{:?} of transaction {} refused: {}", action, id, e))?;

    tracing::info!("Transaction {} is now {}", txn.id, txn.status.as_str());
    Ok(txn)
}

/// `pending → completed`.
/// Admin only.
pub async fn confirm_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = apply_ledger_action(&state, &id, LedgerAction::Confirm).await?;
    Ok(Json(json!({
        "message": format!("Payment for transaction {} confirmed!", txn.id),
        "transaction": txn,
    })))
}

/// `completed → refunded`.
/// Admin only.
pub async fn refund_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = apply_ledger_action(&state, &id, LedgerAction::Refund).await?;
    Ok(Json(json!({
        "message": format!("Refund simulated for transaction {}!", txn.id),
        "transaction": txn,
    })))
}

/// Appends a random pending payment.
/// Admin only.
pub async fn simulate_incoming(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state
        .stores
        .transactions
        .append(payment::simulated_incoming(Utc::now()))
        .await?;
    tracing::info!("Simulated incoming payment {} ({:.2})", txn.id, txn.amount);

    Ok((StatusCode::CREATED, Json(txn)))
}

/// Admin only.
pub async fn analytics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.stores.users.list().await?;
    let courses = state.stores.courses.list().await?;
    let assessments = state.stores.assessments.list().await?;
    let history = state.stores.history.list().await?;
    let ledger = state.stores.transactions.list().await?;

    Ok(Json(stats::analytics(
        users.len(),
        courses.len(),
        &assessments,
        &history,
        &ledger,
    )))
}
