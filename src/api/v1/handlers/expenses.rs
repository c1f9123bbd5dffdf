/*
 * Responsibility
 * - /expenses 系 handler
 * - CurrentAuth (AuthContext) から acting identity を決めて service に渡す
 * - 所有者チェックは service 側 (update/delete の直前)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::expenses::{ExpenseRequest, ExpenseResponse},
        extractors::CurrentAuth,
    },
    error::AppError,
    services::{actor, expenses},
    state::AppState,
};

pub async fn list_expenses(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
) -> Result<Json<Vec<ExpenseResponse>>, AppError> {
    let actor = actor::require(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    let rows = expenses::list(state.expenses.as_ref(), &actor).await?;
    Ok(Json(rows.into_iter().map(ExpenseResponse::from).collect()))
}

pub async fn create_expense(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
    Json(req): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("VALIDATION_ERROR", m))?;

    let actor = actor::require(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    let row = expenses::create(state.expenses.as_ref(), &actor, &req.fields()).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_expense(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("VALIDATION_ERROR", m))?;

    let actor = actor::resolve(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    let row =
        expenses::update(state.expenses.as_ref(), id, actor.as_ref(), &req.fields()).await?;
    Ok(Json(row.into()))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let actor = actor::resolve(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    expenses::delete(state.expenses.as_ref(), id, actor.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
