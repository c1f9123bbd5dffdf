/*
 * Responsibility
 * - GET/PUT /prefs (acting identity の表示設定)
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::preferences::{PreferenceRequest, PreferenceResponse},
        extractors::CurrentAuth,
    },
    error::AppError,
    services::{actor, preferences},
    state::AppState,
};

pub async fn get_preferences(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
) -> Result<Json<PreferenceResponse>, AppError> {
    let actor = actor::require(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    let row = preferences::get(&state.db, &actor).await?;
    Ok(Json(row.into()))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    CurrentAuth(ctx): CurrentAuth,
    Json(req): Json<PreferenceRequest>,
) -> Result<Json<PreferenceResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("VALIDATION_ERROR", m))?;

    let actor = actor::require(&ctx, state.fallback_subject.as_deref(), state.identities.as_ref())
        .await?;

    let row = preferences::update(&state.db, &actor, &req.currency, &req.theme).await?;
    Ok(Json(row.into()))
}
