/*
 * Responsibility
 * - POST /auth/register, POST /auth/login: 資格情報を確認して bearer token を発行
 * - GET /auth/me: AuthContext の identity をそのまま返す (fallback identity は使わない)
 * - パスワード hash は CPU を食うので spawn_blocking で回す
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
        extractors::CurrentAuth,
    },
    error::AppError,
    repos::{error::RepoError, user_repo},
    services::auth::{Identity, password},
    state::AppState,
};

fn issue(state: &AppState, identity: &Identity) -> Result<AuthResponse, AppError> {
    Ok(state.tokens.generate(identity)?.into())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("VALIDATION_ERROR", m))?;

    let RegisterRequest { email, password: plain } = req;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            AppError::Internal
        })??;

    let user = user_repo::create(&state.db, email.trim(), &hash)
        .await
        .map_err(|e| match e {
            RepoError::Conflict => AppError::conflict("EMAIL_TAKEN", "email is already registered"),
            other => other.into(),
        })?;
    tracing::info!(user_id = user.id, "user registered");

    let res = issue(&state, &Identity::new(user.email, user.id))?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("VALIDATION_ERROR", m))?;

    let user = user_repo::find_by_email(&state.db, req.email.trim()).await?;

    // unknown email でも Argon2 を 1 回回して、応答時間から登録有無を推測させない
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let plain = req.password;
    let ok = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => password::verify_password(&hash, &plain),
        None => {
            password::verify_dummy(&plain);
            false
        }
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "password verification task failed");
        AppError::Internal
    })?;

    let user = match user {
        Some(user) if ok => user,
        Some(user) => {
            tracing::debug!(user_id = user.id, "login with wrong password");
            return Err(AppError::Unauthorized("invalid credentials"));
        }
        None => {
            tracing::debug!("login for unknown email");
            return Err(AppError::Unauthorized("invalid credentials"));
        }
    };

    Ok(Json(issue(&state, &Identity::new(user.email, user.id))?))
}

pub async fn me(CurrentAuth(ctx): CurrentAuth) -> Result<Json<MeResponse>, AppError> {
    let identity = ctx.identity().ok_or_else(AppError::unauthenticated)?;

    Ok(Json(MeResponse {
        email: identity.subject_id().to_string(),
        capabilities: identity.capabilities().iter().map(|c| c.as_str()).collect(),
    }))
}
