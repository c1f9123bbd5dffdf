/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / OwnershipError を統一的に変換
 *
 * Body:
 *   {"error": {"code": "...", "message": "...", "timestamp": "...", "path": "..."}}
 * - path はここでは分からないので middleware::error_path が後から埋める
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::authz::OwnershipError;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized("authentication required")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found.")),
            AppError::Conflict { code, message } => (code, message),
            AppError::Unauthorized(message) => ("UNAUTHORIZED", message.to_string()),
            AppError::Forbidden(message) => ("FORBIDDEN", message.to_string()),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorBody {
            code,
            message,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: None,
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: body.clone(),
            }),
        )
            .into_response();
        // error_path middleware が path を埋めて body を作り直す
        res.extensions_mut().insert(body);
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "conflict"),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<OwnershipError> for AppError {
    fn from(e: OwnershipError) -> Self {
        match e {
            OwnershipError::Unauthenticated => AppError::unauthenticated(),
            OwnershipError::OwnershipViolation => {
                AppError::Forbidden("cannot modify another user's resource")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ownership_violation_maps_to_403() {
        let res = AppError::from(OwnershipError::OwnershipViolation).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.extensions().get::<ErrorBody>().is_some());

        let json = body_json(res).await;
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert!(json["error"]["timestamp"].is_string());
        assert!(json["error"].get("path").is_none());
    }

    #[tokio::test]
    async fn unauthenticated_maps_to_401() {
        let res = AppError::from(OwnershipError::Unauthenticated).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(res).await;
        assert_eq!(json["error"]["message"], "authentication required");
    }

    #[test]
    fn repo_conflict_maps_to_409() {
        assert_eq!(AppError::from(RepoError::Conflict).status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn not_found_message_names_resource() {
        let json = body_json(AppError::not_found("expense").into_response()).await;
        assert_eq!(json["error"]["message"], "expense not found.");
    }
}
