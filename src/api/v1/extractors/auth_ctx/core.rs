use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::AuthContext;

/// Handler で AuthContext を受け取るための extractor
/// 認証 middleware が AuthContext を request.extensions() に insert 済みである前提
/// (未認証でも空の AuthContext が入っている)
/// 見つからない場合は middleware 未設定なので 500 を返す
pub struct CurrentAuth(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentAuth)
            .ok_or_else(|| {
                tracing::error!("AuthContext not found - auth middleware not configured");
                AppError::Internal
            })
    }
}
