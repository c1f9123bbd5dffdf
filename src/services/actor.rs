/*
 * Responsibility
 * - 「この操作を誰として行うか」(acting identity) を決める
 * - AuthContext に identity があればそれ、無ければ設定された fallback identity
 * - fallback も無ければ None (呼び出し側で 401 / OwnershipGuard に任せる)
 *
 * AuthContext 自体は書き換えない (token 無しなら AuthContext は空のまま)
 */
use crate::api::v1::extractors::AuthContext;
use crate::error::AppError;
use crate::services::auth::{Identity, IdentityStore};

pub async fn resolve(
    ctx: &AuthContext,
    fallback_subject: Option<&str>,
    identities: &dyn IdentityStore,
) -> Result<Option<Identity>, AppError> {
    if let Some(identity) = ctx.identity() {
        return Ok(Some(identity.clone()));
    }

    let Some(subject) = fallback_subject else {
        return Ok(None);
    };

    let identity = identities.load(subject).await?;
    if identity.is_none() {
        tracing::warn!(subject, "fallback identity not found (not seeded?)");
    }
    Ok(identity)
}

/// list/create のように identity が必須の操作用
pub async fn require(
    ctx: &AuthContext,
    fallback_subject: Option<&str>,
    identities: &dyn IdentityStore,
) -> Result<Identity, AppError> {
    resolve(ctx, fallback_subject, identities)
        .await?
        .ok_or_else(AppError::unauthenticated)
}
