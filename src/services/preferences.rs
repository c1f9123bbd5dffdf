/*
 * Responsibility
 * - 表示設定 (currency / theme) の取得と更新
 * - 未作成なら既定値 (USD / neon) で作る
 */
use sqlx::PgPool;

use crate::error::AppError;
use crate::repos::preference_repo::{self, PreferenceRow};
use crate::services::auth::Identity;

pub const ALLOWED_CURRENCIES: [&str; 4] = ["USD", "EUR", "INR", "GBP"];
pub const ALLOWED_THEMES: [&str; 2] = ["neon", "light"];

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_THEME: &str = "neon";

pub async fn get(db: &PgPool, actor: &Identity) -> Result<PreferenceRow, AppError> {
    Ok(
        preference_repo::get_or_create(db, actor.user_id(), DEFAULT_CURRENCY, DEFAULT_THEME)
            .await?,
    )
}

pub async fn update(
    db: &PgPool,
    actor: &Identity,
    currency: &str,
    theme: &str,
) -> Result<PreferenceRow, AppError> {
    Ok(preference_repo::upsert(db, actor.user_id(), currency, theme).await?)
}
