/*
 * Responsibility
 * - preferences (user と 1:1) の取得 / upsert
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct PreferenceRow {
    pub currency: String,
    pub theme: String,
}

pub async fn find_by_user(db: &PgPool, user_id: i64) -> Result<Option<PreferenceRow>, RepoError> {
    let row = sqlx::query_as::<_, PreferenceRow>(
        r#"
        SELECT currency, theme
        FROM preferences
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn upsert(
    db: &PgPool,
    user_id: i64,
    currency: &str,
    theme: &str,
) -> Result<PreferenceRow, RepoError> {
    let row = sqlx::query_as::<_, PreferenceRow>(
        r#"
        INSERT INTO preferences (user_id, currency, theme)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET currency = EXCLUDED.currency,
            theme = EXCLUDED.theme
        RETURNING currency, theme
        "#,
    )
    .bind(user_id)
    .bind(currency)
    .bind(theme)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Insert defaults unless a row already exists; returns the stored row either way.
pub async fn get_or_create(
    db: &PgPool,
    user_id: i64,
    currency: &str,
    theme: &str,
) -> Result<PreferenceRow, RepoError> {
    sqlx::query(
        r#"
        INSERT INTO preferences (user_id, currency, theme)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(currency)
    .bind(theme)
    .execute(db)
    .await?;

    let row = find_by_user(db, user_id).await?.ok_or(RepoError::Db(sqlx::Error::RowNotFound))?;
    Ok(row)
}
