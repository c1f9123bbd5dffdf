/*
 * Responsibility
 * - expenses CRUD
 * - 一覧はクエリ側で所有者 (user_id) に絞る
 * - 取得系は users を JOIN して owner_id (= 所有者の email) を返す (OwnershipGuard 用)
 * - user_id の FK (CASCADE) 前提で削除挙動を意識
 */
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub user_id: i64,
    pub owner_id: String,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Column values written on create/update.
#[derive(Debug, Clone)]
pub struct ExpenseFields<'a> {
    pub title: &'a str,
    pub amount: Decimal,
    pub category: &'a str,
    pub date: DateTime<Utc>,
    pub notes: Option<&'a str>,
}

pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<ExpenseRow>, RepoError> {
    let rows = sqlx::query_as::<_, ExpenseRow>(
        r#"
        SELECT
            e.id, e.user_id, u.email AS owner_id,
            e.title, e.amount, e.category, e.date, e.notes
        FROM expenses e
        JOIN users u ON u.id = e.user_id
        WHERE e.user_id = $1
        ORDER BY e.date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    user_id: i64,
    fields: &ExpenseFields<'_>,
) -> Result<ExpenseRow, RepoError> {
    let row = sqlx::query_as::<_, ExpenseRow>(
        r#"
        WITH inserted AS (
            INSERT INTO expenses (id, user_id, title, amount, category, date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        )
        SELECT
            i.id, i.user_id, u.email AS owner_id,
            i.title, i.amount, i.category, i.date, i.notes
        FROM inserted i
        JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(fields.title)
    .bind(fields.amount)
    .bind(fields.category)
    .bind(fields.date)
    .bind(fields.notes)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<ExpenseRow>, RepoError> {
    let row = sqlx::query_as::<_, ExpenseRow>(
        r#"
        SELECT
            e.id, e.user_id, u.email AS owner_id,
            e.title, e.amount, e.category, e.date, e.notes
        FROM expenses e
        JOIN users u ON u.id = e.user_id
        WHERE e.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// `user_id` is the owner already confirmed by the guard; it is repeated in the WHERE clause.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    user_id: i64,
    fields: &ExpenseFields<'_>,
) -> Result<Option<ExpenseRow>, RepoError> {
    let row = sqlx::query_as::<_, ExpenseRow>(
        r#"
        WITH updated AS (
            UPDATE expenses
            SET
                title = $3,
                amount = $4,
                category = $5,
                date = $6,
                notes = $7
            WHERE id = $1 AND user_id = $2
            RETURNING *
        )
        SELECT
            d.id, d.user_id, u.email AS owner_id,
            d.title, d.amount, d.category, d.date, d.notes
        FROM updated d
        JOIN users u ON u.id = d.user_id
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(fields.title)
    .bind(fields.amount)
    .bind(fields.category)
    .bind(fields.date)
    .bind(fields.notes)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid, user_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM expenses
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
