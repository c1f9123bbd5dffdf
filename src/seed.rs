/*
 * Responsibility
 * - 開発用の demo データ投入 (SEED_DEMO_DATA=true のときだけ app.rs から呼ぶ)
 * - 何度走っても同じ状態になる (既存 user / 既存 expense があれば触らない)
 */
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::repos::{
    expense_repo::{self, ExpenseFields},
    preference_repo, user_repo,
};
use crate::services::{auth::password, preferences};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "DemoPass123";

fn sample_expenses(now: DateTime<Utc>) -> [ExpenseFields<'static>; 2] {
    [
        ExpenseFields {
            title: "Coffee",
            amount: Decimal::new(350, 2),
            category: "Food",
            date: now,
            notes: Some("Latte"),
        },
        ExpenseFields {
            title: "Groceries",
            amount: Decimal::new(2500, 2),
            category: "Food",
            date: now - Duration::days(1),
            notes: Some("Milk and bread"),
        },
    ]
}

pub async fn run(db: &PgPool) -> Result<()> {
    let user = match user_repo::find_by_email(db, DEMO_EMAIL).await? {
        Some(user) => user,
        None => {
            let hash = password::hash_password(DEMO_PASSWORD)?;
            let user = user_repo::create(db, DEMO_EMAIL, &hash).await?;
            tracing::info!(user_id = user.id, "demo user created");
            user
        }
    };

    preference_repo::get_or_create(
        db,
        user.id,
        preferences::DEFAULT_CURRENCY,
        preferences::DEFAULT_THEME,
    )
    .await?;

    if expense_repo::list_by_user(db, user.id).await?.is_empty() {
        for fields in sample_expenses(Utc::now()) {
            expense_repo::create(db, user.id, &fields).await?;
        }
        tracing::info!(user_id = user.id, "demo expenses created");
    }

    Ok(())
}
