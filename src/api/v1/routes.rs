/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /auth, /expenses, /prefs
 * - 認証 middleware は app.rs で Router 全体に掛ける (route ごとに分けない)
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{login, me, register},
    expenses::{create_expense, delete_expense, list_expenses, update_expense},
    health::health,
    preferences::{get_preferences, update_preferences},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/{id}", put(update_expense).delete(delete_expense))
        .route("/prefs", get(get_preferences).put(update_preferences))
}
