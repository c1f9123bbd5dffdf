/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, tokens: TokenService, identities: IdentityStore, expenses: ExpenseStore など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト単位の状態 (AuthContext) はここに置かない
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AuthFailMode;
use crate::middleware::auth::Authenticator;
use crate::services::auth::{IdentityStore, TokenService};
use crate::services::expense_store::ExpenseStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub identities: Arc<dyn IdentityStore>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub auth_fail_mode: AuthFailMode,
    pub fallback_subject: Option<Arc<str>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("identities", &self.identities.backend_name())
            .field("expenses", &self.expenses.backend_name())
            .field("auth_fail_mode", &self.auth_fail_mode)
            .field("fallback_subject", &self.fallback_subject)
            .finish()
    }
}

impl AppState {
    pub fn new(
        db: PgPool,
        tokens: Arc<TokenService>,
        identities: Arc<dyn IdentityStore>,
        expenses: Arc<dyn ExpenseStore>,
        auth_fail_mode: AuthFailMode,
        fallback_subject: Option<String>,
    ) -> Self {
        Self {
            db,
            tokens,
            identities,
            expenses,
            auth_fail_mode,
            fallback_subject: fallback_subject.map(Arc::from),
        }
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(
            self.tokens.clone(),
            self.identities.clone(),
            self.auth_fail_mode,
        )
    }
}
