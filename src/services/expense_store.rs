//! Storage seam for expenses, so the guard-then-commit flow can be driven without Postgres.
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::expense_repo::{self, ExpenseFields, ExpenseRow};
use crate::services::auth::Identity;

/// Rows always carry `owner_id` (the owner's subject id) for the ownership guard.
///
/// `update` / `delete` repeat `user_id` in their filter; `None` / `false` means no row matched.
#[async_trait]
pub trait ExpenseStore: Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<ExpenseRow>, RepoError>;

    async fn create(
        &self,
        owner: &Identity,
        fields: &ExpenseFields<'_>,
    ) -> Result<ExpenseRow, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<ExpenseRow>, RepoError>;

    async fn update(
        &self,
        id: Uuid,
        user_id: i64,
        fields: &ExpenseFields<'_>,
    ) -> Result<Option<ExpenseRow>, RepoError>;

    async fn delete(&self, id: Uuid, user_id: i64) -> Result<bool, RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgExpenseStore {
    db: PgPool,
}

impl PgExpenseStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<ExpenseRow>, RepoError> {
        expense_repo::list_by_user(&self.db, user_id).await
    }

    async fn create(
        &self,
        owner: &Identity,
        fields: &ExpenseFields<'_>,
    ) -> Result<ExpenseRow, RepoError> {
        expense_repo::create(&self.db, owner.user_id(), fields).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<ExpenseRow>, RepoError> {
        expense_repo::get(&self.db, id).await
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: i64,
        fields: &ExpenseFields<'_>,
    ) -> Result<Option<ExpenseRow>, RepoError> {
        expense_repo::update(&self.db, id, user_id, fields).await
    }

    async fn delete(&self, id: Uuid, user_id: i64) -> Result<bool, RepoError> {
        expense_repo::delete(&self.db, id, user_id).await
    }
}

#[cfg(test)]
pub use memory::MemoryExpenseStore;
