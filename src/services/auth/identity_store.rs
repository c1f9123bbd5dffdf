//! Resolves a token subject (email) to a full [`Identity`].
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::error::RepoError;
use crate::repos::user_repo;
use crate::services::auth::identity::Identity;

/// Identity lookup used by the authentication middleware.
///
/// Returns:
/// - `Ok(Some(_))` => known subject
/// - `Ok(None)`    => unknown subject
/// - `Err(_)`      => backend failure (no retry here; retry/timeout policy belongs to the store)
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    // Store name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn load(&self, subject_id: &str) -> Result<Option<Identity>, RepoError>;
}

/// Postgres-backed store over the `users` table.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    db: PgPool,
}

impl PgIdentityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self, subject_id: &str) -> Result<Option<Identity>, RepoError> {
        let row = user_repo::find_by_email(&self.db, subject_id).await?;
        Ok(row.map(|u| Identity::new(u.email, u.id)))
    }
}

/// In-process store for router and middleware tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: std::collections::HashMap<String, Identity>,
}

#[cfg(test)]
impl MemoryIdentityStore {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|id| (id.subject_id().to_string(), id))
                .collect(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, subject_id: &str) -> Result<Option<Identity>, RepoError> {
        Ok(self.identities.get(subject_id).cloned())
    }
}
