/*
 * Responsibility
 * - expenses のユースケース (list / create / update / delete)
 * - update / delete は commit 直前に OwnershipGuard を通す
 * - list はクエリ側で所有者に絞るので guard は通さない
 * - 書き込みには Capability::User が要る
 */
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::expense_repo::{ExpenseFields, ExpenseRow};
use crate::services::auth::{Capability, Identity};
use crate::services::authz::ownership;
use crate::services::expense_store::ExpenseStore;

fn ensure_can_write(actor: &Identity) -> Result<(), AppError> {
    if !actor.has(Capability::User) {
        tracing::warn!(subject = actor.subject_id(), "write without USER capability");
        return Err(AppError::Forbidden("missing USER capability"));
    }
    Ok(())
}

pub async fn list(store: &dyn ExpenseStore, actor: &Identity) -> Result<Vec<ExpenseRow>, AppError> {
    Ok(store.list_by_owner(actor.user_id()).await?)
}

pub async fn create(
    store: &dyn ExpenseStore,
    actor: &Identity,
    fields: &ExpenseFields<'_>,
) -> Result<ExpenseRow, AppError> {
    ensure_can_write(actor)?;

    let row = store.create(actor, fields).await?;
    tracing::info!(expense_id = %row.id, owner = %row.owner_id, "expense created");
    Ok(row)
}

/// Loads the row, runs the guard, then commits. Missing rows are 404 before the guard runs.
async fn load_owned(
    store: &dyn ExpenseStore,
    id: Uuid,
    actor: Option<&Identity>,
) -> Result<ExpenseRow, AppError> {
    let existing = store
        .get(id)
        .await?
        .ok_or(AppError::not_found("expense"))?;

    ownership::check(&existing.owner_id, actor)?;
    if let Some(actor) = actor {
        ensure_can_write(actor)?;
    }
    Ok(existing)
}

pub async fn update(
    store: &dyn ExpenseStore,
    id: Uuid,
    actor: Option<&Identity>,
    fields: &ExpenseFields<'_>,
) -> Result<ExpenseRow, AppError> {
    let existing = load_owned(store, id, actor).await?;

    // guard 通過後なので existing.user_id == actor の user_id
    store
        .update(id, existing.user_id, fields)
        .await?
        .ok_or(AppError::not_found("expense"))
}

pub async fn delete(
    store: &dyn ExpenseStore,
    id: Uuid,
    actor: Option<&Identity>,
) -> Result<(), AppError> {
    let existing = load_owned(store, id, actor).await?;

    if !store.delete(id, existing.user_id).await? {
        return Err(AppError::not_found("expense"));
    }
    tracing::info!(expense_id = %id, owner = %existing.owner_id, "expense deleted");
    Ok(())
}
