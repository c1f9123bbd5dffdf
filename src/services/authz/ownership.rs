//! Single-owner check run right before an update/delete is committed.
//!
//! Reads/lists never go through here: they are scoped by owner in the query itself.
use thiserror::Error;

use crate::services::auth::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("resource is owned by another identity")]
    OwnershipViolation,
}

/// `resource_owner_id` is the owner's subject id, fixed at creation.
///
/// A rejection is final for the request; callers must not retry.
pub fn check(resource_owner_id: &str, current: Option<&Identity>) -> Result<(), OwnershipError> {
    let identity = current.ok_or(OwnershipError::Unauthenticated)?;

    if identity.subject_id() != resource_owner_id {
        tracing::warn!(
            subject = identity.subject_id(),
            owner = resource_owner_id,
            "ownership violation"
        );
        return Err(OwnershipError::OwnershipViolation);
    }

    Ok(())
}
