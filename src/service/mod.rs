use uuid::Uuid;

use crate::error::ApiError;
use crate::models::SoftDelete;

mod organization;
mod person;
mod publication;
mod role;

pub use organization::OrganizationService;
pub use person::PersonService;
pub use publication::PublicationService;
pub use role::RoleService;

/// Soft-Delete Guard
///
/// Collapses "absent" and "soft-deleted" into the same not-found outcome.
/// Every read, update, delete and subscribe path goes through this before
/// touching the record.
pub fn visible<T: SoftDelete>(record: Option<T>, what: &'static str) -> Result<T, ApiError> {
    match record {
        Some(record) if !record.is_hidden() => Ok(record),
        _ => Err(ApiError::NotFound(what)),
    }
}

/// Ownership Guard
///
/// Succeeds only on exact identifier match between the record's owner and the
/// authenticated principal. No side effects.
pub fn ensure_owner(owner: Uuid, principal: Uuid) -> Result<(), ApiError> {
    if owner == principal {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}
