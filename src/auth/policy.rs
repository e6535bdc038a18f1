// auth/policy.rs - ownership checks for owner-scoped mutations

use uuid::Uuid;

use super::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("User not authorized")]
pub struct NotAuthorized;

/// Allow the mutation only when the caller is the recorded owner.
pub fn authorize(owner_id: Uuid, caller: &Identity) -> Result<(), NotAuthorized> {
    if owner_id == caller.id {
        Ok(())
    } else {
        Err(NotAuthorized)
    }
}
