use tracing::{debug, warn};

use super::{resolve_external_id, AuthContext};
use crate::database::models::User;
use crate::database::Tx;
use crate::services::directory::find_by_external_id;
use crate::services::DomainError;
use crate::types::Id;

/// Resolve the caller and load their user record.
pub async fn require_user(tx: &mut Tx, auth: &AuthContext) -> Result<User, DomainError> {
    let external_id = resolve_external_id(auth)?.ok_or(DomainError::Unauthenticated)?;

    match find_by_external_id(tx, &external_id).await? {
        Some(user) => {
            debug!("Authenticated {} as {}", external_id, user.id);
            Ok(user)
        }
        None => {
            warn!("No user record for external id {}; has the webhook or store_user run?", external_id);
            Err(DomainError::UserNotFound)
        }
    }
}

/// Like `require_user`, but the caller must be a teacher.
pub async fn require_teacher(tx: &mut Tx, auth: &AuthContext) -> Result<User, DomainError> {
    let user = require_user(tx, auth).await?;
    if !user.is_teacher() {
        warn!("User {} attempted a teacher-only operation", user.id);
        return Err(DomainError::Unauthorized);
    }
    Ok(user)
}

pub fn require_owner(user: &User, owner: Id<User>) -> Result<(), DomainError> {
    if user.id != owner {
        warn!("User {} attempted to act on a record owned by {}", user.id, owner);
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}
