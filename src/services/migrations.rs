use tracing::info;

use super::{Db, DomainError};
use crate::database::models::User;
use crate::database::Filter;
use crate::types::Role;

/// One-shot data fixes, run from the admin CLI
#[derive(Clone)]
pub struct MigrationService {
    db: Db,
}

impl MigrationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Store an explicit `student` role on users created before roles existed.
    /// Returns the number of users patched.
    pub async fn backfill_roles(&self) -> Result<usize, DomainError> {
        self.db
            .retry("backfill_roles", || async {
                let mut tx = self.db.begin().await?;
                let users: Vec<User> = tx.find(Filter::all()).await?;

                let mut patched = 0;
                for mut user in users.into_iter().filter(|u| u.role.is_none()) {
                    user.role = Some(Role::Student);
                    tx.save(&user).await?;
                    patched += 1;
                }
                tx.commit().await?;

                info!("Backfilled role on {} users", patched);
                Ok(patched)
            })
            .await
    }
}
