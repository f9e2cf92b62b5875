use tracing::info;

use super::seed::achievements_for;
use super::{Db, DomainError};
use crate::auth::{require_user, AuthContext};
use crate::database::models::Achievement;
use crate::database::Filter;

#[derive(Clone)]
pub struct AchievementService {
    db: Db,
}

impl AchievementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn mine(&self, auth: &AuthContext) -> Result<Vec<Achievement>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;
        Ok(tx.find(Filter::eq("user_id", user.id)).await?)
    }

    /// Give the caller the standard achievement set unless they already have one.
    /// Returns the number inserted.
    pub async fn setup(&self, auth: &AuthContext) -> Result<usize, DomainError> {
        self.db
            .retry("setup_achievements", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;

                let existing: Vec<Achievement> = tx.find(Filter::eq("user_id", user.id).take(1)).await?;
                if !existing.is_empty() {
                    return Ok(0);
                }

                let achievements = achievements_for(user.id);
                for achievement in &achievements {
                    tx.insert(achievement).await?;
                }
                tx.commit().await?;

                info!("Seeded {} achievements for {}", achievements.len(), user.id);
                Ok(achievements.len())
            })
            .await
    }
}
