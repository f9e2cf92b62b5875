use chrono::Utc;

use super::{Db, DomainError};
use crate::auth::{require_owner, require_user, AuthContext};
use crate::database::models::{EventComment, ScheduleItem, SocialEvent};
use crate::database::{Filter, Tx};
use crate::types::{EventRef, Id};

async fn event_exists(tx: &mut Tx, event: EventRef) -> Result<bool, DomainError> {
    Ok(match event {
        EventRef::ScheduleItem(id) => tx.get::<ScheduleItem>(id).await?.is_some(),
        EventRef::SocialEvent(id) => tx.get::<SocialEvent>(id).await?.is_some(),
    })
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Comments on an event, oldest first
    pub async fn list(&self, event: EventRef) -> Result<Vec<EventComment>, DomainError> {
        let mut tx = self.db.begin().await?;
        let mut comments: Vec<EventComment> = tx.find(Filter::eq("event", event)).await?;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    pub async fn add(&self, auth: &AuthContext, event: EventRef, message: &str) -> Result<EventComment, DomainError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::invalid("comment must not be empty"));
        }

        self.db
            .retry("add_comment", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;

                if !event_exists(&mut tx, event).await? {
                    return Err(DomainError::NotFound("event"));
                }

                let comment = EventComment {
                    id: Id::new(),
                    event,
                    user_id: user.id,
                    author_name: user.name.clone(),
                    message: message.to_string(),
                    created_at: Utc::now(),
                };
                tx.insert(&comment).await?;
                tx.commit().await?;
                Ok(comment)
            })
            .await
    }

    pub async fn delete(&self, auth: &AuthContext, id: Id<EventComment>) -> Result<(), DomainError> {
        self.db
            .retry("delete_comment", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;

                let comment = tx.get(id).await?.ok_or(DomainError::NotFound("comment"))?;
                require_owner(&user, comment.user_id)?;

                tx.delete(id).await?;
                tx.commit().await?;
                Ok(())
            })
            .await
    }
}
