use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{Db, DomainError};
use crate::auth::{require_owner, require_teacher, AuthContext};
use crate::database::models::Announcement;
use crate::database::Filter;
use crate::types::Id;

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementInput {
    pub title: String,
    pub content: String,
}

impl AnnouncementInput {
    fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(DomainError::invalid("title and content must not be empty"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AnnouncementService {
    db: Db,
    limit: usize,
}

impl AnnouncementService {
    pub fn new(db: Db, limit: usize) -> Self {
        Self { db, limit }
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Announcement>, DomainError> {
        let mut tx = self.db.begin().await?;
        let mut announcements: Vec<Announcement> = tx.find(Filter::all()).await?;
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        announcements.truncate(self.limit);
        Ok(announcements)
    }

    pub async fn create(&self, auth: &AuthContext, input: AnnouncementInput) -> Result<Announcement, DomainError> {
        input.validate()?;

        self.db
            .retry("create_announcement", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let announcement = Announcement {
                    id: Id::new(),
                    title: input.title.trim().to_string(),
                    content: input.content.trim().to_string(),
                    created_by: teacher.id,
                    author_name: teacher.name.clone(),
                    created_at: Utc::now(),
                    updated_at: None,
                };
                tx.insert(&announcement).await?;
                tx.commit().await?;

                info!("{} posted announcement {}", teacher.id, announcement.id);
                Ok(announcement)
            })
            .await
    }

    pub async fn update(&self, auth: &AuthContext, id: Id<Announcement>, input: AnnouncementInput) -> Result<Announcement, DomainError> {
        input.validate()?;

        self.db
            .retry("update_announcement", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let mut announcement = tx.get(id).await?.ok_or(DomainError::NotFound("announcement"))?;
                require_owner(&teacher, announcement.created_by)?;

                announcement.title = input.title.trim().to_string();
                announcement.content = input.content.trim().to_string();
                announcement.updated_at = Some(Utc::now());
                tx.save(&announcement).await?;
                tx.commit().await?;
                Ok(announcement)
            })
            .await
    }

    pub async fn delete(&self, auth: &AuthContext, id: Id<Announcement>) -> Result<(), DomainError> {
        self.db
            .retry("delete_announcement", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let announcement = tx.get(id).await?.ok_or(DomainError::NotFound("announcement"))?;
                require_owner(&teacher, announcement.created_by)?;

                tx.delete(id).await?;
                tx.commit().await?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{services, sign_up};
    use crate::types::Role;

    fn input(title: &str) -> AnnouncementInput {
        AnnouncementInput {
            title: title.to_string(),
            content: "Husk gymtøy".to_string(),
        }
    }

    #[tokio::test]
    async fn teachers_post_and_everyone_reads_newest_first() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Lærer", Role::Teacher).await;

        services.announcements.create(&teacher, input("Første")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        services.announcements.create(&teacher, input("Andre")).await.unwrap();

        let listed = services.announcements.list().await.unwrap();
        assert_eq!(listed[0].title, "Andre");
        assert_eq!(listed[1].author_name, "Lærer");
    }

    #[tokio::test]
    async fn only_the_author_may_edit() {
        let services = services();
        let author = sign_up(&services, "user_a", "A", Role::Teacher).await;
        let colleague = sign_up(&services, "user_b", "B", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "S", Role::Student).await;
        let posted = services.announcements.create(&author, input("Tur")).await.unwrap();

        assert!(matches!(
            services.announcements.update(&colleague, posted.id, input("Endret")).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            services.announcements.delete(&student, posted.id).await,
            Err(DomainError::Unauthorized)
        ));

        let updated = services.announcements.update(&author, posted.id, input("Endret")).await.unwrap();
        assert_eq!(updated.title, "Endret");
        assert!(updated.updated_at.is_some());

        services.announcements.delete(&author, posted.id).await.unwrap();
        assert!(services.announcements.list().await.unwrap().is_empty());
    }
}
