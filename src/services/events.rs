use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::registration::{self, RegistrationOutcome};
use super::{Db, DomainError};
use crate::auth::{require_teacher, require_user, AuthContext};
use crate::database::models::{EventRegistration, SocialEvent};
use crate::database::Filter;
use crate::types::{EventRef, Id};

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub emoji: String,
    pub capacity: i64,
    #[serde(default)]
    pub color_theme: String,
}

impl EventInput {
    fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::invalid("title must not be empty"));
        }
        if self.capacity < 0 {
            return Err(DomainError::invalid("capacity must not be negative"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct EventService {
    db: Db,
}

impl EventService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<SocialEvent>, DomainError> {
        let mut tx = self.db.begin().await?;
        Ok(tx.find(Filter::all()).await?)
    }

    pub async fn get(&self, id: Id<SocialEvent>) -> Result<SocialEvent, DomainError> {
        let mut tx = self.db.begin().await?;
        tx.get(id).await?.ok_or(DomainError::NotFound("event"))
    }

    pub async fn create(&self, auth: &AuthContext, input: EventInput) -> Result<SocialEvent, DomainError> {
        input.validate()?;

        self.db
            .retry("create_event", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let event = SocialEvent {
                    id: Id::new(),
                    title: input.title.trim().to_string(),
                    description: input.description.clone(),
                    date: input.date.clone(),
                    time: input.time.clone(),
                    emoji: input.emoji.clone(),
                    registered: 0,
                    capacity: input.capacity,
                    color_theme: input.color_theme.clone(),
                    created_by: teacher.id,
                    created_at: Utc::now(),
                };
                tx.insert(&event).await?;
                tx.commit().await?;

                info!("{} created event {} ({})", teacher.id, event.id, event.title);
                Ok(event)
            })
            .await
    }

    /// Replace an event's details. The registration counter is kept; capacity
    /// may not drop below it.
    pub async fn update(&self, auth: &AuthContext, id: Id<SocialEvent>, input: EventInput) -> Result<SocialEvent, DomainError> {
        input.validate()?;

        self.db
            .retry("update_event", || async {
                let mut tx = self.db.begin().await?;
                require_teacher(&mut tx, auth).await?;

                let mut event = tx.get(id).await?.ok_or(DomainError::NotFound("event"))?;
                if input.capacity < event.registered {
                    return Err(DomainError::invalid(format!(
                        "capacity {} is below the {} already registered",
                        input.capacity, event.registered
                    )));
                }

                event.title = input.title.trim().to_string();
                event.description = input.description.clone();
                event.date = input.date.clone();
                event.time = input.time.clone();
                event.emoji = input.emoji.clone();
                event.capacity = input.capacity;
                event.color_theme = input.color_theme.clone();
                tx.save(&event).await?;
                tx.commit().await?;
                Ok(event)
            })
            .await
    }

    /// Delete an event along with its registrations and comments
    pub async fn delete(&self, auth: &AuthContext, id: Id<SocialEvent>) -> Result<(), DomainError> {
        self.db
            .retry("delete_event", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                if !tx.delete(id).await? {
                    return Err(DomainError::NotFound("event"));
                }

                let (registrations, comments) = registration::purge(&mut tx, EventRef::SocialEvent(id)).await?;
                tx.commit().await?;

                info!(
                    "{} deleted event {} with {} registrations and {} comments",
                    teacher.id, id, registrations, comments
                );
                Ok(())
            })
            .await
    }

    pub async fn toggle_registration(&self, auth: &AuthContext, id: Id<SocialEvent>) -> Result<RegistrationOutcome, DomainError> {
        self.db
            .retry("toggle_event_registration", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;
                let mut event = tx.get(id).await?.ok_or(DomainError::NotFound("event"))?;

                let outcome = registration::toggle(
                    &mut tx,
                    user.id,
                    EventRef::SocialEvent(id),
                    &mut event.registered,
                    event.capacity,
                )
                .await?;
                tx.save(&event).await?;
                tx.commit().await?;
                Ok(outcome)
            })
            .await
    }

    pub async fn my_registrations(&self, auth: &AuthContext) -> Result<Vec<EventRegistration>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;
        Ok(tx.find(Filter::eq("user_id", user.id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{services, sign_up};
    use crate::types::Role;

    fn input(capacity: i64) -> EventInput {
        EventInput {
            title: "Juleball".to_string(),
            description: "Dans og gløgg".to_string(),
            date: "2024-12-13".to_string(),
            time: "19:00".to_string(),
            emoji: "🎄".to_string(),
            capacity,
            color_theme: "red".to_string(),
        }
    }

    #[tokio::test]
    async fn concurrent_registrations_respect_capacity() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let a = sign_up(&services, "user_a", "A", Role::Student).await;
        let b = sign_up(&services, "user_b", "B", Role::Student).await;
        let event = services.events.create(&teacher, input(1)).await.unwrap();

        let (first, second) = tokio::join!(
            services.events.toggle_registration(&a, event.id),
            services.events.toggle_registration(&b, event.id)
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(r, Err(DomainError::EventFull))));
        assert_eq!(services.events.get(event.id).await.unwrap().registered, 1);

        let a_count = services.events.my_registrations(&a).await.unwrap().len();
        let b_count = services.events.my_registrations(&b).await.unwrap().len();
        assert_eq!(a_count + b_count, 1);
    }

    #[tokio::test]
    async fn toggle_registers_then_unregisters() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "Student", Role::Student).await;
        let event = services.events.create(&teacher, input(16)).await.unwrap();

        let on = services.events.toggle_registration(&student, event.id).await.unwrap();
        assert!(on.registered);
        assert_eq!(on.registered_count, 1);
        assert_eq!(services.events.my_registrations(&student).await.unwrap().len(), 1);

        let off = services.events.toggle_registration(&student, event.id).await.unwrap();
        assert!(!off.registered);
        assert_eq!(off.registered_count, 0);
        assert!(services.events.my_registrations(&student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_event_rejects_new_registrations() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let first = sign_up(&services, "user_a", "A", Role::Student).await;
        let second = sign_up(&services, "user_b", "B", Role::Student).await;
        let event = services.events.create(&teacher, input(1)).await.unwrap();

        services.events.toggle_registration(&first, event.id).await.unwrap();
        assert!(matches!(
            services.events.toggle_registration(&second, event.id).await,
            Err(DomainError::EventFull)
        ));
        assert_eq!(services.events.get(event.id).await.unwrap().registered, 1);
        assert!(services.events.my_registrations(&second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_registrations() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "Student", Role::Student).await;
        let event = services.events.create(&teacher, input(5)).await.unwrap();
        services.events.toggle_registration(&student, event.id).await.unwrap();

        services.events.delete(&teacher, event.id).await.unwrap();
        assert!(services.events.my_registrations(&student).await.unwrap().is_empty());
        assert!(matches!(services.events.get(event.id).await, Err(DomainError::NotFound("event"))));
    }

    #[tokio::test]
    async fn students_cannot_create_events() {
        let services = services();
        let student = sign_up(&services, "user_s", "Student", Role::Student).await;
        assert!(matches!(
            services.events.create(&student, input(5)).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(services.events.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn capacity_cannot_shrink_below_registrations() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "Student", Role::Student).await;
        let event = services.events.create(&teacher, input(5)).await.unwrap();
        services.events.toggle_registration(&student, event.id).await.unwrap();

        assert!(matches!(
            services.events.update(&teacher, event.id, input(0)).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(services.events.update(&teacher, event.id, input(1)).await.unwrap().capacity, 1);
    }
}
