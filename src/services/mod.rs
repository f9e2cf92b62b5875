pub mod achievements;
pub mod announcements;
pub mod classes;
pub mod comments;
pub mod coupons;
pub mod directory;
pub mod error;
pub mod events;
pub mod migrations;
pub mod registration;
pub mod schedule;
pub mod seed;

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::database::{DocumentStore, Tx};

pub use achievements::AchievementService;
pub use announcements::AnnouncementService;
pub use classes::ClassService;
pub use comments::CommentService;
pub use coupons::CouponService;
pub use directory::UserDirectory;
pub use error::DomainError;
pub use events::EventService;
pub use migrations::MigrationService;
pub use schedule::ScheduleService;

/// Store handle shared by the services
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl Db {
    pub fn new(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn begin(&self) -> Result<Tx, DomainError> {
        Ok(Tx::begin(self.store.as_ref()).await?)
    }

    /// Run `attempt` until it succeeds, fails for a reason other than a
    /// transaction conflict, or runs out of attempts.
    ///
    /// Each attempt must open, use and commit its own transaction.
    pub async fn retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && tries < self.max_attempts => {
                    warn!("{} hit a transaction conflict (attempt {}/{}), retrying", operation, tries, self.max_attempts);
                    tries += 1;
                }
                result => return result,
            }
        }
    }
}

/// All domain services, cloned into each request
#[derive(Clone)]
pub struct Services {
    pub users: UserDirectory,
    pub schedule: ScheduleService,
    pub events: EventService,
    pub coupons: CouponService,
    pub comments: CommentService,
    pub announcements: AnnouncementService,
    pub achievements: AchievementService,
    pub classes: ClassService,
    pub migrations: MigrationService,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        let db = Db::new(store, config.database.max_transaction_attempts);
        let game = &config.gamification;

        Self {
            users: UserDirectory::new(db.clone(), game.clone()),
            schedule: ScheduleService::new(db.clone()),
            events: EventService::new(db.clone()),
            coupons: CouponService::new(db.clone()),
            comments: CommentService::new(db.clone()),
            announcements: AnnouncementService::new(db.clone(), game.announcement_limit),
            achievements: AchievementService::new(db.clone()),
            classes: ClassService::new(db.clone()),
            migrations: MigrationService::new(db),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::auth::{AuthContext, Identity};
    use crate::database::models::User;
    use crate::database::MemoryDocumentStore;
    use crate::types::{Id, Role};

    pub fn services() -> Services {
        services_with_store().0
    }

    /// Services plus the store behind them, for seeding documents directly
    pub fn services_with_store() -> (Services, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        (Services::new(store.clone(), &AppConfig::development()), store)
    }

    /// A user record written before roles existed
    pub fn legacy_user(external_id: &str) -> User {
        User {
            id: Id::new(),
            name: external_id.to_string(),
            email: format!("{}@example.com", external_id),
            external_id: external_id.to_string(),
            grade: String::new(),
            role: None,
            current_points: 0,
            total_earned: 0,
            attendance_rate: 0.0,
            rank: 0,
            total_students: 0,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    /// Store `user` as-is and return a session for it
    pub async fn insert_user(store: &Arc<dyn DocumentStore>, user: &User) -> AuthContext {
        let mut tx = Tx::begin(store.as_ref()).await.unwrap();
        tx.insert(user).await.unwrap();
        tx.commit().await.unwrap();
        session(&user.external_id)
    }

    pub fn session(external_id: &str) -> AuthContext {
        AuthContext::Session(Identity {
            subject: Some(external_id.to_string()),
            token_identifier: format!("https://issuer.test|{}", external_id),
            issuer: Some("https://issuer.test".to_string()),
            email: None,
            name: None,
        })
    }

    /// Sign up a user and return their auth context
    pub async fn sign_up(services: &Services, external_id: &str, name: &str, role: Role) -> AuthContext {
        let auth = session(external_id);
        services
            .users
            .store_user(
                &auth,
                directory::StoreUserRequest {
                    name: name.to_string(),
                    email: format!("{}@example.com", external_id),
                    grade: "10A".to_string(),
                    role: Some(role),
                },
            )
            .await
            .unwrap();
        auth
    }
}
