use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Db, DomainError};
use crate::auth::{require_teacher, require_user, resolve_external_id, AuthContext};
use crate::config::GamificationConfig;
use crate::database::models::User;
use crate::database::{Filter, StoreError, Tx};
use crate::types::{Id, Role};

/// Body of the client-side sign-up fallback
#[derive(Debug, Clone, Deserialize)]
pub struct StoreUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Profile pushed by the auth provider's webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub user_id: Id<User>,
    pub name: String,
    pub grade: String,
    pub current_points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

pub async fn find_by_external_id(tx: &mut Tx, external_id: &str) -> Result<Option<User>, StoreError> {
    tx.first(Filter::eq("external_id", external_id)).await
}

async fn student_count(tx: &mut Tx) -> Result<i64, StoreError> {
    let users: Vec<User> = tx.find(Filter::all()).await?;
    Ok(users.iter().filter(|u| u.role() == Role::Student).count() as i64)
}

#[derive(Clone)]
pub struct UserDirectory {
    db: Db,
    game: GamificationConfig,
}

impl UserDirectory {
    pub fn new(db: Db, game: GamificationConfig) -> Self {
        Self { db, game }
    }

    /// Insert a user with the starting balance for `role`
    async fn create(&self, tx: &mut Tx, profile: &ExternalProfile, grade: &str, role: Role) -> Result<User, DomainError> {
        // Rank is a snapshot taken at sign-up and never recomputed
        let students = student_count(tx).await?;
        let (points, rank, total_students) = match role {
            Role::Student => (self.game.student_starting_points, students + 1, students + 1),
            Role::Teacher => (self.game.teacher_starting_points, 0, students),
        };

        let user = User {
            id: Id::new(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            external_id: profile.external_id.clone(),
            grade: grade.to_string(),
            role: Some(role),
            current_points: points,
            total_earned: 0,
            attendance_rate: 0.0,
            rank,
            total_students,
            image_url: profile.image_url.clone(),
            created_at: Utc::now(),
        };
        tx.insert(&user).await?;

        info!("Created {} {} for external id {}", role.as_str(), user.id, profile.external_id);
        Ok(user)
    }

    /// Create or patch the caller's record. Safe to call on every sign-in.
    pub async fn store_user(&self, auth: &AuthContext, request: StoreUserRequest) -> Result<User, DomainError> {
        let external_id = resolve_external_id(auth)?.ok_or(DomainError::Unauthenticated)?;
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid("name must not be empty"));
        }

        self.db
            .retry("store_user", || async {
                let mut tx = self.db.begin().await?;

                let user = match find_by_external_id(&mut tx, &external_id).await? {
                    Some(mut user) => {
                        user.name = name.to_string();
                        user.email = request.email.clone();
                        if !request.grade.trim().is_empty() {
                            user.grade = request.grade.clone();
                        }
                        if user.role.is_none() || request.role.is_some() {
                            user.role = Some(request.role.unwrap_or_default());
                        }
                        tx.save(&user).await?;
                        user
                    }
                    None => {
                        let profile = ExternalProfile {
                            external_id: external_id.clone(),
                            name: name.to_string(),
                            email: request.email.clone(),
                            image_url: None,
                        };
                        let role = request.role.unwrap_or_default();
                        self.create(&mut tx, &profile, &request.grade, role).await?
                    }
                };

                tx.commit().await?;
                Ok(user)
            })
            .await
    }

    /// Mirror a provider profile; role and points are left alone on update.
    pub async fn upsert_from_webhook(&self, profile: ExternalProfile) -> Result<User, DomainError> {
        self.db
            .retry("upsert_from_webhook", || async {
                let mut tx = self.db.begin().await?;

                let user = match find_by_external_id(&mut tx, &profile.external_id).await? {
                    Some(mut user) => {
                        user.name = profile.name.clone();
                        user.email = profile.email.clone();
                        user.image_url = profile.image_url.clone();
                        tx.save(&user).await?;
                        user
                    }
                    None => self.create(&mut tx, &profile, "", Role::Student).await?,
                };

                tx.commit().await?;
                Ok(user)
            })
            .await
    }

    pub async fn current_user(&self, auth: &AuthContext) -> Result<User, DomainError> {
        let mut tx = self.db.begin().await?;
        let mut user = require_user(&mut tx, auth).await?;
        user.role = Some(user.role());
        Ok(user)
    }

    /// One-time onboarding choice, only while no role is stored
    pub async fn choose_role(&self, auth: &AuthContext, role: Role) -> Result<User, DomainError> {
        self.db
            .retry("choose_role", || async {
                let mut tx = self.db.begin().await?;
                let mut user = require_user(&mut tx, auth).await?;

                if user.role.is_some() {
                    return Err(DomainError::Unauthorized);
                }

                user.role = Some(role);
                if role == Role::Teacher && user.total_earned == 0 {
                    user.current_points = self.game.teacher_starting_points;
                }
                tx.save(&user).await?;
                tx.commit().await?;
                Ok(user)
            })
            .await
    }

    pub async fn assign_role(&self, auth: &AuthContext, target: Id<User>, role: Role) -> Result<User, DomainError> {
        self.db
            .retry("assign_role", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let mut user = tx.get(target).await?.ok_or(DomainError::NotFound("user"))?;
                user.role = Some(role);
                tx.save(&user).await?;
                tx.commit().await?;

                info!("{} set role of {} to {}", teacher.id, user.id, role.as_str());
                Ok(user)
            })
            .await
    }

    pub async fn award_points(&self, auth: &AuthContext, target: Id<User>, amount: i64) -> Result<User, DomainError> {
        if amount <= 0 {
            return Err(DomainError::invalid("amount must be positive"));
        }

        self.db
            .retry("award_points", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let mut student = tx.get(target).await?.ok_or(DomainError::NotFound("user"))?;
                if student.role() != Role::Student {
                    return Err(DomainError::invalid("points can only be awarded to students"));
                }

                student.credit(amount);
                tx.save(&student).await?;
                tx.commit().await?;

                info!("{} awarded {} points to {}", teacher.id, amount, student.id);
                Ok(student)
            })
            .await
    }

    /// Students by current balance, highest first
    pub async fn leaderboard(&self, auth: &AuthContext) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let mut tx = self.db.begin().await?;
        require_user(&mut tx, auth).await?;

        let mut students: Vec<User> = tx.find::<User>(Filter::all()).await?;
        students.retain(|u| u.role() == Role::Student);
        students.sort_by(|a, b| b.current_points.cmp(&a.current_points).then_with(|| a.name.cmp(&b.name)));

        Ok(students
            .into_iter()
            .take(self.game.leaderboard_size)
            .enumerate()
            .map(|(i, u)| LeaderboardEntry {
                position: i + 1,
                user_id: u.id,
                name: u.name,
                grade: u.grade,
                current_points: u.current_points,
                image_url: u.image_url,
            })
            .collect())
    }

    pub async fn list_students(&self, auth: &AuthContext) -> Result<Vec<User>, DomainError> {
        let mut tx = self.db.begin().await?;
        require_teacher(&mut tx, auth).await?;

        let mut students: Vec<User> = tx.find::<User>(Filter::all()).await?;
        students.retain(|u| u.role() == Role::Student);
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{services, session, sign_up};

    fn request(name: &str, role: Option<Role>) -> StoreUserRequest {
        StoreUserRequest {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            grade: "9B".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn store_user_then_current_user_round_trips() {
        let services = services();
        let auth = session("user_kari");

        let created = services.users.store_user(&auth, request("Kari", None)).await.unwrap();
        assert_eq!(created.role, Some(Role::Student));
        assert_eq!(created.current_points, 150);
        assert_eq!(created.rank, 1);

        let current = services.users.current_user(&auth).await.unwrap();
        assert_eq!(current.id, created.id);
        assert_eq!(current.name, "Kari");
        assert_eq!(current.external_id, "user_kari");
    }

    #[tokio::test]
    async fn store_user_is_idempotent_by_external_id() {
        let services = services();
        let auth = session("user_ola");

        let first = services.users.store_user(&auth, request("Ola", None)).await.unwrap();
        let second = services.users.store_user(&auth, request("Ola Nordmann", None)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ola Nordmann");
        assert_eq!(second.current_points, 150);
    }

    #[tokio::test]
    async fn store_user_keeps_grade_when_request_omits_it() {
        let services = services();
        let auth = session("user_siri");
        services.users.store_user(&auth, request("Siri", None)).await.unwrap();

        let mut resync = request("Siri", None);
        resync.grade = String::new();
        let user = services.users.store_user(&auth, resync).await.unwrap();
        assert_eq!(user.grade, "9B");

        let mut moved = request("Siri", None);
        moved.grade = "10A".to_string();
        assert_eq!(services.users.store_user(&auth, moved).await.unwrap().grade, "10A");
    }

    #[tokio::test]
    async fn teachers_start_with_zero_points_and_students_get_rank_snapshots() {
        let services = services();
        sign_up(&services, "user_a", "A", Role::Student).await;
        let teacher = sign_up(&services, "user_t", "T", Role::Teacher).await;
        let second = services
            .users
            .store_user(&session("user_b"), request("B", None))
            .await
            .unwrap();

        let teacher = services.users.current_user(&teacher).await.unwrap();
        assert_eq!(teacher.current_points, 0);
        assert_eq!(second.rank, 2);
        assert_eq!(second.total_students, 2);
    }

    #[tokio::test]
    async fn unknown_caller_is_rejected() {
        let services = services();
        assert!(matches!(
            services.users.current_user(&session("ghost")).await,
            Err(DomainError::UserNotFound)
        ));
        assert!(matches!(
            services.users.current_user(&AuthContext::Anonymous).await,
            Err(DomainError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn webhook_upsert_keeps_role_and_points() {
        let services = services();
        let auth = sign_up(&services, "user_w", "Old Name", Role::Teacher).await;

        let profile = ExternalProfile {
            external_id: "user_w".to_string(),
            name: "New Name".to_string(),
            email: "new@example.com".to_string(),
            image_url: Some("https://img.example.com/w.png".to_string()),
        };
        let updated = services.users.upsert_from_webhook(profile).await.unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.role, Some(Role::Teacher));
        assert_eq!(updated.current_points, 0);

        let current = services.users.current_user(&auth).await.unwrap();
        assert_eq!(current.image_url.as_deref(), Some("https://img.example.com/w.png"));
    }

    #[tokio::test]
    async fn award_points_is_teacher_only() {
        let services = services();
        let student = sign_up(&services, "user_s", "Student", Role::Student).await;
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let student_id = services.users.current_user(&student).await.unwrap().id;

        assert!(matches!(
            services.users.award_points(&student, student_id, 50).await,
            Err(DomainError::Unauthorized)
        ));
        assert_eq!(services.users.current_user(&student).await.unwrap().current_points, 150);

        let awarded = services.users.award_points(&teacher, student_id, 25).await.unwrap();
        assert_eq!(awarded.current_points, 175);
        assert_eq!(awarded.total_earned, 25);

        assert!(matches!(
            services.users.award_points(&teacher, student_id, 0).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn choose_role_only_once() {
        let services = services();
        let auth = sign_up(&services, "user_c", "C", Role::Student).await;
        assert!(matches!(
            services.users.choose_role(&auth, Role::Teacher).await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn leaderboard_orders_students_by_points() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "Teacher", Role::Teacher).await;
        let low = sign_up(&services, "user_low", "Low", Role::Student).await;
        let high = sign_up(&services, "user_high", "High", Role::Student).await;
        let high_id = services.users.current_user(&high).await.unwrap().id;
        services.users.award_points(&teacher, high_id, 10).await.unwrap();

        let board = services.users.leaderboard(&low).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].name, "High");
        assert_eq!(board[0].position, 1);
        assert_eq!(board[1].name, "Low");
    }
}
