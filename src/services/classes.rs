use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Db, DomainError};
use crate::auth::{require_owner, require_teacher, require_user, AuthContext};
use crate::database::models::{Attendance, AttendanceStatus, Class, StudentInClass, User};
use crate::database::{Filter, Tx};
use crate::types::{Id, Role};

#[derive(Debug, Clone, Deserialize)]
pub struct ClassInput {
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceInput {
    pub student_id: Id<User>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassMember {
    pub student_id: Id<User>,
    pub name: String,
    pub grade: String,
    pub added_at: chrono::DateTime<Utc>,
}

/// Load a class the caller teaches
async fn owned_class(tx: &mut Tx, auth: &AuthContext, id: Id<Class>) -> Result<(User, Class), DomainError> {
    let teacher = require_teacher(tx, auth).await?;
    let class = tx.get(id).await?.ok_or(DomainError::NotFound("class"))?;
    require_owner(&teacher, class.teacher_id)?;
    Ok((teacher, class))
}

async fn enrollment(tx: &mut Tx, class_id: Id<Class>, student_id: Id<User>) -> Result<Option<StudentInClass>, DomainError> {
    Ok(tx
        .first(Filter::eq("class_id", class_id).and("student_id", student_id))
        .await?)
}

#[derive(Clone)]
pub struct ClassService {
    db: Db,
}

impl ClassService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, auth: &AuthContext, input: ClassInput) -> Result<Class, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::invalid("name must not be empty"));
        }

        self.db
            .retry("create_class", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let class = Class {
                    id: Id::new(),
                    name: input.name.trim().to_string(),
                    grade: input.grade.clone(),
                    subject: input.subject.clone(),
                    teacher_id: teacher.id,
                    created_at: Utc::now(),
                };
                tx.insert(&class).await?;
                tx.commit().await?;

                info!("{} created class {} ({})", teacher.id, class.id, class.name);
                Ok(class)
            })
            .await
    }

    /// Teachers see the classes they own, students the classes they are in
    pub async fn mine(&self, auth: &AuthContext) -> Result<Vec<Class>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;

        if user.is_teacher() {
            return Ok(tx.find(Filter::eq("teacher_id", user.id)).await?);
        }

        let enrollments: Vec<StudentInClass> = tx.find(Filter::eq("student_id", user.id)).await?;
        let mut classes = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            if let Some(class) = tx.get(enrollment.class_id).await? {
                classes.push(class);
            }
        }
        Ok(classes)
    }

    /// Enroll a student; enrolling twice is a no-op
    pub async fn add_student(&self, auth: &AuthContext, class_id: Id<Class>, student_id: Id<User>) -> Result<StudentInClass, DomainError> {
        self.db
            .retry("add_student", || async {
                let mut tx = self.db.begin().await?;
                owned_class(&mut tx, auth, class_id).await?;

                let student: User = tx.get(student_id).await?.ok_or(DomainError::NotFound("user"))?;
                if student.role() != Role::Student {
                    return Err(DomainError::invalid("only students can be added to a class"));
                }

                if let Some(existing) = enrollment(&mut tx, class_id, student_id).await? {
                    return Ok(existing);
                }

                let enrollment = StudentInClass {
                    id: Id::new(),
                    student_id,
                    class_id,
                    added_at: Utc::now(),
                };
                tx.insert(&enrollment).await?;
                tx.commit().await?;
                Ok(enrollment)
            })
            .await
    }

    pub async fn remove_student(&self, auth: &AuthContext, class_id: Id<Class>, student_id: Id<User>) -> Result<(), DomainError> {
        self.db
            .retry("remove_student", || async {
                let mut tx = self.db.begin().await?;
                owned_class(&mut tx, auth, class_id).await?;

                let existing = enrollment(&mut tx, class_id, student_id)
                    .await?
                    .ok_or(DomainError::NotFound("enrollment"))?;
                tx.delete(existing.id).await?;
                tx.commit().await?;
                Ok(())
            })
            .await
    }

    pub async fn students(&self, auth: &AuthContext, class_id: Id<Class>) -> Result<Vec<ClassMember>, DomainError> {
        let mut tx = self.db.begin().await?;
        owned_class(&mut tx, auth, class_id).await?;

        let enrollments: Vec<StudentInClass> = tx.find(Filter::eq("class_id", class_id)).await?;
        let mut members = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            if let Some(student) = tx.get::<User>(enrollment.student_id).await? {
                members.push(ClassMember {
                    student_id: student.id,
                    name: student.name,
                    grade: student.grade,
                    added_at: enrollment.added_at,
                });
            }
        }
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    /// Record a student's attendance for a date, replacing any earlier mark
    pub async fn mark_attendance(&self, auth: &AuthContext, class_id: Id<Class>, input: AttendanceInput) -> Result<Attendance, DomainError> {
        self.db
            .retry("mark_attendance", || async {
                let mut tx = self.db.begin().await?;
                let (teacher, _) = owned_class(&mut tx, auth, class_id).await?;

                if enrollment(&mut tx, class_id, input.student_id).await?.is_none() {
                    return Err(DomainError::invalid("student is not enrolled in this class"));
                }

                let existing: Option<Attendance> = tx
                    .first(
                        Filter::eq("class_id", class_id)
                            .and("student_id", input.student_id)
                            .and("date", input.date.to_string()),
                    )
                    .await?;

                let record = match existing {
                    Some(mut record) => {
                        record.status = input.status;
                        record.marked_by = teacher.id;
                        record.marked_at = Utc::now();
                        tx.save(&record).await?;
                        record
                    }
                    None => {
                        let record = Attendance {
                            id: Id::new(),
                            student_id: input.student_id,
                            class_id,
                            date: input.date,
                            status: input.status,
                            marked_by: teacher.id,
                            marked_at: Utc::now(),
                        };
                        tx.insert(&record).await?;
                        record
                    }
                };
                tx.commit().await?;
                Ok(record)
            })
            .await
    }

    pub async fn attendance(&self, auth: &AuthContext, class_id: Id<Class>, date: Option<NaiveDate>) -> Result<Vec<Attendance>, DomainError> {
        let mut tx = self.db.begin().await?;
        owned_class(&mut tx, auth, class_id).await?;

        let mut filter = Filter::eq("class_id", class_id);
        if let Some(date) = date {
            filter = filter.and("date", date.to_string());
        }
        let mut records: Vec<Attendance> = tx.find(filter).await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    pub async fn my_attendance(&self, auth: &AuthContext) -> Result<Vec<Attendance>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;

        let mut records: Vec<Attendance> = tx.find(Filter::eq("student_id", user.id)).await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{services, sign_up};

    fn class_input() -> ClassInput {
        ClassInput {
            name: "10A Matte".to_string(),
            grade: "10A".to_string(),
            subject: "Matematikk".to_string(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn enroll_and_mark_attendance() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "T", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "S", Role::Student).await;
        let student_id = services.users.current_user(&student).await.unwrap().id;

        let class = services.classes.create(&teacher, class_input()).await.unwrap();
        services.classes.add_student(&teacher, class.id, student_id).await.unwrap();
        services.classes.add_student(&teacher, class.id, student_id).await.unwrap();
        assert_eq!(services.classes.students(&teacher, class.id).await.unwrap().len(), 1);
        assert_eq!(services.classes.mine(&student).await.unwrap().len(), 1);

        let input = AttendanceInput {
            student_id,
            date: date("2024-09-02"),
            status: AttendanceStatus::Late,
        };
        services.classes.mark_attendance(&teacher, class.id, input.clone()).await.unwrap();
        let again = AttendanceInput {
            status: AttendanceStatus::Present,
            ..input
        };
        let record = services.classes.mark_attendance(&teacher, class.id, again).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);

        let records = services.classes.attendance(&teacher, class.id, Some(date("2024-09-02"))).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(services.classes.my_attendance(&student).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attendance_requires_enrollment() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "T", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "S", Role::Student).await;
        let student_id = services.users.current_user(&student).await.unwrap().id;
        let class = services.classes.create(&teacher, class_input()).await.unwrap();

        let input = AttendanceInput {
            student_id,
            date: date("2024-09-02"),
            status: AttendanceStatus::Absent,
        };
        assert!(matches!(
            services.classes.mark_attendance(&teacher, class.id, input).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn other_teachers_cannot_touch_the_class() {
        let services = services();
        let owner = sign_up(&services, "user_t", "T", Role::Teacher).await;
        let other = sign_up(&services, "user_o", "O", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "S", Role::Student).await;
        let student_id = services.users.current_user(&student).await.unwrap().id;
        let class = services.classes.create(&owner, class_input()).await.unwrap();

        assert!(matches!(
            services.classes.add_student(&other, class.id, student_id).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            services.classes.create(&student, class_input()).await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn remove_student_unenrolls() {
        let services = services();
        let teacher = sign_up(&services, "user_t", "T", Role::Teacher).await;
        let student = sign_up(&services, "user_s", "S", Role::Student).await;
        let student_id = services.users.current_user(&student).await.unwrap().id;
        let class = services.classes.create(&teacher, class_input()).await.unwrap();
        services.classes.add_student(&teacher, class.id, student_id).await.unwrap();

        services.classes.remove_student(&teacher, class.id, student_id).await.unwrap();
        assert!(services.classes.students(&teacher, class.id).await.unwrap().is_empty());
        assert!(matches!(
            services.classes.remove_student(&teacher, class.id, student_id).await,
            Err(DomainError::NotFound("enrollment"))
        ));
    }
}
