use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::Id;

/// A teaching group owned by one teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: Id<Class>,
    pub name: String,
    pub grade: String,
    pub subject: String,
    pub teacher_id: Id<User>,
    pub created_at: DateTime<Utc>,
}

impl Document for Class {
    const TABLE: Table = Table::Classes;

    fn id(&self) -> Id<Self> {
        self.id
    }
}

/// Enrollment join row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentInClass {
    pub id: Id<StudentInClass>,
    pub student_id: Id<User>,
    pub class_id: Id<Class>,
    pub added_at: DateTime<Utc>,
}

impl Document for StudentInClass {
    const TABLE: Table = Table::StudentsInClasses;

    fn id(&self) -> Id<Self> {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

/// One record per (student, class, date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Id<Attendance>,
    pub student_id: Id<User>,
    pub class_id: Id<Class>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Id<User>,
    pub marked_at: DateTime<Utc>,
}

impl Document for Attendance {
    const TABLE: Table = Table::Attendance;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
