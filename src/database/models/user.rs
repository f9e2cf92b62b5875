use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::{Id, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id<User>,
    pub name: String,
    pub email: String,
    /// Stable id issued by the external auth provider
    pub external_id: String,
    #[serde(default)]
    pub grade: String,
    /// Absent on records created before roles existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub current_points: i64,
    pub total_earned: i64,
    #[serde(default)]
    pub attendance_rate: f64,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub total_students: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The effective role; a missing role means student.
    pub fn role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    pub fn is_teacher(&self) -> bool {
        self.role() == Role::Teacher
    }

    pub fn credit(&mut self, points: i64) {
        self.current_points += points;
        self.total_earned += points;
    }
}

impl Document for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
