use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Id<Achievement>,
    pub user_id: Id<User>,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned: bool,
    /// Percentage, 0..=100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
}

impl Document for Achievement {
    const TABLE: Table = Table::Achievements;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
