use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Id<Announcement>,
    pub title: String,
    pub content: String,
    pub created_by: Id<User>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document for Announcement {
    const TABLE: Table = Table::Announcements;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
