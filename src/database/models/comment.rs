use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::{EventRef, Id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventComment {
    pub id: Id<EventComment>,
    pub event: EventRef,
    pub user_id: Id<User>,
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Document for EventComment {
    const TABLE: Table = Table::EventComments;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
