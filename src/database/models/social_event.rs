use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::{EventRef, Id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialEvent {
    pub id: Id<SocialEvent>,
    pub title: String,
    pub description: String,
    /// Free text as entered by the teacher
    pub date: String,
    pub time: String,
    pub emoji: String,
    pub registered: i64,
    pub capacity: i64,
    pub color_theme: String,
    pub created_by: Id<User>,
    pub created_at: DateTime<Utc>,
}

impl Document for SocialEvent {
    const TABLE: Table = Table::SocialEvents;

    fn id(&self) -> Id<Self> {
        self.id
    }
}

/// Presence of a row means the user is registered for the event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: Id<EventRegistration>,
    pub user_id: Id<User>,
    pub event: EventRef,
    pub registered_at: DateTime<Utc>,
}

impl Document for EventRegistration {
    const TABLE: Table = Table::EventRegistrations;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
