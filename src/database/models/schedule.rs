use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Class,
    Event,
    Trip,
}

impl From<ScheduleKind> for Value {
    fn from(kind: ScheduleKind) -> Self {
        let name = match kind {
            ScheduleKind::Class => "class",
            ScheduleKind::Event => "event",
            ScheduleKind::Trip => "trip",
        };
        Value::String(name.to_string())
    }
}

/// One slot in a student's weekly timetable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: Id<ScheduleItem>,
    pub user_id: Id<User>,
    pub subject: String,
    pub teacher: String,
    /// Free text, "HH:MM - HH:MM"
    pub time: String,
    pub room: String,
    pub points: i64,
    pub attended: bool,
    /// Free-text weekday name ("Mandag") or relative label
    pub day: String,
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
}

impl Document for ScheduleItem {
    const TABLE: Table = Table::ScheduleItems;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
