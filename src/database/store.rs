use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// Another transaction touched the same documents; safe to retry.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Document {id} not found in {table}")]
    Missing { table: &'static str, id: Uuid },

    #[error("Transaction already finished")]
    Finished,

    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            // serialization_failure, deadlock_detected, unique_violation
            if matches!(db.code().as_deref(), Some("40001") | Some("40P01") | Some("23505")) {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}

/// Document tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Users,
    ScheduleItems,
    SocialEvents,
    Coupons,
    CouponRedemptions,
    EventRegistrations,
    EventComments,
    Achievements,
    Classes,
    StudentsInClasses,
    Attendance,
    Announcements,
}

impl Table {
    pub const ALL: [Table; 12] = [
        Table::Users,
        Table::ScheduleItems,
        Table::SocialEvents,
        Table::Coupons,
        Table::CouponRedemptions,
        Table::EventRegistrations,
        Table::EventComments,
        Table::Achievements,
        Table::Classes,
        Table::StudentsInClasses,
        Table::Attendance,
        Table::Announcements,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::ScheduleItems => "schedule_items",
            Table::SocialEvents => "social_events",
            Table::Coupons => "coupons",
            Table::CouponRedemptions => "coupon_redemptions",
            Table::EventRegistrations => "event_registrations",
            Table::EventComments => "event_comments",
            Table::Achievements => "achievements",
            Table::Classes => "classes",
            Table::StudentsInClasses => "students_in_classes",
            Table::Attendance => "attendance",
            Table::Announcements => "announcements",
        }
    }
}

/// Equality filter over top-level document fields, with an optional cap.
///
/// An empty filter matches every document in the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub fields: Map<String, Value>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Containment check used by the in-memory backend; Postgres evaluates
    /// the same predicate with `body @> fields`.
    pub fn matches(&self, body: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }

    pub fn as_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// A backend that hands out serializable transactions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Untyped document operations inside one transaction.
///
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait]
pub trait Transaction: Send {
    async fn get(&mut self, table: Table, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn query(&mut self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    async fn insert(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError>;

    async fn replace(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError>;

    async fn delete(&mut self, table: Table, id: Uuid) -> Result<bool, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_fields() {
        let doc = json!({ "user_id": "a", "day": "Mandag", "points": 10 });
        assert!(Filter::all().matches(&doc));
        assert!(Filter::eq("user_id", "a").matches(&doc));
        assert!(Filter::eq("user_id", "a").and("day", "Mandag").matches(&doc));
        assert!(!Filter::eq("user_id", "a").and("day", "Tirsdag").matches(&doc));
        assert!(!Filter::eq("missing", "x").matches(&doc));
    }

    #[test]
    fn filter_matches_nested_values_exactly() {
        let doc = json!({ "event": { "kind": "social_event", "id": "1" } });
        assert!(Filter::eq("event", json!({ "kind": "social_event", "id": "1" })).matches(&doc));
        assert!(!Filter::eq("event", json!({ "kind": "schedule_item", "id": "1" })).matches(&doc));
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = Table::ALL.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Table::ALL.len());
    }
}
