/// Shared types used across the codebase

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{schedule::ScheduleItem, social_event::SocialEvent};

/// Opaque generated document id, typed by the document it points at.
///
/// An `Id<Coupon>` cannot be passed where an `Id<User>` is expected.
pub struct Id<T> {
    value: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(value: Uuid) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn as_uuid(&self) -> Uuid {
        self.value
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

impl<T> From<Id<T>> for Value {
    fn from(id: Id<T>) -> Self {
        Value::String(id.value.to_string())
    }
}

/// User role. Records written before roles existed carry no role at all;
/// those read as `Student` through `User::role()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl From<Role> for Value {
    fn from(role: Role) -> Self {
        Value::String(role.as_str().to_string())
    }
}

/// Reference to something users can register for or comment on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventRef {
    ScheduleItem(Id<ScheduleItem>),
    SocialEvent(Id<SocialEvent>),
}

impl From<EventRef> for Value {
    fn from(event: EventRef) -> Self {
        match event {
            EventRef::ScheduleItem(id) => json!({ "kind": "schedule_item", "id": id }),
            EventRef::SocialEvent(id) => json!({ "kind": "social_event", "id": id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_serializes_as_plain_uuid() {
        let uuid = Uuid::new_v4();
        let id: Id<ScheduleItem> = Id::from_uuid(uuid);
        assert_eq!(serde_json::to_value(id).unwrap(), json!(uuid.to_string()));
        assert_eq!(Value::from(id), json!(uuid.to_string()));
    }

    #[test]
    fn id_parses_from_str() {
        let uuid = Uuid::new_v4();
        let id: Id<SocialEvent> = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<Id<SocialEvent>>().is_err());
    }

    #[test]
    fn event_ref_is_tagged() {
        let id: Id<SocialEvent> = Id::new();
        let value = serde_json::to_value(EventRef::SocialEvent(id)).unwrap();
        assert_eq!(value, json!({ "kind": "social_event", "id": id.to_string() }));
        assert_eq!(Value::from(EventRef::SocialEvent(id)), value);

        let back: EventRef = serde_json::from_value(value).unwrap();
        assert_eq!(back, EventRef::SocialEvent(id));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Teacher).unwrap(), json!("teacher"));
        assert_eq!(Role::default(), Role::Student);
    }
}
