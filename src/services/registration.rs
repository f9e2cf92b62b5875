//! Registration toggle and cleanup shared by social events and schedule items

use chrono::Utc;
use serde::Serialize;

use super::DomainError;
use crate::database::models::{EventComment, EventRegistration, User};
use crate::database::{Filter, StoreError, Tx};
use crate::types::{EventRef, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    pub registered: bool,
    pub registered_count: i64,
    pub capacity: i64,
}

/// Apply a toggle to an event's counter.
///
/// Unregistering never drops the counter below zero; registering into a full
/// event fails and leaves the counter alone.
pub fn apply_toggle(registered: &mut i64, capacity: i64, already_registered: bool) -> Result<bool, DomainError> {
    if already_registered {
        *registered = (*registered - 1).max(0);
        return Ok(false);
    }
    if *registered >= capacity {
        return Err(DomainError::EventFull);
    }
    *registered += 1;
    Ok(true)
}

/// Flip `user_id`'s registration for `event` inside `tx`, updating `registered`.
/// The caller saves the event document.
pub async fn toggle(
    tx: &mut Tx,
    user_id: Id<User>,
    event: EventRef,
    registered: &mut i64,
    capacity: i64,
) -> Result<RegistrationOutcome, DomainError> {
    let existing = tx
        .first::<EventRegistration>(Filter::eq("user_id", user_id).and("event", event))
        .await?;

    let now_registered = apply_toggle(registered, capacity, existing.is_some())?;

    match existing {
        Some(registration) => {
            tx.delete(registration.id).await?;
        }
        None => {
            tx.insert(&EventRegistration {
                id: Id::new(),
                user_id,
                event,
                registered_at: Utc::now(),
            })
            .await?;
        }
    }

    Ok(RegistrationOutcome {
        registered: now_registered,
        registered_count: *registered,
        capacity,
    })
}

/// Delete every registration and comment attached to `event`.
///
/// Returns how many registrations and comments were removed.
pub async fn purge(tx: &mut Tx, event: EventRef) -> Result<(usize, usize), StoreError> {
    let registrations: Vec<EventRegistration> = tx.find(Filter::eq("event", event)).await?;
    for registration in &registrations {
        tx.delete(registration.id).await?;
    }
    let comments: Vec<EventComment> = tx.find(Filter::eq("event", event)).await?;
    for comment in &comments {
        tx.delete(comment.id).await?;
    }
    Ok((registrations.len(), comments.len()))
}
