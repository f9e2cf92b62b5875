use chrono::{Datelike, Local};
use serde::Serialize;
use tracing::info;

use super::registration::{self, RegistrationOutcome};
use super::seed::{day_order, timetable_for, weekday_name};
use super::{Db, DomainError};
use crate::auth::{require_owner, require_teacher, require_user, AuthContext};
use crate::database::models::{ScheduleItem, ScheduleKind, User};
use crate::database::{Filter, Tx};
use crate::types::{EventRef, Id};

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceOutcome {
    pub item: ScheduleItem,
    /// Points credited by this call; zero when the item was already attended
    pub credited: i64,
    pub current_points: i64,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub day: String,
    pub items: Vec<ScheduleItem>,
}

/// Percentage of the user's class items marked attended
fn attendance_rate(items: &[ScheduleItem]) -> f64 {
    let classes: Vec<&ScheduleItem> = items.iter().filter(|i| i.kind == ScheduleKind::Class).collect();
    if classes.is_empty() {
        return 0.0;
    }
    let attended = classes.iter().filter(|i| i.attended).count();
    (attended as f64 / classes.len() as f64 * 1000.0).round() / 10.0
}

fn sort_by_day_and_time(items: &mut [ScheduleItem]) {
    items.sort_by(|a, b| {
        day_order(&a.day)
            .cmp(&day_order(&b.day))
            .then_with(|| a.time.cmp(&b.time))
    });
}

async fn owned_item(tx: &mut Tx, user: &User, id: Id<ScheduleItem>) -> Result<ScheduleItem, DomainError> {
    let item = tx.get(id).await?.ok_or(DomainError::NotFound("schedule item"))?;
    require_owner(user, item.user_id)?;
    Ok(item)
}

#[derive(Clone)]
pub struct ScheduleService {
    db: Db,
}

impl ScheduleService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn my_schedule(&self, auth: &AuthContext) -> Result<Vec<ScheduleItem>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;

        let mut items: Vec<ScheduleItem> = tx.find(Filter::eq("user_id", user.id)).await?;
        sort_by_day_and_time(&mut items);
        Ok(items)
    }

    pub async fn schedule_for_day(&self, auth: &AuthContext, day: &str) -> Result<DaySchedule, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;

        let mut items: Vec<ScheduleItem> = tx.find(Filter::eq("user_id", user.id).and("day", day)).await?;
        items.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(DaySchedule {
            day: day.to_string(),
            items,
        })
    }

    /// The caller's items for the current local weekday
    pub async fn today(&self, auth: &AuthContext) -> Result<DaySchedule, DomainError> {
        let day = weekday_name(Local::now().weekday());
        self.schedule_for_day(auth, day).await
    }

    /// Replace the caller's schedule with the weekly template.
    ///
    /// Returns the number of items inserted; repeated calls leave the same count.
    pub async fn setup(&self, auth: &AuthContext) -> Result<usize, DomainError> {
        self.db
            .retry("setup_schedule", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;

                let existing: Vec<ScheduleItem> = tx.find(Filter::eq("user_id", user.id)).await?;
                let mut purged = (0, 0);
                for item in &existing {
                    tx.delete(item.id).await?;
                    let (registrations, comments) = registration::purge(&mut tx, EventRef::ScheduleItem(item.id)).await?;
                    purged.0 += registrations;
                    purged.1 += comments;
                }

                let items = timetable_for(user.id);
                for item in &items {
                    tx.insert(item).await?;
                }
                tx.commit().await?;

                info!(
                    "Seeded {} schedule items for {} (replaced {}, dropped {} registrations and {} comments)",
                    items.len(),
                    user.id,
                    existing.len(),
                    purged.0,
                    purged.1
                );
                Ok(items.len())
            })
            .await
    }

    /// Mark one of the caller's items attended. Only the first call credits
    /// points; later calls report `credited: 0`.
    pub async fn mark_attended(&self, auth: &AuthContext, id: Id<ScheduleItem>) -> Result<AttendanceOutcome, DomainError> {
        self.db
            .retry("mark_attended", || async {
                let mut tx = self.db.begin().await?;
                let mut user = require_user(&mut tx, auth).await?;
                let mut item = owned_item(&mut tx, &user, id).await?;

                if item.attended {
                    return Ok(AttendanceOutcome {
                        item,
                        credited: 0,
                        current_points: user.current_points,
                        attendance_rate: user.attendance_rate,
                    });
                }

                item.attended = true;
                let credited = match item.kind {
                    ScheduleKind::Class => item.points,
                    ScheduleKind::Event | ScheduleKind::Trip => 0,
                };
                user.credit(credited);

                tx.save(&item).await?;
                let items: Vec<ScheduleItem> = tx.find(Filter::eq("user_id", user.id)).await?;
                user.attendance_rate = attendance_rate(&items);
                tx.save(&user).await?;
                tx.commit().await?;

                info!("{} attended {} ({}), credited {}", user.id, item.id, item.subject, credited);
                Ok(AttendanceOutcome {
                    item,
                    credited,
                    current_points: user.current_points,
                    attendance_rate: user.attendance_rate,
                })
            })
            .await
    }

    /// Toggle registration on one of the caller's event or trip items
    pub async fn toggle_registration(&self, auth: &AuthContext, id: Id<ScheduleItem>) -> Result<RegistrationOutcome, DomainError> {
        self.db
            .retry("toggle_item_registration", || async {
                let mut tx = self.db.begin().await?;
                let user = require_user(&mut tx, auth).await?;
                let mut item = owned_item(&mut tx, &user, id).await?;

                let capacity = match (item.kind, item.capacity) {
                    (ScheduleKind::Event | ScheduleKind::Trip, Some(capacity)) => capacity,
                    _ => return Err(DomainError::invalid("only events and trips with a capacity take registrations")),
                };

                let mut registered = item.registered.unwrap_or(0);
                let outcome = registration::toggle(&mut tx, user.id, EventRef::ScheduleItem(id), &mut registered, capacity).await?;

                item.registered = Some(registered);
                item.is_registered = Some(outcome.registered);
                tx.save(&item).await?;
                tx.commit().await?;
                Ok(outcome)
            })
            .await
    }

    /// Items taught by the caller across all students, one per slot
    pub async fn teacher_schedule(&self, auth: &AuthContext) -> Result<Vec<ScheduleItem>, DomainError> {
        let mut tx = self.db.begin().await?;
        let teacher = require_teacher(&mut tx, auth).await?;

        let items: Vec<ScheduleItem> = tx.find(Filter::eq("teacher", teacher.name.as_str())).await?;

        let mut unique: Vec<ScheduleItem> = Vec::new();
        for item in items {
            let seen = unique.iter().any(|u| {
                u.day == item.day && u.time == item.time && u.subject == item.subject && u.room == item.room
            });
            if !seen {
                unique.push(item);
            }
        }
        sort_by_day_and_time(&mut unique);
        Ok(unique)
    }
}
