//! Fixed data loaded by the setup operations

use chrono::Weekday;

use crate::database::models::{Achievement, ScheduleItem, ScheduleKind, User};
use crate::types::Id;

/// Norwegian weekday names, Monday first
pub const WEEKDAYS: [&str; 7] = ["Mandag", "Tirsdag", "Onsdag", "Torsdag", "Fredag", "Lørdag", "Søndag"];

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize]
}

/// Sort key for free-text day names; unknown labels sort last
pub fn day_order(day: &str) -> usize {
    WEEKDAYS
        .iter()
        .position(|d| d.eq_ignore_ascii_case(day))
        .unwrap_or(WEEKDAYS.len())
}

struct Slot {
    day: &'static str,
    subject: &'static str,
    teacher: &'static str,
    time: &'static str,
    room: &'static str,
    points: i64,
    kind: ScheduleKind,
    extra: Option<Extra>,
}

/// Presentation and capacity fields of event and trip slots
struct Extra {
    description: &'static str,
    emoji: &'static str,
    color_theme: &'static str,
    capacity: i64,
}

const fn class(day: &'static str, subject: &'static str, teacher: &'static str, time: &'static str, room: &'static str, points: i64) -> Slot {
    Slot {
        day,
        subject,
        teacher,
        time,
        room,
        points,
        kind: ScheduleKind::Class,
        extra: None,
    }
}

const TIMETABLE: &[Slot] = &[
    class("Mandag", "Matematikk", "Ingrid Hansen", "08:15 - 09:45", "A101", 10),
    class("Mandag", "Norsk", "Lars Johansen", "10:00 - 11:30", "B204", 10),
    class("Mandag", "Engelsk", "Kari Olsen", "12:15 - 13:45", "B210", 10),
    class("Tirsdag", "Naturfag", "Ole Berg", "08:15 - 09:45", "Lab 2", 15),
    class("Tirsdag", "Samfunnsfag", "Silje Nilsen", "10:00 - 11:30", "C105", 10),
    class("Tirsdag", "Kroppsøving", "Anders Lie", "12:15 - 13:45", "Gymsal", 10),
    class("Onsdag", "Matematikk", "Ingrid Hansen", "08:15 - 09:45", "A101", 10),
    class("Onsdag", "KRLE", "Silje Nilsen", "10:00 - 11:30", "C105", 10),
    class("Onsdag", "Musikk", "Mari Dahl", "12:15 - 13:45", "Musikkrom", 10),
    class("Torsdag", "Norsk", "Lars Johansen", "08:15 - 09:45", "B204", 10),
    class("Torsdag", "Naturfag", "Ole Berg", "10:00 - 11:30", "Lab 2", 15),
    class("Torsdag", "Kunst og håndverk", "Mari Dahl", "12:15 - 13:45", "Verksted", 10),
    class("Fredag", "Engelsk", "Kari Olsen", "08:15 - 09:45", "B210", 10),
    class("Fredag", "Mat og helse", "Anders Lie", "10:00 - 11:30", "Skolekjøkken", 10),
    Slot {
        day: "Fredag",
        subject: "Filmkveld",
        teacher: "Elevrådet",
        time: "18:00 - 21:00",
        room: "Aulaen",
        points: 20,
        kind: ScheduleKind::Event,
        extra: Some(Extra {
            description: "Filmkveld med popcorn for hele trinnet",
            emoji: "🎬",
            color_theme: "purple",
            capacity: 16,
        }),
    },
    Slot {
        day: "Lørdag",
        subject: "Skitur i Nordmarka",
        teacher: "Anders Lie",
        time: "09:00 - 15:00",
        room: "Oppmøte ved skolen",
        points: 30,
        kind: ScheduleKind::Trip,
        extra: Some(Extra {
            description: "Dagstur på ski med kakao og bål",
            emoji: "⛷️",
            color_theme: "blue",
            capacity: 30,
        }),
    },
];

/// Number of items `timetable_for` produces
pub fn timetable_len() -> usize {
    TIMETABLE.len()
}

/// The weekly template instantiated for one user
pub fn timetable_for(user_id: Id<User>) -> Vec<ScheduleItem> {
    TIMETABLE
        .iter()
        .map(|slot| {
            let extra = slot.extra.as_ref();
            ScheduleItem {
                id: Id::new(),
                user_id,
                subject: slot.subject.to_string(),
                teacher: slot.teacher.to_string(),
                time: slot.time.to_string(),
                room: slot.room.to_string(),
                points: slot.points,
                attended: false,
                day: slot.day.to_string(),
                kind: slot.kind,
                description: extra.map(|e| e.description.to_string()),
                emoji: extra.map(|e| e.emoji.to_string()),
                color_theme: extra.map(|e| e.color_theme.to_string()),
                capacity: extra.map(|e| e.capacity),
                registered: extra.map(|_| 0),
                is_registered: extra.map(|_| false),
            }
        })
        .collect()
}

const ACHIEVEMENTS: &[(&str, &str, &str)] = &[
    ("Første dag", "Møtte opp til din første time", "🎒"),
    ("Perfekt uke", "Møtte opp til alle timer en hel uke", "🏆"),
    ("Sosial sommerfugl", "Meldte deg på tre arrangementer", "🦋"),
    ("Sparegris", "Samlet 500 poeng", "🐷"),
    ("Kupongjeger", "Løste inn din første kupong", "🎟️"),
];

pub fn achievements_for(user_id: Id<User>) -> Vec<Achievement> {
    ACHIEVEMENTS
        .iter()
        .map(|(title, description, icon)| Achievement {
            id: Id::new(),
            user_id,
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            earned: false,
            progress: Some(0),
            earned_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timetable_covers_monday_to_saturday() {
        let items = timetable_for(Id::new());
        assert_eq!(items.len(), timetable_len());
        for day in &WEEKDAYS[..6] {
            assert!(items.iter().any(|i| i.day == *day), "no items on {}", day);
        }
        assert!(items.iter().all(|i| i.day != "Søndag"));
    }

    #[test]
    fn only_events_and_trips_have_capacity() {
        for item in timetable_for(Id::new()) {
            match item.kind {
                ScheduleKind::Class => assert!(item.capacity.is_none()),
                _ => {
                    assert!(item.capacity.unwrap() > 0);
                    assert_eq!(item.registered, Some(0));
                    assert_eq!(item.is_registered, Some(false));
                }
            }
        }
    }

    #[test]
    fn weekday_names_and_order() {
        assert_eq!(weekday_name(Weekday::Mon), "Mandag");
        assert_eq!(weekday_name(Weekday::Sat), "Lørdag");
        assert!(day_order("Mandag") < day_order("Fredag"));
        assert_eq!(day_order("I morgen"), WEEKDAYS.len());
    }
}
