//! Small builders for domain values used across test suites.

use localevents_core::model::{Event, EventCreate, EventId, User, UserId};

/// A user with the given raw id and name
#[must_use]
pub fn user(id: i64, name: &str) -> User {
    User::new(UserId::new(id), name)
}

/// The `[alice, admin]` roster used throughout the scenarios
#[must_use]
pub fn alice_and_admin() -> Vec<User> {
    vec![user(1, "alice"), user(2, "admin")]
}

/// A well-formed event with the given id, organizer, and joiners
#[must_use]
pub fn event(id: i64, organizer_id: i64, joiners: Vec<User>) -> Event {
    Event {
        id: EventId::new(id),
        title: format!("Event {id}"),
        event_dt: "2024-10-30T10:00".to_string(),
        duration: "1 day".to_string(),
        location: "Town hall".to_string(),
        organizer_id: UserId::new(organizer_id),
        joiners,
    }
}

/// A complete creation payload
#[must_use]
pub fn draft(title: &str, organizer_id: i64) -> EventCreate {
    EventCreate {
        title: title.to_string(),
        event_dt: "2024-10-30T10:00".to_string(),
        duration: "1 day".to_string(),
        location: "Town hall".to_string(),
        organizer_id: UserId::new(organizer_id),
    }
}
