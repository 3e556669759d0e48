//! Domain types shared by every LocalEvents component.
//!
//! Users and events are owned by the remote event store; the client only
//! holds read-through copies. Membership is not a stored entity of its own: a
//! user is a member of an event when they appear in that event's `joiners`.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a user in the event store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw store identifier
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw store identifier
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an event in the event store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wrap a raw store identifier
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw store identifier
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A known user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier
    pub id: UserId,
    /// Display name. The literal `"admin"` carries elevated privilege.
    pub name: String,
}

impl User {
    /// Creates a user record
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Body of a user registration request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name for the new user
    pub name: String,
}

/// A scheduled event as returned by the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store identifier
    pub id: EventId,
    /// Title shown on the event card
    pub title: String,
    /// Start time as transmitted (ISO-like, e.g. `2024-10-30T10:00`)
    pub event_dt: String,
    /// Free-form duration, e.g. `"1 day"`
    pub duration: String,
    /// Free-form location
    pub location: String,
    /// The user who created the event
    pub organizer_id: UserId,
    /// Members of the event, in the order the store returned them
    #[serde(default, deserialize_with = "deserialize_joiners")]
    pub joiners: Vec<User>,
}

// The store may send `"joiners": null` for an event nobody has joined.
fn deserialize_joiners<'de, D>(deserializer: D) -> Result<Vec<User>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<User>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The four required text fields shared by [`Event`] and [`EventCreate`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    /// `title`
    Title,
    /// `event_dt`
    EventDt,
    /// `duration`
    Duration,
    /// `location`
    Location,
}

impl EventField {
    /// All required fields, in form order
    pub const ALL: [Self; 4] = [Self::Title, Self::EventDt, Self::Duration, Self::Location];

    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::EventDt => "event_dt",
            Self::Duration => "duration",
            Self::Location => "location",
        }
    }
}

impl std::fmt::Display for EventField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an event fails the structural contract
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    /// A required text field is empty
    #[error("required field `{0}` is empty")]
    EmptyField(EventField),

    /// `organizer_id` does not reference a user in the roster
    #[error("organizer {0} is not a known user")]
    UnknownOrganizer(UserId),
}

impl Event {
    /// Value of one of the required text fields
    #[must_use]
    pub fn field(&self, field: EventField) -> &str {
        match field {
            EventField::Title => &self.title,
            EventField::EventDt => &self.event_dt,
            EventField::Duration => &self.duration,
            EventField::Location => &self.location,
        }
    }

    /// Check the structural contract against a known roster
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: an empty required field, then an
    /// organizer that is not in `roster`.
    pub fn check_well_formed(&self, roster: &[User]) -> Result<(), MalformedEvent> {
        if let Some(field) = EventField::ALL
            .into_iter()
            .find(|field| self.field(*field).is_empty())
        {
            return Err(MalformedEvent::EmptyField(field));
        }

        if !roster.iter().any(|u| u.id == self.organizer_id) {
            return Err(MalformedEvent::UnknownOrganizer(self.organizer_id));
        }

        Ok(())
    }

    /// Whether `user_id` is in the joiner set
    #[must_use]
    pub fn has_joiner(&self, user_id: UserId) -> bool {
        self.joiners.iter().any(|u| u.id == user_id)
    }

    /// Joiner names in display order, comma separated
    #[must_use]
    pub fn joiner_names(&self) -> String {
        self.joiners
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Drop repeated joiners, keeping the first occurrence of each id
    ///
    /// Returns the number of entries removed.
    pub fn dedup_joiners(&mut self) -> usize {
        let before = self.joiners.len();
        let mut seen = Vec::with_capacity(before);
        self.joiners.retain(|u| {
            if seen.contains(&u.id) {
                false
            } else {
                seen.push(u.id);
                true
            }
        });
        before - self.joiners.len()
    }

    /// Parse `event_dt` for display
    ///
    /// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS[.fff]`, and RFC 3339.
    /// Offsets are dropped; the wall-clock time is what the organizer entered.
    #[must_use]
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_event_dt(&self.event_dt)
    }
}

/// Parse an ISO-like event timestamp
#[must_use]
pub fn parse_event_dt(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

/// Payload for creating an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreate {
    /// Title
    pub title: String,
    /// Start time, ISO-like
    pub event_dt: String,
    /// Free-form duration
    pub duration: String,
    /// Free-form location
    pub location: String,
    /// Creator of the event
    pub organizer_id: UserId,
}

impl EventCreate {
    /// Value of one of the required text fields
    #[must_use]
    pub fn field(&self, field: EventField) -> &str {
        match field {
            EventField::Title => &self.title,
            EventField::EventDt => &self.event_dt,
            EventField::Duration => &self.duration,
            EventField::Location => &self.location,
        }
    }

    /// Mutable access to one of the required text fields
    pub fn field_mut(&mut self, field: EventField) -> &mut String {
        match field {
            EventField::Title => &mut self.title,
            EventField::EventDt => &mut self.event_dt,
            EventField::Duration => &mut self.duration,
            EventField::Location => &mut self.location,
        }
    }
}

/// Body of a join or quit request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChange {
    /// Event whose joiner set changes
    pub event_id: EventId,
    /// User being added or removed
    pub user_id: UserId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> User {
        User::new(UserId::new(id), name)
    }

    fn event(joiners: Vec<User>) -> Event {
        Event {
            id: EventId::new(10),
            title: "Picnic".to_string(),
            event_dt: "2024-10-30T10:00".to_string(),
            duration: "1 day".to_string(),
            location: "Park".to_string(),
            organizer_id: UserId::new(1),
            joiners,
        }
    }

    #[test]
    fn well_formed_event_passes() {
        let roster = vec![user(1, "alice")];
        assert_eq!(event(vec![]).check_well_formed(&roster), Ok(()));
    }

    #[test]
    fn empty_field_is_reported_first() {
        let mut e = event(vec![]);
        e.duration.clear();
        e.organizer_id = UserId::new(99);
        assert_eq!(
            e.check_well_formed(&[user(1, "alice")]),
            Err(MalformedEvent::EmptyField(EventField::Duration))
        );
    }

    #[test]
    fn unknown_organizer_is_malformed() {
        assert_eq!(
            event(vec![]).check_well_formed(&[user(2, "bob")]),
            Err(MalformedEvent::UnknownOrganizer(UserId::new(1)))
        );
    }

    #[test]
    fn organizer_is_not_implicitly_a_joiner() {
        let e = event(vec![user(2, "bob")]);
        assert!(!e.has_joiner(e.organizer_id));
        assert!(e.has_joiner(UserId::new(2)));
    }

    #[test]
    fn joiner_names_keep_store_order() {
        let e = event(vec![user(3, "carol"), user(1, "alice")]);
        assert_eq!(e.joiner_names(), "carol, alice");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut e = event(vec![user(2, "bob"), user(1, "alice"), user(2, "bob")]);
        assert_eq!(e.dedup_joiners(), 1);
        assert_eq!(e.joiner_names(), "bob, alice");
    }

    #[test]
    fn event_dt_formats() {
        let minutes = parse_event_dt("2024-10-30T10:00").unwrap();
        assert_eq!(minutes.to_string(), "2024-10-30 10:00:00");

        let seconds = parse_event_dt("2024-10-30T10:00:30.250").unwrap();
        assert_eq!(seconds.format("%H:%M:%S").to_string(), "10:00:30");

        let rfc = parse_event_dt("2024-10-30T10:00:00+02:00").unwrap();
        assert_eq!(rfc.to_string(), "2024-10-30 10:00:00");

        assert!(parse_event_dt("next tuesday").is_none());
    }

    #[test]
    fn null_joiners_deserialize_as_empty() {
        let json = r#"{"id":10,"title":"Picnic","event_dt":"2024-10-30T10:00:00",
            "duration":"1 day","location":"Park","organizer_id":1,"joiners":null}"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert!(e.joiners.is_empty());
        assert_eq!(e.id, EventId::new(10));
    }

    #[test]
    fn membership_change_wire_shape() {
        let body = MembershipChange {
            event_id: EventId::new(10),
            user_id: UserId::new(2),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"event_id": 10, "user_id": 2})
        );
    }
}
