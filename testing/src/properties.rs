//! proptest strategies for domain types.
//!
//! Rosters have unique ids; events draw organizer and joiners from a roster
//! and never contain the same joiner twice.

use localevents_core::model::{Event, EventId, User, UserId};
use proptest::prelude::*;
use proptest::sample::subsequence;

/// A user name, occasionally the reserved `"admin"`
pub fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just("admin".to_string()),
        1 => Just("Admin".to_string()),
        4 => "[a-z]{1,8}",
    ]
}

/// A roster of 1..=8 users with distinct ids
pub fn arb_roster() -> impl Strategy<Value = Vec<User>> {
    prop::collection::btree_set(1i64..1_000, 1..=8).prop_flat_map(|ids| {
        let ids: Vec<i64> = ids.into_iter().collect();
        prop::collection::vec(arb_name(), ids.len()).prop_map(move |names| {
            ids.iter()
                .zip(names)
                .map(|(id, name)| User::new(UserId::new(*id), name))
                .collect()
        })
    })
}

/// An event whose organizer and joiners come from `roster`
pub fn arb_event(roster: Vec<User>) -> impl Strategy<Value = Event> {
    let len = roster.len();
    (
        1i64..10_000,
        0..len.max(1),
        subsequence(roster.clone(), 0..=len),
    )
        .prop_map(move |(id, organizer, joiners)| Event {
            id: EventId::new(id),
            title: "Generated".to_string(),
            event_dt: "2024-10-30T10:00".to_string(),
            duration: "1 day".to_string(),
            location: "Somewhere".to_string(),
            organizer_id: roster.get(organizer).map_or(UserId::new(0), |u| u.id),
            joiners,
        })
}

/// A roster, one event over it, and an index into the roster
pub fn arb_roster_event_member() -> impl Strategy<Value = (Vec<User>, Event, usize)> {
    arb_roster().prop_flat_map(|roster| {
        let len = roster.len();
        (Just(roster.clone()), arb_event(roster), 0..len)
    })
}
