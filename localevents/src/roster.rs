//! Roster engine: which actions each event offers, and the
//! create/join/quit/cancel transitions against the remote store.
//!
//! The event list is never patched locally. A successful mutation
//! invalidates the list (phase `Loading`) and refetches it; a failed one
//! leaves the displayed list alone and records the failure.

use crate::error::{LocalEventsError, Operation};
use crate::session::SessionState;
use localevents_core::effect::Effect;
use localevents_core::event_store::{EventStore, EventStoreError, StoreFuture};
use localevents_core::model::{Event, EventCreate, EventId, MembershipChange, User, UserId};
use localevents_core::reducer::Reducer;
use localevents_core::{SmallVec, smallvec};
use std::sync::Arc;

/// Whether `active` may join `event`
///
/// False without an active user.
#[must_use]
pub fn can_join(event: &Event, active: Option<&User>) -> bool {
    active.is_some_and(|user| !event.has_joiner(user.id))
}

/// Whether `active` may quit `event`
///
/// Exactly one of [`can_join`] and `can_quit` holds whenever there is an
/// active user.
#[must_use]
pub fn can_quit(event: &Event, active: Option<&User>) -> bool {
    active.is_some_and(|user| event.has_joiner(user.id))
}

/// Whether the session may cancel events; any event, not only its own
#[must_use]
pub fn can_cancel(session: &SessionState) -> bool {
    session.is_admin()
}

/// The actions offered on one event card
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllowedActions {
    /// Show "Join"
    pub join: bool,
    /// Show "Quit"
    pub quit: bool,
    /// Show "Cancel"
    pub cancel: bool,
}

impl AllowedActions {
    /// Evaluate all three predicates for `event`
    #[must_use]
    pub fn for_event(event: &Event, session: &SessionState) -> Self {
        let active = session.active_user();
        Self {
            join: can_join(event, active),
            quit: can_quit(event, active),
            cancel: can_cancel(session),
        }
    }
}

/// Display-ready view of one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventCard {
    /// Event id
    pub id: EventId,
    /// Title
    pub title: String,
    /// Formatted start, or the raw `event_dt` when it does not parse
    pub when: String,
    /// Free-form duration
    pub duration: String,
    /// Free-form location
    pub location: String,
    /// Organizer name, empty when not in the roster
    pub organizer: String,
    /// Joiner names, comma separated
    pub joiners: String,
    /// Actions for the active user
    pub actions: AllowedActions,
}

impl EventCard {
    /// Build the card for `event` as seen by `session`
    #[must_use]
    pub fn new(event: &Event, session: &SessionState) -> Self {
        let when = event.starts_at().map_or_else(
            || event.event_dt.clone(),
            |at| at.format("%a %-d %b %Y, %H:%M").to_string(),
        );
        Self {
            id: event.id,
            title: event.title.clone(),
            when,
            duration: event.duration.clone(),
            location: event.location.clone(),
            organizer: session.organizer_name(event.organizer_id).to_string(),
            joiners: event.joiner_names(),
            actions: AllowedActions::for_event(event, session),
        }
    }
}

/// Event list lifecycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ListPhase {
    /// Never fetched
    #[default]
    Idle,
    /// Fetch in flight, or invalidated by a mutation
    Loading,
    /// `RosterState::events` holds the last fetch
    Ready,
    /// The last fetch failed; nothing else is shown
    Failed(String),
}

/// The locally displayed event list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterState {
    /// Where the list is in its lifecycle
    pub phase: ListPhase,
    /// Events from the last successful fetch, in store order
    pub events: Vec<Event>,
    /// Most recent failed mutation, cleared when the next one starts
    pub last_failure: Option<LocalEventsError>,
}

/// Roster actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterAction {
    /// Fetch the event list
    Refresh,
    /// The store returned the event list
    EventsLoaded(Vec<Event>),
    /// The event list could not be fetched
    ListUnavailable(EventStoreError),

    /// Add a user to an event
    Join(MembershipChange),
    /// Remove a user from an event
    Quit(MembershipChange),
    /// Delete an event
    Cancel(EventId),
    /// Create an event
    Create(EventCreate),

    /// The store added the joiner
    Joined(Event),
    /// The store removed the joiner
    Left(Event),
    /// The store deleted the event
    Cancelled(EventId),
    /// The store created the event
    Created(Event),
    /// The store rejected a mutation
    ActionFailed {
        /// What was attempted
        operation: Operation,
        /// The store's answer
        error: EventStoreError,
    },
}

impl RosterAction {
    /// Join on behalf of `user_id`
    #[must_use]
    pub const fn join(event_id: EventId, user_id: UserId) -> Self {
        Self::Join(MembershipChange { event_id, user_id })
    }

    /// Quit on behalf of `user_id`
    #[must_use]
    pub const fn quit(event_id: EventId, user_id: UserId) -> Self {
        Self::Quit(MembershipChange { event_id, user_id })
    }

    /// Whether this is the reply to [`RosterAction::Refresh`]
    #[must_use]
    pub const fn is_list_outcome(&self) -> bool {
        matches!(self, Self::EventsLoaded(_) | Self::ListUnavailable(_))
    }

    /// Whether this is the store's reply to a mutation
    #[must_use]
    pub const fn is_mutation_outcome(&self) -> bool {
        matches!(
            self,
            Self::Joined(_)
                | Self::Left(_)
                | Self::Cancelled(_)
                | Self::Created(_)
                | Self::ActionFailed { .. }
        )
    }
}

/// Roster collaborators
#[derive(Clone)]
pub struct RosterEnvironment {
    /// Remote store
    pub store: Arc<dyn EventStore>,
}

impl RosterEnvironment {
    /// Wrap the store handle
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

/// Roster reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct RosterReducer;

impl RosterReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for RosterReducer {
    type State = RosterState;
    type Action = RosterAction;
    type Environment = RosterEnvironment;

    fn reduce(
        &self,
        state: &mut RosterState,
        action: RosterAction,
        env: &RosterEnvironment,
    ) -> SmallVec<[Effect<RosterAction>; 4]> {
        match action {
            RosterAction::Refresh => invalidate(state, env),

            RosterAction::EventsLoaded(mut events) => {
                for event in &mut events {
                    let removed = event.dedup_joiners();
                    if removed > 0 {
                        tracing::warn!(event_id = %event.id, removed, "Store returned duplicate joiners");
                    }
                }
                tracing::debug!(count = events.len(), "Event list loaded");
                state.events = events;
                state.phase = ListPhase::Ready;
                SmallVec::new()
            },

            RosterAction::ListUnavailable(error) => {
                tracing::debug!(%error, "Event list unavailable");
                state.events.clear();
                state.phase = ListPhase::Failed(error.to_string());
                SmallVec::new()
            },

            RosterAction::Join(change) => {
                state.last_failure = None;
                tracing::debug!(event_id = %change.event_id, user_id = %change.user_id, "Joining event");
                smallvec![mutate(env, Operation::Join, move |store| store.join_event(change), RosterAction::Joined)]
            },

            RosterAction::Quit(change) => {
                state.last_failure = None;
                tracing::debug!(event_id = %change.event_id, user_id = %change.user_id, "Quitting event");
                smallvec![mutate(env, Operation::Quit, move |store| store.quit_event(change), RosterAction::Left)]
            },

            RosterAction::Cancel(event_id) => {
                state.last_failure = None;
                tracing::debug!(%event_id, "Cancelling event");
                smallvec![mutate(
                    env,
                    Operation::Cancel,
                    move |store| store.cancel_event(event_id),
                    move |()| RosterAction::Cancelled(event_id),
                )]
            },

            RosterAction::Create(draft) => {
                state.last_failure = None;
                tracing::debug!(title = %draft.title, "Creating event");
                smallvec![mutate(env, Operation::Create, move |store| store.create_event(draft), RosterAction::Created)]
            },

            RosterAction::Joined(_)
            | RosterAction::Left(_)
            | RosterAction::Cancelled(_)
            | RosterAction::Created(_) => invalidate(state, env),

            RosterAction::ActionFailed { operation, error } => {
                tracing::warn!(%operation, %error, "Store rejected mutation");
                state.last_failure = Some(LocalEventsError::ActionFailed {
                    operation,
                    source: error,
                });
                SmallVec::new()
            },
        }
    }
}

/// Mark the list stale and refetch it
fn invalidate(state: &mut RosterState, env: &RosterEnvironment) -> SmallVec<[Effect<RosterAction>; 4]> {
    state.phase = ListPhase::Loading;
    let store = Arc::clone(&env.store);
    smallvec![Effect::future(async move {
        Some(match store.list_events().await {
            Ok(events) => RosterAction::EventsLoaded(events),
            Err(error) => RosterAction::ListUnavailable(error),
        })
    })]
}

/// Run one store mutation, replying with `on_success` or `ActionFailed`
fn mutate<T, C, S>(env: &RosterEnvironment, operation: Operation, call: C, on_success: S) -> Effect<RosterAction>
where
    C: for<'a> FnOnce(&'a dyn EventStore) -> StoreFuture<'a, T> + Send + 'static,
    S: FnOnce(T) -> RosterAction + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&env.store);
    Effect::future(async move {
        Some(match call(store.as_ref()).await {
            Ok(value) => on_success(value),
            Err(error) => RosterAction::ActionFailed { operation, error },
        })
    })
}
