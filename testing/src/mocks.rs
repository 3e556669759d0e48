//! In-memory collaborators for tests
//!
//! - [`InMemoryEventStore`]: behaves like the REST store, records every call,
//!   and can be told to fail specific calls
//! - [`MemorySessionStorage`]: `HashMap`-backed session storage

use localevents_core::event_store::{EventStore, EventStoreError, StoreFuture};
use localevents_core::model::{Event, EventCreate, EventId, MembershipChange, NewUser, User, UserId};
use localevents_core::session_storage::{SessionKey, SessionStorage, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The calls an [`EventStore`] can receive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreCall {
    /// `list_events`
    ListEvents,
    /// `list_users`
    ListUsers,
    /// `create_user`
    CreateUser,
    /// `create_event`
    CreateEvent,
    /// `join_event`
    JoinEvent,
    /// `quit_event`
    QuitEvent,
    /// `cancel_event`
    CancelEvent,
}

#[derive(Debug, Default)]
struct StoreData {
    users: Vec<User>,
    events: Vec<Event>,
    next_user_id: i64,
    next_event_id: i64,
    failures: HashMap<StoreCall, EventStoreError>,
    calls: Vec<StoreCall>,
}

impl StoreData {
    fn user(&self, id: UserId) -> Result<User, EventStoreError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| not_found(format!("User {id} not found")))
    }

    fn event_mut(&mut self, id: EventId) -> Result<&mut Event, EventStoreError> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found(format!("Event {id} not found")))
    }
}

fn not_found(body: String) -> EventStoreError {
    EventStoreError::Status { status: 404, body }
}

/// In-memory event store.
///
/// Joining twice is idempotent, matching the contract that deduplication is
/// the store's job. Ids are assigned after the highest seeded id.
///
/// # Example
///
/// ```
/// use localevents_testing::mocks::{InMemoryEventStore, StoreCall};
/// use localevents_testing::fixtures::user;
/// use localevents_core::EventStore;
///
/// # async fn example() {
/// let store = InMemoryEventStore::new().with_users(vec![user(1, "alice")]);
/// store.fail(StoreCall::ListEvents, 503);
///
/// assert!(store.list_events().await.is_err());
/// assert_eq!(store.list_users().await.unwrap().len(), 1);
/// assert_eq!(store.calls(), vec![StoreCall::ListEvents, StoreCall::ListUsers]);
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventStore {
    data: Arc<Mutex<StoreData>>,
}

impl InMemoryEventStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed users
    #[must_use]
    pub fn with_users(self, users: Vec<User>) -> Self {
        {
            let mut data = self.lock();
            data.next_user_id = users.iter().map(|u| u.id.get()).max().unwrap_or(0);
            data.users = users;
        }
        self
    }

    /// Seed events
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        {
            let mut data = self.lock();
            data.next_event_id = events.iter().map(|e| e.id.get()).max().unwrap_or(0);
            data.events = events;
        }
        self
    }

    /// Make every subsequent `call` answer with `status` until [`Self::recover`]
    pub fn fail(&self, call: StoreCall, status: u16) {
        self.fail_with(
            call,
            EventStoreError::Status {
                status,
                body: "Internal Server Error".to_string(),
            },
        );
    }

    /// Make every subsequent `call` fail with `error` until [`Self::recover`]
    pub fn fail_with(&self, call: StoreCall, error: EventStoreError) {
        self.lock().failures.insert(call, error);
    }

    /// Stop failing `call`
    pub fn recover(&self, call: StoreCall) {
        self.lock().failures.remove(&call);
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// How many times `call` was received
    #[must_use]
    pub fn call_count(&self, call: StoreCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Current events
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Current users
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    // A poisoned lock only means another test thread panicked mid-call; the
    // data is still the best answer available.
    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn handle<T, F>(&self, call: StoreCall, op: F) -> StoreFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreData) -> Result<T, EventStoreError>,
    {
        let result = {
            let mut data = self.lock();
            data.calls.push(call);
            match data.failures.get(&call) {
                Some(error) => Err(error.clone()),
                None => op(&mut data),
            }
        };
        Box::pin(std::future::ready(result))
    }
}

impl EventStore for InMemoryEventStore {
    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        self.handle(StoreCall::ListEvents, |data| Ok(data.events.clone()))
    }

    fn list_users(&self) -> StoreFuture<'_, Vec<User>> {
        self.handle(StoreCall::ListUsers, |data| Ok(data.users.clone()))
    }

    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User> {
        self.handle(StoreCall::CreateUser, move |data| {
            data.next_user_id += 1;
            let created = User::new(UserId::new(data.next_user_id), user.name);
            data.users.push(created.clone());
            Ok(created)
        })
    }

    fn create_event(&self, event: EventCreate) -> StoreFuture<'_, Event> {
        self.handle(StoreCall::CreateEvent, move |data| {
            data.next_event_id += 1;
            let created = Event {
                id: EventId::new(data.next_event_id),
                title: event.title,
                event_dt: event.event_dt,
                duration: event.duration,
                location: event.location,
                organizer_id: event.organizer_id,
                joiners: Vec::new(),
            };
            data.events.push(created.clone());
            Ok(created)
        })
    }

    fn join_event(&self, change: MembershipChange) -> StoreFuture<'_, Event> {
        self.handle(StoreCall::JoinEvent, move |data| {
            let user = data.user(change.user_id)?;
            let event = data.event_mut(change.event_id)?;
            if !event.has_joiner(user.id) {
                event.joiners.push(user);
            }
            Ok(event.clone())
        })
    }

    fn quit_event(&self, change: MembershipChange) -> StoreFuture<'_, Event> {
        self.handle(StoreCall::QuitEvent, move |data| {
            let user = data.user(change.user_id)?;
            let event = data.event_mut(change.event_id)?;
            if !event.has_joiner(user.id) {
                return Err(not_found(format!(
                    "User {} has not joined event {}",
                    user.id, event.id
                )));
            }
            event.joiners.retain(|u| u.id != user.id);
            Ok(event.clone())
        })
    }

    fn cancel_event(&self, event_id: EventId) -> StoreFuture<'_, ()> {
        self.handle(StoreCall::CancelEvent, move |data| {
            let before = data.events.len();
            data.events.retain(|e| e.id != event_id);
            if data.events.len() == before {
                return Err(not_found(format!("Event {event_id} not found")));
            }
            Ok(())
        })
    }
}

/// In-memory session storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStorage {
    entries: Arc<Mutex<HashMap<SessionKey, String>>>,
    failing_writes: Arc<Mutex<bool>>,
}

impl MemorySessionStorage {
    /// Create empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw entry, e.g. to simulate a corrupt session
    #[must_use]
    pub fn with_entry(self, key: SessionKey, value: impl Into<String>) -> Self {
        self.lock_entries().insert(key, value.into());
        self
    }

    /// Raw entry contents
    #[must_use]
    pub fn entry(&self, key: SessionKey) -> Option<String> {
        self.lock_entries().get(&key).cloned()
    }

    /// Make writes fail (or succeed again)
    pub fn set_failing_writes(&self, failing: bool) {
        *self
            .failing_writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = failing;
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<SessionKey, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn writes_fail(&self) -> bool {
        *self
            .failing_writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn read(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        Ok(self.entry(key))
    }

    fn write(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        if self.writes_fail() {
            return Err(StorageError::Write {
                key,
                message: "storage is read-only".to_string(),
            });
        }
        self.lock_entries().insert(key, value.to_string());
        Ok(())
    }
}
