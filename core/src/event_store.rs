//! Remote event store contract.
//!
//! The event store owns users, events, and memberships. The client reads
//! through it and asks it to mutate; it never patches its own copies.
//!
//! # Implementations
//!
//! - `HttpEventStore` (in `localevents-http`): talks to the REST service
//! - `InMemoryEventStore` (in `localevents-testing`): deterministic tests,
//!   with scriptable failures
//!
//! # Example
//!
//! ```no_run
//! use localevents_core::event_store::{EventStore, EventStoreError};
//! use localevents_core::model::{MembershipChange, UserId};
//!
//! async fn join_first<S: EventStore>(store: &S) -> Result<(), EventStoreError> {
//!     let events = store.list_events().await?;
//!     if let Some(event) = events.first() {
//!         store
//!             .join_event(MembershipChange { event_id: event.id, user_id: UserId::new(1) })
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::model::{Event, EventCreate, EventId, MembershipChange, NewUser, User};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Future returned by every [`EventStore`] call
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EventStoreError>> + Send + 'a>>;

/// Errors that can occur talking to the event store.
///
/// `Clone` so that failures can travel inside reducer actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    /// The store could not be reached (connection refused, DNS, timeout).
    #[error("event store unreachable: {0}")]
    Unreachable(String),

    /// The store answered with a non-success status.
    #[error("event store returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The store answered with a body that does not match the contract.
    #[error("could not decode event store response: {0}")]
    Decode(String),
}

impl EventStoreError {
    /// The HTTP status, when the store answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unreachable(_) | Self::Decode(_) => None,
        }
    }
}

/// Remote event store.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the store can
/// live behind `Arc<dyn EventStore>` inside reducer environments, where
/// effects capture a clone of the handle.
pub trait EventStore: Send + Sync {
    /// `GET /events/`
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`]; callers surface it as "list unavailable".
    fn list_events(&self) -> StoreFuture<'_, Vec<Event>>;

    /// `GET /users/`
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`]; callers surface it as "roster unavailable".
    fn list_users(&self) -> StoreFuture<'_, Vec<User>>;

    /// `POST /users/`
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`].
    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User>;

    /// `POST /events/`
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`].
    fn create_event(&self, event: EventCreate) -> StoreFuture<'_, Event>;

    /// `POST /event/join/`, returning the updated event
    ///
    /// Whether joining twice is an error is up to the store.
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`].
    fn join_event(&self, change: MembershipChange) -> StoreFuture<'_, Event>;

    /// `POST /event/quit/`, returning the updated event
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`].
    fn quit_event(&self, change: MembershipChange) -> StoreFuture<'_, Event>;

    /// `DELETE /event/cancel/{event_id}`
    ///
    /// # Errors
    ///
    /// Any [`EventStoreError`].
    fn cancel_event(&self, event_id: EventId) -> StoreFuture<'_, ()>;
}
