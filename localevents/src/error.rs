//! Error types for the LocalEvents client

use crate::intake::ValidationErrors;
use localevents_core::event_store::EventStoreError;
use localevents_runtime::StoreError;
use thiserror::Error;

/// The roster-mutating operations, named for error messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Join an event
    Join,
    /// Quit an event
    Quit,
    /// Cancel an event
    Cancel,
    /// Create an event
    Create,
    /// Register a new user
    RegisterUser,
}

impl Operation {
    /// Human-readable verb phrase
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Join => "join event",
            Self::Quit => "quit event",
            Self::Cancel => "cancel event",
            Self::Create => "create event",
            Self::RegisterUser => "register user",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors surfaced by the LocalEvents client
///
/// Store failures are never retried; they replace the normal view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalEventsError {
    /// The user list could not be fetched
    #[error("Could not load users: {0}")]
    RosterUnavailable(#[source] EventStoreError),

    /// The event list could not be fetched
    #[error("Could not load events: {0}")]
    ListUnavailable(#[source] EventStoreError),

    /// The store rejected a mutation
    #[error("Could not {operation}: {source}")]
    ActionFailed {
        /// What was attempted
        operation: Operation,
        /// The store's answer
        source: EventStoreError,
    },

    /// The persisted session could not be decoded
    #[error("Stored session is corrupt: {0}")]
    CorruptSession(String),

    /// The operation acts on behalf of the active user, and there is none
    #[error("No active user; load the user list or pick a user first")]
    NoActiveUser,

    /// The operation needs admin privilege
    #[error("Only the admin may {0}")]
    NotPermitted(Operation),

    /// The runtime gave up on a dispatch
    #[error(transparent)]
    Runtime(#[from] StoreError),
}

/// Errors from submitting the intake form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The draft is incomplete; it was left untouched
    #[error("Event is incomplete: {0}")]
    Invalid(ValidationErrors),

    /// The draft was valid but creating the event failed
    #[error(transparent)]
    Failed(#[from] LocalEventsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_failed_names_operation_and_status() {
        let error = LocalEventsError::ActionFailed {
            operation: Operation::Cancel,
            source: EventStoreError::Status {
                status: 500,
                body: String::new(),
            },
        };
        let message = error.to_string();
        assert!(message.starts_with("Could not cancel event"));
        assert!(message.contains("500"));
    }

    #[test]
    fn not_permitted_display() {
        assert_eq!(
            LocalEventsError::NotPermitted(Operation::Create).to_string(),
            "Only the admin may create event"
        );
    }
}
