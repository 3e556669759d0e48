//! Session resolver: who is acting, and with what privilege.
//!
//! The active user and the cached roster live in a [`SessionState`] owned by
//! a runtime `Store`. The reducer never touches the event store or session
//! storage directly; list/register calls and storage writes are effects.
//!
//! Persisted form: key `active` holds one JSON `User` (or `null` once the
//! roster comes back empty), key `users` a JSON array of `User`. Both are
//! overwritten, never merged.

use crate::error::LocalEventsError;
use localevents_core::effect::Effect;
use localevents_core::event_store::{EventStore, EventStoreError};
use localevents_core::model::{NewUser, User, UserId};
use localevents_core::reducer::Reducer;
use localevents_core::session_storage::{SessionKey, SessionStorage};
use localevents_core::{SmallVec, smallvec};
use std::sync::Arc;

/// Name of the only privileged user
pub const ADMIN_NAME: &str = "admin";

/// The active user plus the roster they were chosen from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    active: Option<User>,
    roster: Vec<User>,
}

impl SessionState {
    /// Build a session from an already-known roster and active user
    ///
    /// An active user missing from `roster` is dropped.
    #[must_use]
    pub fn new(roster: Vec<User>, active: Option<UserId>) -> Self {
        let active = active.and_then(|id| roster.iter().find(|u| u.id == id).cloned());
        Self { active, roster }
    }

    /// Restore the session persisted in `storage`
    ///
    /// Missing entries yield an empty session.
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::CorruptSession`] if an entry cannot be read or
    /// decoded, or if the active user is not exactly a member of the stored
    /// roster.
    pub fn restore(storage: &dyn SessionStorage) -> Result<Self, LocalEventsError> {
        let roster: Vec<User> = match read_entry(storage, SessionKey::Users)? {
            Some(raw) => decode(SessionKey::Users, &raw)?,
            None => Vec::new(),
        };
        let saved: Option<User> = match read_entry(storage, SessionKey::Active)? {
            Some(raw) => decode(SessionKey::Active, &raw)?,
            None => None,
        };

        // Only the id is trusted; name and privilege come from the roster
        let active = match saved {
            Some(user) => match roster.iter().find(|u| u.id == user.id) {
                Some(known) if *known == user => Some(known.clone()),
                Some(_) => {
                    return Err(LocalEventsError::CorruptSession(format!(
                        "active user {} does not match the stored roster",
                        user.id
                    )));
                },
                None => {
                    return Err(LocalEventsError::CorruptSession(format!(
                        "active user {} is not in the stored roster",
                        user.id
                    )));
                },
            },
            None => None,
        };

        Ok(Self { active, roster })
    }

    /// [`Self::restore`], falling back to an empty session on corruption
    #[must_use]
    pub fn restore_or_default(storage: &dyn SessionStorage) -> Self {
        Self::restore(storage).unwrap_or_else(|error| {
            tracing::warn!(%error, "Ignoring stored session");
            Self::default()
        })
    }

    /// The user currently acting, if the roster has loaded
    #[must_use]
    pub const fn active_user(&self) -> Option<&User> {
        self.active.as_ref()
    }

    /// The cached roster, in store order
    #[must_use]
    pub fn roster(&self) -> &[User] {
        &self.roster
    }

    /// Look a user up in the cached roster
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.roster.iter().find(|u| u.id == id)
    }

    /// Whether the active user is the admin
    ///
    /// The comparison is exact: `"Admin"` is not privileged.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.active.as_ref().is_some_and(|u| u.name == ADMIN_NAME)
    }

    /// Display name for an organizer, or `""` when unknown
    #[must_use]
    pub fn organizer_name(&self, organizer_id: UserId) -> &str {
        self.user(organizer_id).map_or("", |u| u.name.as_str())
    }
}

fn read_entry(storage: &dyn SessionStorage, key: SessionKey) -> Result<Option<String>, LocalEventsError> {
    storage
        .read(key)
        .map_err(|e| LocalEventsError::CorruptSession(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(key: SessionKey, raw: &str) -> Result<T, LocalEventsError> {
    serde_json::from_str(raw)
        .map_err(|e| LocalEventsError::CorruptSession(format!("entry `{key}`: {e}")))
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Fetch the user list
    LoadRoster,
    /// The store returned the user list
    RosterLoaded(Vec<User>),
    /// The user list could not be fetched
    RosterUnavailable(EventStoreError),
    /// Act as another user from the roster
    SetActive(UserId),
    /// Create a user, then reload the roster
    RegisterUser(String),
    /// The store created the user
    UserRegistered(User),
    /// The store rejected the new user
    RegistrationFailed(EventStoreError),
}

impl SessionAction {
    /// Whether this is the reply to [`SessionAction::LoadRoster`]
    #[must_use]
    pub const fn is_roster_outcome(&self) -> bool {
        matches!(self, Self::RosterLoaded(_) | Self::RosterUnavailable(_))
    }
}

/// Session collaborators
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Remote store, for the user list
    pub store: Arc<dyn EventStore>,
    /// Where the session survives between runs
    pub storage: Arc<dyn SessionStorage>,
}

impl SessionEnvironment {
    /// Bundle the collaborators
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { store, storage }
    }
}

/// Session reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut SessionState,
        action: SessionAction,
        env: &SessionEnvironment,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        match action {
            SessionAction::LoadRoster => smallvec![fetch_roster(env)],

            SessionAction::RosterLoaded(users) => {
                let previous = state.active.take();
                state.active = match previous {
                    Some(current) => users
                        .iter()
                        .find(|u| u.id == current.id)
                        .or_else(|| users.first())
                        .cloned(),
                    None => users.first().cloned(),
                };
                state.roster = users;

                match &state.active {
                    Some(active) => tracing::debug!(
                        user_id = %active.id,
                        roster_size = state.roster.len(),
                        "Roster loaded"
                    ),
                    None => tracing::debug!("Loaded an empty roster; no active user"),
                }
                // Roster first, so a restored active user always has a roster to match
                smallvec![Effect::chain(vec![
                    persist(env, SessionKey::Users, &state.roster),
                    persist(env, SessionKey::Active, &state.active),
                ])]
            },

            SessionAction::RosterUnavailable(error) => {
                tracing::debug!(%error, "User list unavailable");
                SmallVec::new()
            },

            SessionAction::SetActive(user_id) => {
                let Some(user) = state.user(user_id).cloned() else {
                    tracing::debug!(%user_id, "Ignoring unknown user");
                    return SmallVec::new();
                };
                tracing::debug!(%user_id, "Active user changed");
                let effect = persist(env, SessionKey::Active, &user);
                state.active = Some(user);
                smallvec![effect]
            },

            SessionAction::RegisterUser(name) => {
                let store = Arc::clone(&env.store);
                smallvec![Effect::future(async move {
                    Some(match store.create_user(NewUser { name }).await {
                        Ok(user) => SessionAction::UserRegistered(user),
                        Err(error) => SessionAction::RegistrationFailed(error),
                    })
                })]
            },

            SessionAction::UserRegistered(user) => {
                tracing::debug!(user_id = %user.id, "User registered");
                smallvec![fetch_roster(env)]
            },

            SessionAction::RegistrationFailed(error) => {
                tracing::warn!(%error, "User registration failed");
                SmallVec::new()
            },
        }
    }
}

fn fetch_roster(env: &SessionEnvironment) -> Effect<SessionAction> {
    let store = Arc::clone(&env.store);
    Effect::future(async move {
        Some(match store.list_users().await {
            Ok(users) => SessionAction::RosterLoaded(users),
            Err(error) => SessionAction::RosterUnavailable(error),
        })
    })
}

/// Write one entry; failures are logged and otherwise ignored
fn persist<T: serde::Serialize>(env: &SessionEnvironment, key: SessionKey, value: &T) -> Effect<SessionAction> {
    let encoded = serde_json::to_string(value);
    let storage = Arc::clone(&env.storage);
    Effect::future(async move {
        let result = encoded
            .map_err(|e| e.to_string())
            .and_then(|json| storage.write(key, &json).map_err(|e| e.to_string()));
        if let Err(error) = result {
            tracing::warn!(%key, %error, "Could not persist session entry");
        }
        None
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use localevents_testing::fixtures::{alice_and_admin, user};
    use localevents_testing::{InMemoryEventStore, MemorySessionStorage, ReducerTest, StoreCall, assertions};

    fn env_with(store: InMemoryEventStore, storage: MemorySessionStorage) -> SessionEnvironment {
        SessionEnvironment::new(Arc::new(store), Arc::new(storage))
    }

    fn env() -> SessionEnvironment {
        env_with(
            InMemoryEventStore::new().with_users(alice_and_admin()),
            MemorySessionStorage::new(),
        )
    }

    #[test]
    fn first_user_becomes_active_by_default() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::RosterLoaded(alice_and_admin()))
            .then_state(|s| {
                assert_eq!(s.active_user(), Some(&user(1, "alice")));
                assert_eq!(s.roster().len(), 2);
            })
            .then_effects(|effects| assertions::assert_future_count(effects, 2))
            .run();
    }

    #[test]
    fn reload_keeps_active_user_still_in_roster() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::new(alice_and_admin(), Some(UserId::new(2))))
            .when_action(SessionAction::RosterLoaded(vec![
                user(1, "alice"),
                user(2, "admin"),
                user(3, "carol"),
            ]))
            .then_state(|s| assert_eq!(s.active_user(), Some(&user(2, "admin"))))
            .run();
    }

    #[test]
    fn reload_replaces_departed_active_user() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::new(alice_and_admin(), Some(UserId::new(2))))
            .when_action(SessionAction::RosterLoaded(vec![user(3, "carol"), user(1, "alice")]))
            .then_state(|s| assert_eq!(s.active_user(), Some(&user(3, "carol"))))
            .run();
    }

    #[tokio::test]
    async fn empty_roster_clears_persisted_session() {
        let storage = MemorySessionStorage::new()
            .with_entry(SessionKey::Users, r#"[{"id":2,"name":"admin"}]"#)
            .with_entry(SessionKey::Active, r#"{"id":2,"name":"admin"}"#);
        let restored = SessionState::restore(&storage).unwrap();

        ReducerTest::new(SessionReducer::new())
            .with_env(env_with(InMemoryEventStore::new(), storage.clone()))
            .given_state(restored)
            .when_action(SessionAction::RosterLoaded(Vec::new()))
            .then_state(|s| {
                assert!(s.active_user().is_none());
                assert!(!s.is_admin());
            })
            .then_effects(|effects| assertions::assert_future_count(effects, 2))
            .run_to_completion()
            .await;

        assert_eq!(storage.entry(SessionKey::Users).as_deref(), Some("[]"));
        assert_eq!(storage.entry(SessionKey::Active).as_deref(), Some("null"));
        assert_eq!(SessionState::restore(&storage).unwrap(), SessionState::default());
    }

    #[test]
    fn set_active_to_unknown_user_is_a_no_op() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::new(alice_and_admin(), Some(UserId::new(1))))
            .when_action(SessionAction::SetActive(UserId::new(99)))
            .then_state(|s| assert_eq!(s.active_user(), Some(&user(1, "alice"))))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn set_active_persists_selection() {
        let storage = MemorySessionStorage::new();
        ReducerTest::new(SessionReducer::new())
            .with_env(env_with(InMemoryEventStore::new(), storage.clone()))
            .given_state(SessionState::new(alice_and_admin(), Some(UserId::new(1))))
            .when_action(SessionAction::SetActive(UserId::new(2)))
            .then_state(|s| assert!(s.is_admin()))
            .run_to_completion()
            .await;

        let stored: User = serde_json::from_str(&storage.entry(SessionKey::Active).unwrap()).unwrap();
        assert_eq!(stored, user(2, "admin"));
    }

    #[tokio::test]
    async fn register_user_reloads_roster() {
        let store = InMemoryEventStore::new().with_users(alice_and_admin());
        ReducerTest::new(SessionReducer::new())
            .with_env(env_with(store.clone(), MemorySessionStorage::new()))
            .given_state(SessionState::default())
            .when_action(SessionAction::RegisterUser("carol".into()))
            .then_feedback(|actions| {
                assert!(matches!(&actions[0], SessionAction::UserRegistered(u) if u.name == "carol"));
                assert!(matches!(&actions[1], SessionAction::RosterLoaded(users) if users.len() == 3));
            })
            .then_state(|s| assert_eq!(s.roster().len(), 3))
            .run_to_completion()
            .await;

        assert_eq!(store.calls(), vec![StoreCall::CreateUser, StoreCall::ListUsers]);
    }

    #[test]
    fn admin_check_is_exact() {
        let session = SessionState::new(vec![user(1, "Admin"), user(2, "admin ")], Some(UserId::new(1)));
        assert!(!session.is_admin());
        assert!(SessionState::new(alice_and_admin(), Some(UserId::new(2))).is_admin());
        assert!(!SessionState::default().is_admin());
    }

    #[test]
    fn organizer_name_degrades_to_empty() {
        let session = SessionState::new(alice_and_admin(), None);
        assert_eq!(session.organizer_name(UserId::new(2)), "admin");
        assert_eq!(session.organizer_name(UserId::new(9)), "");
        assert_eq!(SessionState::default().organizer_name(UserId::new(1)), "");
    }

    #[test]
    fn restore_round_trips_persisted_entries() {
        let storage = MemorySessionStorage::new()
            .with_entry(SessionKey::Users, r#"[{"id":1,"name":"alice"},{"id":2,"name":"admin"}]"#)
            .with_entry(SessionKey::Active, r#"{"id":2,"name":"admin"}"#);

        let session = SessionState::restore(&storage).unwrap();

        assert!(session.is_admin());
        assert_eq!(session.roster(), alice_and_admin().as_slice());
    }

    #[test]
    fn restore_rejects_undecodable_entry() {
        let storage = MemorySessionStorage::new().with_entry(SessionKey::Active, "{not json");
        assert!(matches!(
            SessionState::restore(&storage),
            Err(LocalEventsError::CorruptSession(_))
        ));
    }

    #[test]
    fn restore_rejects_active_user_outside_roster() {
        let storage = MemorySessionStorage::new()
            .with_entry(SessionKey::Users, r#"[{"id":1,"name":"alice"}]"#)
            .with_entry(SessionKey::Active, r#"{"id":2,"name":"admin"}"#);

        assert!(matches!(
            SessionState::restore(&storage),
            Err(LocalEventsError::CorruptSession(_))
        ));
        assert_eq!(SessionState::restore_or_default(&storage), SessionState::default());
    }

    #[test]
    fn restore_rejects_active_user_renamed_outside_roster() {
        let storage = MemorySessionStorage::new()
            .with_entry(SessionKey::Users, r#"[{"id":1,"name":"alice"}]"#)
            .with_entry(SessionKey::Active, r#"{"id":1,"name":"admin"}"#);

        assert!(matches!(
            SessionState::restore(&storage),
            Err(LocalEventsError::CorruptSession(_))
        ));

        let fallback = SessionState::restore_or_default(&storage);
        assert!(!fallback.is_admin());
        assert!(fallback.active_user().is_none());
    }
}
