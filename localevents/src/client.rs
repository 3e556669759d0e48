//! The client façade: session and roster stores behind one `async` API.
//!
//! Every call is one request/response exchange with the event store. The
//! underlying stores serialize dispatch, so a call returns only after the
//! store's reply and any follow-up refresh have been reduced.

use crate::error::{LocalEventsError, Operation, SubmitError};
use crate::intake::IntakeForm;
use crate::roster::{AllowedActions, EventCard, ListPhase, RosterAction, RosterEnvironment, RosterReducer, RosterState};
use crate::session::{SessionAction, SessionEnvironment, SessionReducer, SessionState};
use localevents_core::event_store::EventStore;
use localevents_core::model::{Event, EventCreate, EventId, User, UserId};
use localevents_core::session_storage::SessionStorage;
use localevents_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;

/// Smallest usable feedback limit
///
/// One exchange reduces the request, the store's reply, and the refresh that
/// follows it (e.g. `Join`, `Joined`, `EventsLoaded`).
pub const MIN_FEEDBACK_LIMIT: usize = 3;

/// Store running the session resolver
pub type SessionStore = Store<SessionState, SessionAction, SessionEnvironment, SessionReducer>;

/// Store running the roster engine
pub type RosterStore = Store<RosterState, RosterAction, RosterEnvironment, RosterReducer>;

/// LocalEvents client
///
/// Cheap to clone; clones share both stores.
///
/// # Example
///
/// ```ignore
/// let client = LocalEvents::new(HttpEventStore::new(url)?, FileSessionStorage::new(dir));
///
/// client.load_roster().await?;
/// for card in client.refresh_cards().await? {
///     println!("{} ({})", card.title, card.when);
/// }
/// ```
#[derive(Clone)]
pub struct LocalEvents {
    session: SessionStore,
    roster: RosterStore,
}

impl LocalEvents {
    /// Create a client with the default store configuration
    ///
    /// The session is restored from `storage`; a corrupt one is discarded.
    #[must_use]
    pub fn new<S, T>(store: S, storage: T) -> Self
    where
        S: EventStore + 'static,
        T: SessionStorage + 'static,
    {
        Self::with_config(Arc::new(store), Arc::new(storage), StoreConfig::default())
    }

    /// Create a client from shared handles and an explicit store configuration
    ///
    /// A feedback limit below [`MIN_FEEDBACK_LIMIT`] is raised to it.
    #[must_use]
    pub fn with_config(
        store: Arc<dyn EventStore>,
        storage: Arc<dyn SessionStorage>,
        config: StoreConfig,
    ) -> Self {
        let config = if config.feedback_limit < MIN_FEEDBACK_LIMIT {
            tracing::warn!(
                requested = config.feedback_limit,
                minimum = MIN_FEEDBACK_LIMIT,
                "Feedback limit too small for one exchange, raising it"
            );
            config.with_feedback_limit(MIN_FEEDBACK_LIMIT)
        } else {
            config
        };
        let restored = SessionState::restore_or_default(storage.as_ref());
        let session = Store::with_config(
            restored,
            SessionReducer::new(),
            SessionEnvironment::new(Arc::clone(&store), storage),
            config,
        );
        let roster = Store::with_config(
            RosterState::default(),
            RosterReducer::new(),
            RosterEnvironment::new(store),
            config,
        );
        Self { session, roster }
    }

    // Session ------------------------------------------------------------

    /// Fetch the user list, defaulting the active user to the first user
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::RosterUnavailable`] if the store cannot answer.
    #[tracing::instrument(skip(self))]
    pub async fn load_roster(&self) -> Result<Vec<User>, LocalEventsError> {
        match self
            .session
            .send_and_wait_for(SessionAction::LoadRoster, SessionAction::is_roster_outcome)
            .await?
        {
            SessionAction::RosterLoaded(users) => Ok(users),
            SessionAction::RosterUnavailable(error) => Err(LocalEventsError::RosterUnavailable(error)),
            _ => Err(no_reply()),
        }
    }

    /// Act as `user_id`; ignored if that user is not in the cached roster
    ///
    /// # Errors
    ///
    /// Only [`LocalEventsError::Runtime`].
    pub async fn set_active(&self, user_id: UserId) -> Result<(), LocalEventsError> {
        self.session.send(SessionAction::SetActive(user_id)).await?;
        Ok(())
    }

    /// Create a user, then reload the roster
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::ActionFailed`] if the store rejects the user, or
    /// [`LocalEventsError::RosterUnavailable`] if the reload fails.
    #[tracing::instrument(skip(self, name))]
    pub async fn register_user(&self, name: impl Into<String>) -> Result<User, LocalEventsError> {
        let feedback = self.session.send(SessionAction::RegisterUser(name.into())).await?;

        let mut registered = None;
        for action in feedback {
            match action {
                SessionAction::UserRegistered(user) => registered = Some(user),
                SessionAction::RegistrationFailed(error) => {
                    return Err(LocalEventsError::ActionFailed {
                        operation: Operation::RegisterUser,
                        source: error,
                    });
                },
                SessionAction::RosterUnavailable(error) => {
                    return Err(LocalEventsError::RosterUnavailable(error));
                },
                _ => {},
            }
        }
        registered.ok_or_else(no_reply)
    }

    /// Snapshot of the session
    pub async fn session(&self) -> SessionState {
        self.session.state(Clone::clone).await
    }

    /// The user currently acting
    pub async fn active_user(&self) -> Option<User> {
        self.session.state(|s| s.active_user().cloned()).await
    }

    /// The cached roster
    pub async fn roster(&self) -> Vec<User> {
        self.session.state(|s| s.roster().to_vec()).await
    }

    /// Whether the active user is the admin
    pub async fn is_admin(&self) -> bool {
        self.session.state(SessionState::is_admin).await
    }

    /// Organizer display name, `""` when unknown
    pub async fn organizer_name(&self, organizer_id: UserId) -> String {
        self.session
            .state(|s| s.organizer_name(organizer_id).to_string())
            .await
    }

    // Roster -------------------------------------------------------------

    /// Fetch the event list
    ///
    /// Events that break the structural contract are logged but kept.
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::ListUnavailable`] if the store cannot answer; the
    /// displayed list is cleared.
    #[tracing::instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<Event>, LocalEventsError> {
        match self
            .roster
            .send_and_wait_for(RosterAction::Refresh, RosterAction::is_list_outcome)
            .await?
        {
            RosterAction::EventsLoaded(_) => {
                let events = self.events().await;
                self.warn_malformed(&events).await;
                Ok(events)
            },
            RosterAction::ListUnavailable(error) => Err(LocalEventsError::ListUnavailable(error)),
            _ => Err(no_reply()),
        }
    }

    /// Join `event_id` as the active user
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::NoActiveUser`], or see [`Self::join_as`].
    pub async fn join(&self, event_id: EventId) -> Result<Event, LocalEventsError> {
        let user = self.require_active().await?;
        self.join_as(event_id, user.id).await
    }

    /// Quit `event_id` as the active user
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::NoActiveUser`], or see [`Self::quit_as`].
    pub async fn quit(&self, event_id: EventId) -> Result<Event, LocalEventsError> {
        let user = self.require_active().await?;
        self.quit_as(event_id, user.id).await
    }

    /// Add `user_id` to `event_id`, then refresh the list
    ///
    /// Not gated on the session.
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::ActionFailed`] if the store rejects the request.
    #[tracing::instrument(skip(self))]
    pub async fn join_as(&self, event_id: EventId, user_id: UserId) -> Result<Event, LocalEventsError> {
        match self.mutate(RosterAction::join(event_id, user_id)).await? {
            RosterAction::Joined(event) => Ok(event),
            _ => Err(no_reply()),
        }
    }

    /// Remove `user_id` from `event_id`, then refresh the list
    ///
    /// Not gated on the session.
    ///
    /// # Errors
    ///
    /// [`LocalEventsError::ActionFailed`] if the store rejects the request.
    #[tracing::instrument(skip(self))]
    pub async fn quit_as(&self, event_id: EventId, user_id: UserId) -> Result<Event, LocalEventsError> {
        match self.mutate(RosterAction::quit(event_id, user_id)).await? {
            RosterAction::Left(event) => Ok(event),
            _ => Err(no_reply()),
        }
    }

    /// Delete `event_id`, then refresh the list
    ///
    /// # Errors
    ///
    /// - [`LocalEventsError::NotPermitted`] unless the active user is the admin
    /// - [`LocalEventsError::ActionFailed`] if the store rejects the request;
    ///   the displayed list is left as it was
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, event_id: EventId) -> Result<(), LocalEventsError> {
        self.require_admin(Operation::Cancel).await?;
        match self.mutate(RosterAction::Cancel(event_id)).await? {
            RosterAction::Cancelled(_) => Ok(()),
            _ => Err(no_reply()),
        }
    }

    /// Create an event from a complete payload, then refresh the list
    ///
    /// # Errors
    ///
    /// - [`LocalEventsError::NotPermitted`] unless the active user is the admin
    /// - [`LocalEventsError::ActionFailed`] if the store rejects the request
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: EventCreate) -> Result<Event, LocalEventsError> {
        self.require_admin(Operation::Create).await?;
        self.create_unchecked(draft).await
    }

    /// Validate the form and create its event
    ///
    /// Invalid drafts never reach the store and stay in the form for
    /// correction. A valid draft is taken out of the form before creation.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Invalid`] with the missing fields
    /// - [`SubmitError::Failed`] if not permitted or the store rejects it
    pub async fn submit(&self, form: &mut IntakeForm) -> Result<Event, SubmitError> {
        self.require_admin(Operation::Create).await?;
        let draft = form.stage().map_err(SubmitError::Invalid)?;
        Ok(self.create_unchecked(draft).await?)
    }

    /// A blank intake form organized by the active user
    pub async fn intake_form(&self) -> IntakeForm {
        self.active_user()
            .await
            .map_or_else(IntakeForm::new, |user| IntakeForm::for_organizer(user.id))
    }

    /// Actions the active user has on `event`
    pub async fn allowed_actions(&self, event: &Event) -> AllowedActions {
        self.session
            .state(|s| AllowedActions::for_event(event, s))
            .await
    }

    /// Cards for the currently displayed events
    pub async fn event_cards(&self) -> Vec<EventCard> {
        let events = self.events().await;
        self.session
            .state(|s| events.iter().map(|e| EventCard::new(e, s)).collect())
            .await
    }

    /// [`Self::list_events`] followed by [`Self::event_cards`]
    ///
    /// # Errors
    ///
    /// See [`Self::list_events`].
    pub async fn refresh_cards(&self) -> Result<Vec<EventCard>, LocalEventsError> {
        self.list_events().await?;
        Ok(self.event_cards().await)
    }

    /// Currently displayed events
    pub async fn events(&self) -> Vec<Event> {
        self.roster.state(|s| s.events.clone()).await
    }

    /// Where the event list is in its lifecycle
    pub async fn list_phase(&self) -> ListPhase {
        self.roster.state(|s| s.phase.clone()).await
    }

    /// The most recent failed mutation, if the last one failed
    pub async fn last_failure(&self) -> Option<LocalEventsError> {
        self.roster.state(|s| s.last_failure.clone()).await
    }

    // Internals ----------------------------------------------------------

    async fn require_active(&self) -> Result<User, LocalEventsError> {
        self.active_user().await.ok_or(LocalEventsError::NoActiveUser)
    }

    async fn require_admin(&self, operation: Operation) -> Result<(), LocalEventsError> {
        if self.is_admin().await {
            Ok(())
        } else {
            Err(LocalEventsError::NotPermitted(operation))
        }
    }

    async fn create_unchecked(&self, draft: EventCreate) -> Result<Event, LocalEventsError> {
        match self.mutate(RosterAction::Create(draft)).await? {
            RosterAction::Created(event) => Ok(event),
            _ => Err(no_reply()),
        }
    }

    async fn mutate(&self, action: RosterAction) -> Result<RosterAction, LocalEventsError> {
        match self
            .roster
            .send_and_wait_for(action, RosterAction::is_mutation_outcome)
            .await?
        {
            RosterAction::ActionFailed { operation, error } => Err(LocalEventsError::ActionFailed {
                operation,
                source: error,
            }),
            outcome => Ok(outcome),
        }
    }

    async fn warn_malformed(&self, events: &[Event]) {
        let roster = self.roster().await;
        // Without a roster every organizer would look unknown
        if roster.is_empty() {
            return;
        }
        for event in events {
            if let Err(reason) = event.check_well_formed(&roster) {
                tracing::warn!(event_id = %event.id, %reason, "Store returned a malformed event");
            }
        }
    }
}

fn no_reply() -> LocalEventsError {
    LocalEventsError::Runtime(StoreError::NoTerminalAction)
}
