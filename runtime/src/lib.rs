//! # LocalEvents Runtime
//!
//! The [`Store`] owns a reducer's state and environment, executes the effects
//! the reducer returns, and feeds every resulting action back in until the
//! exchange settles.
//!
//! ## Dispatch model
//!
//! A client triggers one request/response exchange at a time. The store makes
//! that explicit: [`Store::send`] holds a per-store dispatch lock for the whole
//! reduce → effect → feedback cycle, so sends never interleave and a send
//! returns only after every action it caused has been reduced. There is no
//! retry and no timeout at this layer; a stalled effect stalls its send.
//!
//! ## Example
//!
//! ```ignore
//! use localevents_runtime::Store;
//!
//! let store = Store::new(RosterState::default(), RosterReducer::new(), env);
//!
//! let outcome = store
//!     .send_and_wait_for(RosterAction::Refresh, RosterAction::is_list_outcome)
//!     .await?;
//!
//! let phase = store.state(|s| s.phase.clone()).await;
//! ```

use localevents_core::reducer::Reducer;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// A single send produced more feedback actions than allowed.
        ///
        /// This almost always means two reducer arms trigger each other.
        #[error("send exceeded the feedback limit of {0} actions")]
        FeedbackLimitExceeded(usize),

        /// No action produced by the send matched the terminal predicate.
        #[error("send settled without producing a terminal action")]
        NoTerminalAction,
    }
}

/// Default cap on actions reduced by one [`Store::send`]
pub const DEFAULT_FEEDBACK_LIMIT: usize = 32;

/// Store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of actions (initial plus feedback) reduced per send
    pub feedback_limit: usize,
}

impl StoreConfig {
    /// Set the feedback limit
    #[must_use]
    pub const fn with_feedback_limit(mut self, limit: usize) -> Self {
        self.feedback_limit = limit;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            feedback_limit: DEFAULT_FEEDBACK_LIMIT,
        }
    }
}

/// The Store - runtime for one reducer
///
/// Cheap to clone; clones share state, environment, and the dispatch lock.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    dispatch: Arc<Mutex<()>>,
    config: StoreConfig,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            dispatch: Arc::clone(&self.dispatch),
            config: self.config,
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Clone + Send + std::fmt::Debug + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with the default configuration
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a new store with a custom configuration
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            dispatch: Arc::new(Mutex::new(())),
            config,
        }
    }

    /// Send an action and run it to completion
    ///
    /// Reduces `action`, awaits its effects in order, and reduces each action
    /// they produce (breadth first) until nothing is left. Returns the
    /// feedback actions in the order they were produced; the initial action
    /// is not included.
    ///
    /// # Errors
    ///
    /// [`StoreError::FeedbackLimitExceeded`] if more than
    /// [`StoreConfig::feedback_limit`] actions would be reduced. Actions
    /// already reduced keep their state changes.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<Vec<A>, StoreError> {
        let _turn = self.dispatch.lock().await;

        let mut queue = VecDeque::from([action]);
        let mut feedback = Vec::new();
        let mut reduced = 0usize;

        while let Some(action) = queue.pop_front() {
            if reduced == self.config.feedback_limit {
                tracing::warn!(
                    limit = self.config.feedback_limit,
                    pending = queue.len() + 1,
                    "Feedback limit reached, dropping remaining actions"
                );
                return Err(StoreError::FeedbackLimitExceeded(self.config.feedback_limit));
            }
            reduced += 1;

            tracing::trace!(?action, "Reducing action");
            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut state, action, &self.environment)
            };
            metrics::counter!("store.actions.reduced").increment(1);

            for effect in effects {
                for future in effect.into_futures() {
                    metrics::counter!("store.effects.executed").increment(1);
                    if let Some(next) = future.await {
                        tracing::trace!(?next, "Effect produced an action");
                        feedback.push(next.clone());
                        queue.push_back(next);
                    }
                }
            }
        }

        Ok(feedback)
    }

    /// Send an action and return the first feedback action matching `predicate`
    ///
    /// The request/response helper: send an intent, get back the reply the
    /// effect produced. The whole exchange (including any follow-up refresh)
    /// has settled by the time this returns.
    ///
    /// # Errors
    ///
    /// - [`StoreError::FeedbackLimitExceeded`]: see [`Store::send`]
    /// - [`StoreError::NoTerminalAction`]: nothing produced matched
    pub async fn send_and_wait_for<F>(&self, action: A, predicate: F) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        self.send(action)
            .await?
            .into_iter()
            .find(|a| predicate(a))
            .ok_or(StoreError::NoTerminalAction)
    }

    /// Read from the current state
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }
}
