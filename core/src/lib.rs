//! # LocalEvents Core
//!
//! Shared vocabulary for the LocalEvents client: the domain model, the reducer
//! primitives the session and roster logic are written in, and the contracts
//! for the two external collaborators (the remote event store and the
//! client-local session storage).
//!
//! ## Core Concepts
//!
//! - **State**: What the client currently knows (active user, fetched events)
//! - **Action**: Every input a reducer handles, user intents and store replies alike
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of a store call or storage write, executed by the runtime
//! - **Environment**: Injected [`EventStore`] and [`SessionStorage`] handles
//!
//! ## Example
//!
//! ```ignore
//! use localevents_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! impl Reducer for RosterReducer {
//!     type State = RosterState;
//!     type Action = RosterAction;
//!     type Environment = RosterEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut RosterState,
//!         action: RosterAction,
//!         env: &RosterEnvironment,
//!     ) -> SmallVec<[Effect<RosterAction>; 4]> {
//!         // Transition the list phase, describe the store call
//!         SmallVec::new()
//!     }
//! }
//! ```

pub mod event_store;
pub mod model;
pub mod session_storage;

pub use event_store::{EventStore, EventStoreError, StoreFuture};
pub use model::{
    Event, EventCreate, EventField, EventId, MalformedEvent, MembershipChange, NewUser, User,
    UserId,
};
pub use session_storage::{SessionKey, SessionStorage, StorageError};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the trait all client-side business logic implements
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// A reducer validates an action, updates state in place, and returns
    /// descriptions of the side effects that should follow. It never performs
    /// I/O itself, which keeps every transition testable without a store.
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer owns
    /// - `Action`: The inputs it accepts
    /// - `Environment`: The injected collaborators effects may capture
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. A reducer returns them; the runtime executes them and
/// feeds any resulting action back into the same reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future carried by [`Effect::Future`]
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// If the future resolves to `Some(action)`, that action is fed back
        /// into the reducer.
        Future(EffectFuture<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an effect
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Whether executing this effect can never produce work
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Sequential(effects) => effects.iter().all(Effect::is_none),
                Effect::Future(_) => false,
            }
        }

        /// Flatten into the ordered list of futures the runtime must await
        #[must_use]
        pub fn into_futures(self) -> Vec<EffectFuture<Action>> {
            let mut out = Vec::new();
            self.collect_into(&mut out);
            out
        }

        fn collect_into(self, out: &mut Vec<EffectFuture<Action>>) {
            match self {
                Effect::None => {},
                Effect::Sequential(effects) => {
                    for effect in effects {
                        effect.collect_into(out);
                    }
                },
                Effect::Future(fut) => out.push(fut),
            }
        }
    }
}
