//! Given/When/Then harness for reducers
//!
//! `run` checks a single reduction. `run_to_completion` also awaits the
//! effects and reduces the actions they feed back, the way the store would,
//! so a test can follow a join all the way through its refresh.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use localevents_core::{effect::Effect, reducer::Reducer};
use std::collections::VecDeque;

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;
type FeedbackCheck<A> = Box<dyn FnOnce(&[A])>;

/// Feedback cap used by [`ReducerTest::run_to_completion`]
const MAX_FEEDBACK: usize = 64;

/// Fluent reducer test
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(RosterReducer::new())
///     .with_env(env)
///     .given_state(RosterState::default())
///     .when_action(RosterAction::Refresh)
///     .then_state(|s| assert_eq!(s.phase, ListPhase::Loading))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R: Reducer> {
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
    feedback_checks: Vec<FeedbackCheck<R::Action>>,
}

impl<R: Reducer> ReducerTest<R> {
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
            feedback_checks: Vec::new(),
        }
    }

    /// Set the environment
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Queue an action (When)
    ///
    /// May be called repeatedly; actions are reduced in order. Effect checks
    /// see the effects of the last action only.
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Check the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects returned for the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Check the actions fed back by effects (only with `run_to_completion`)
    #[must_use]
    pub fn then_feedback<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[R::Action]) + 'static,
    {
        self.feedback_checks.push(Box::new(check));
        self
    }

    /// Reduce the queued actions and run state and effect checks
    ///
    /// # Panics
    ///
    /// If state, environment, or action is missing, if feedback checks were
    /// registered, or if any check fails.
    #[allow(clippy::panic)]
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        assert!(
            self.feedback_checks.is_empty(),
            "then_feedback requires run_to_completion()"
        );
        let env = self.environment.expect("Environment must be set with with_env()");
        let mut state = self.state.expect("Initial state must be set with given_state()");
        let effects = reduce_all(&self.reducer, &mut state, self.actions, &env);

        for check in self.effect_checks {
            check(&effects);
        }
        for check in self.state_checks {
            check(&state);
        }
    }

    /// Reduce the queued actions, then execute effects and reduce feedback
    /// until nothing is left, and run every check against the settled state
    ///
    /// # Panics
    ///
    /// If state, environment, or action is missing, if feedback does not
    /// settle within 64 actions, or if any check fails.
    #[allow(clippy::panic)]
    #[allow(clippy::expect_used)]
    pub async fn run_to_completion(self)
    where
        R::Action: Clone,
    {
        let env = self.environment.expect("Environment must be set with with_env()");
        let mut state = self.state.expect("Initial state must be set with given_state()");
        let effects = reduce_all(&self.reducer, &mut state, self.actions, &env);

        for check in self.effect_checks {
            check(&effects);
        }

        let mut pending: VecDeque<Effect<R::Action>> = effects.into_iter().collect();
        let mut feedback: Vec<R::Action> = Vec::new();

        while let Some(effect) = pending.pop_front() {
            for future in effect.into_futures() {
                if let Some(action) = future.await {
                    assert!(feedback.len() < MAX_FEEDBACK, "feedback did not settle");
                    pending.extend(reduce_one(&self.reducer, &mut state, action.clone(), &env));
                    feedback.push(action);
                }
            }
        }

        for check in self.feedback_checks {
            check(&feedback);
        }
        for check in self.state_checks {
            check(&state);
        }
    }
}

fn reduce_all<R: Reducer>(
    reducer: &R,
    state: &mut R::State,
    actions: Vec<R::Action>,
    env: &R::Environment,
) -> Vec<Effect<R::Action>> {
    assert!(!actions.is_empty(), "Action must be set with when_action()");
    let mut last = Vec::new();
    for action in actions {
        last = reduce_one(reducer, state, action, env);
    }
    last
}

fn reduce_one<R: Reducer>(
    reducer: &R,
    state: &mut R::State,
    action: R::Action,
    env: &R::Environment,
) -> Vec<Effect<R::Action>> {
    reducer.reduce(state, action, env).into_iter().collect()
}

/// Helper assertions for effects
pub mod assertions {
    use localevents_core::effect::Effect;

    /// Assert that nothing needs executing
    ///
    /// # Panics
    ///
    /// If any effect could do work.
    #[allow(clippy::panic)]
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {effects:?}"
        );
    }

    /// Assert the number of futures the runtime would await
    ///
    /// # Panics
    ///
    /// If the count differs.
    #[allow(clippy::panic)]
    pub fn assert_future_count<A>(effects: &[Effect<A>], expected: usize) {
        let found: usize = effects.iter().map(count_futures).sum();
        assert_eq!(found, expected, "Expected {expected} future effects, found {found}");
    }

    /// Assert that at least one future would be awaited
    ///
    /// # Panics
    ///
    /// If there is none.
    #[allow(clippy::panic)]
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| count_futures(e) > 0),
            "Expected at least one Future effect, but none found"
        );
    }

    fn count_futures<A>(effect: &Effect<A>) -> usize {
        match effect {
            Effect::None => 0,
            Effect::Sequential(effects) => effects.iter().map(count_futures).sum(),
            Effect::Future(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localevents_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct Tally {
        requested: u32,
        confirmed: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TallyAction {
        Request,
        Confirmed,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Tally,
            action: TallyAction,
            _env: &(),
        ) -> SmallVec<[Effect<TallyAction>; 4]> {
            match action {
                TallyAction::Request => {
                    state.requested += 1;
                    smallvec![Effect::future(async { Some(TallyAction::Confirmed) })]
                },
                TallyAction::Confirmed => {
                    state.confirmed += 1;
                    SmallVec::new()
                },
            }
        }
    }

    #[test]
    fn run_checks_single_reduction() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally::default())
            .when_action(TallyAction::Request)
            .then_state(|s| {
                assert_eq!(s.requested, 1);
                assert_eq!(s.confirmed, 0);
            })
            .then_effects(|effects| assertions::assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn multiple_actions_reduce_in_order() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally::default())
            .when_action(TallyAction::Request)
            .when_action(TallyAction::Confirmed)
            .then_state(|s| assert_eq!((s.requested, s.confirmed), (1, 1)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn run_to_completion_follows_feedback() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally::default())
            .when_action(TallyAction::Request)
            .then_feedback(|actions| assert_eq!(actions, [TallyAction::Confirmed]))
            .then_state(|s| assert_eq!((s.requested, s.confirmed), (1, 1)))
            .run_to_completion()
            .await;
    }
}
