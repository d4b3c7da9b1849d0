//! # Todosync Runtime
//!
//! Store runtime for reducer-driven client state.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer, executes effects
//! - **Effect Executor**: Spawns effect futures and feeds their actions back
//! - **Observation**: Action broadcast plus a revision counter bumped after
//!   every transition
//!
//! ## Example
//!
//! ```ignore
//! use todosync_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! // Send an action
//! store.send(Action::Load).await?;
//!
//! // Read state
//! let count = store.state(|s| s.items.len()).await;
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use todosync_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, oneshot, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// The store was dropped before the awaited action arrived
        #[error("Store closed before the awaited action arrived")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// ```ignore
/// let store = Store::with_config(state, reducer, env, StoreConfig::default().with_broadcast_capacity(256));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each [`Store::subscribe_actions`] receiver
    ///
    /// Slow receivers skip actions once this many are queued. Callers of
    /// [`Store::send_and_wait_for`] are not affected.
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it returns once every effect
/// spawned by that action has finished, including the reduction of any action
/// those effects fed back. Effects spawned by the feedback actions are not
/// tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Load).await?;
/// handle.wait().await;
/// // The load has been confirmed or rejected and reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect counter shared between a handle and the effects it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Runs even if the effect future panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Caller of `send_and_wait_for` parked until a matching action is reduced
struct Waiter<A> {
    matches: Box<dyn Fn(&A) -> bool + Send + Sync>,
    reply: oneshot::Sender<A>,
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Mutex, Ordering, PoisonError, Reducer, RwLock, StoreConfig,
        StoreError, Waiter,
    };
    use tokio::sync::{broadcast, oneshot, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; every transition runs under the write lock)
    /// 2. Reducer (state transitions)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
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
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here once it has
        /// been reduced. Receivers may lag.
        action_broadcast: broadcast::Sender<A>,
        /// Served before the broadcast and never skipped.
        waiters: Arc<Mutex<Vec<Waiter<A>>>>,
        /// Bumped once per completed reducer call.
        revision: Arc<watch::Sender<u64>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                waiters: Arc::new(Mutex::new(Vec::new())),
                revision: Arc::new(revision),
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions, then waits for running effects to finish. Actions
        /// produced by those effects are still reduced, after passing through
        /// [`Reducer::during_shutdown`].
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Releases the lock and bumps the revision
        /// 4. Spawns the returned effects; their actions are reduced the same way
        ///
        /// `send()` returns after the reducer ran and effects were started, not
        /// after they completed. Use the returned [`EffectHandle`] to wait.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            Ok(self.reduce_action(action).await)
        }

        /// Run the reducer for `action` and start its effects
        ///
        /// Effect feedback enters here directly so that work already running
        /// when shutdown begins still gets its result reduced.
        async fn reduce_action(&self, action: A) -> EffectHandle
        where
            R: Clone,
            E: Clone,
        {
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            self.revision.send_modify(|revision| *revision += 1);

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// The predicate is registered before the action is sent and is checked
        /// against every action fed back by an effect, right after it was
        /// reduced. Matches are handed over directly, so a busy action
        /// broadcast cannot make the caller miss its action. There is no
        /// timeout: effects always run to completion. Wrap the call in
        /// `tokio::time::timeout` to bound the wait on the caller side.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        /// - [`StoreError::ChannelClosed`]: Store dropped before a match arrived
        pub async fn send_and_wait_for<F>(&self, action: A, predicate: F) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            let (reply, matched) = oneshot::channel();
            self.waiters
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Waiter {
                    matches: Box::new(predicate),
                    reply,
                });

            // On error `matched` is dropped and the waiter is pruned later.
            self.send(action).await?;

            matched.await.map_err(|_| StoreError::ChannelClosed)
        }

        /// Hand `action` to every waiter whose predicate accepts it
        fn notify_waiters(&self, action: &A) {
            let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
            if waiters.is_empty() {
                return;
            }

            for waiter in std::mem::take(&mut *waiters) {
                if waiter.reply.is_closed() {
                    continue;
                }
                if (waiter.matches)(action) {
                    let _ = waiter.reply.send(action.clone());
                } else {
                    waiters.push(waiter);
                }
            }
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions arrive after they were reduced. Initial actions passed to
        /// [`Store::send`] are not broadcast. A receiver that falls more than
        /// [`StoreConfig::broadcast_capacity`] actions behind skips the oldest.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to the revision counter
        ///
        /// The value changes after every reducer call; read fresh state with
        /// [`Store::state`] when it does.
        #[must_use]
        pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Current revision (number of reducer calls so far)
        #[must_use]
        pub fn revision(&self) -> u64 {
            *self.revision.borrow()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Spawned; a produced action is sent, then broadcast
        /// - `Parallel`: Each child executed with the same tracking
        /// - `Sequential`: Children executed one after another in a spawned task
        ///
        /// [`DecrementGuard`] keeps counters correct even if an effect panics.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        let Some(action) = fut.await else {
                            tracing::trace!("Effect::Future completed with no action");
                            return;
                        };

                        let action = if store.shutdown.load(Ordering::Acquire) {
                            store.reducer.during_shutdown(action)
                        } else {
                            Some(action)
                        };
                        let Some(action) = action else {
                            tracing::debug!("Feedback action dropped during shutdown");
                            metrics::counter!("store.shutdown.dropped_actions").increment(1);
                            return;
                        };

                        tracing::trace!("Effect::Future produced an action, reducing it");
                        let _ = store.reduce_action(action.clone()).await;
                        store.notify_waiters(&action);
                        // No receivers is fine; observers are optional.
                        let _ = store.action_broadcast.send(action);
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!("Executing sequential effect {} of {}", idx + 1, effect_count);

                            let (mut sub_handle, sub_tracking) = EffectHandle::new();
                            store.execute_effect(effect, sub_tracking);
                            sub_handle.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                waiters: Arc::clone(&self.waiters),
                revision: Arc::clone(&self.revision),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use todosync_core::{smallvec, SmallVec};

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Load,
        Loaded(u32),
        Noop,
    }

    #[derive(Debug, Clone, Default)]
    struct TestState {
        loaded: Vec<u32>,
    }

    #[derive(Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TestState,
            action: TestAction,
            _env: &(),
        ) -> SmallVec<[Effect<TestAction>; 4]> {
            match action {
                TestAction::Load => smallvec![Effect::Future(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(TestAction::Loaded(7))
                }))],
                TestAction::Loaded(value) => {
                    state.loaded.push(value);
                    SmallVec::new()
                },
                TestAction::Noop => smallvec![Effect::None],
            }
        }
    }

    #[tokio::test]
    async fn handle_waits_for_feedback_reduction() {
        let store = Store::new(TestState::default(), TestReducer, ());

        let mut handle = store.send(TestAction::Load).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![7]);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_terminal_action() {
        let store = Store::new(TestState::default(), TestReducer, ());

        let action = store
            .send_and_wait_for(TestAction::Load, |a| matches!(a, TestAction::Loaded(_)))
            .await
            .unwrap();

        assert_eq!(action, TestAction::Loaded(7));
    }

    #[tokio::test]
    async fn revision_bumps_per_transition() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let rx = store.subscribe_revisions();
        assert_eq!(*rx.borrow(), 0);

        let _ = store.send(TestAction::Noop).await.unwrap();
        let _ = store.send(TestAction::Noop).await.unwrap();

        assert_eq!(store.revision(), 2);
        assert_eq!(*rx.borrow(), 2);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = Store::new(TestState::default(), TestReducer, ());
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(TestAction::Noop).await;
        assert_eq!(result.unwrap_err(), StoreError::ShutdownInProgress);
    }

    #[tokio::test]
    async fn shutdown_still_reduces_in_flight_results() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let _ = store.send(TestAction::Load).await.unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![7]);
    }

    #[tokio::test]
    async fn feedback_during_shutdown_goes_through_reducer_filter() {
        #[derive(Clone)]
        struct FollowUpReducer;

        impl Reducer for FollowUpReducer {
            type State = TestState;
            type Action = TestAction;
            type Environment = ();

            fn reduce(
                &self,
                state: &mut TestState,
                action: TestAction,
                _env: &(),
            ) -> SmallVec<[Effect<TestAction>; 4]> {
                match action {
                    // Load finishes with a follow-up request (Noop) instead of a result
                    TestAction::Load => smallvec![Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(TestAction::Noop)
                    }))],
                    TestAction::Noop => smallvec![Effect::send(TestAction::Loaded(1))],
                    TestAction::Loaded(value) => {
                        state.loaded.push(value);
                        SmallVec::new()
                    },
                }
            }

            fn during_shutdown(&self, action: TestAction) -> Option<TestAction> {
                match action {
                    TestAction::Noop => Some(TestAction::Loaded(99)),
                    other => Some(other),
                }
            }
        }

        let store = Store::new(TestState::default(), FollowUpReducer, ());
        let _ = store.send(TestAction::Load).await.unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![99]);
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        #[derive(Clone)]
        struct SeqReducer;

        impl Reducer for SeqReducer {
            type State = TestState;
            type Action = TestAction;
            type Environment = ();

            fn reduce(
                &self,
                state: &mut TestState,
                action: TestAction,
                _env: &(),
            ) -> SmallVec<[Effect<TestAction>; 4]> {
                match action {
                    TestAction::Load => smallvec![Effect::chain(vec![
                        Effect::Future(Box::pin(async {
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            Some(TestAction::Loaded(1))
                        })),
                        Effect::send(TestAction::Loaded(2)),
                    ])],
                    TestAction::Loaded(value) => {
                        state.loaded.push(value);
                        SmallVec::new()
                    },
                    TestAction::Noop => SmallVec::new(),
                }
            }
        }

        let store = Store::new(TestState::default(), SeqReducer, ());
        let mut handle = store.send(TestAction::Load).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![1, 2]);
    }
}
