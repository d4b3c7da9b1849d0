//! # Todosync Testing
//!
//! Testing utilities for reducers built on `todosync-core`.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer call
//! - [`assertions`]: Helpers for inspecting returned effects
//! - [`init_test_tracing`]: Opt-in log output for tests
//!
//! ## Example
//!
//! ```ignore
//! use todosync_testing::{assertions, ReducerTest};
//!
//! ReducerTest::new(TodolistsReducer::new())
//!     .with_env(test_environment())
//!     .given_state(AppState::default())
//!     .when_action(TodolistsAction::ChangeFilter { id, filter: FilterValue::Active })
//!     .then_state(|state| assert_eq!(state.todolists.len(), 0))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```


pub use reducer_test::{assertions, ReducerTest};

/// Install a `tracing` subscriber for tests
///
/// Honors `RUST_LOG`; safe to call from several tests because only the first
/// call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
