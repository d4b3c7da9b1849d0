//! Configuration for the todolists store.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Message used when the server rejects an operation without saying why
pub const DEFAULT_GENERIC_ERROR: &str = "Some error occurred";

/// Message used when the transport fails without a message of its own
pub const DEFAULT_NETWORK_ERROR: &str = "Network error";

/// Behavior and user-facing messages of the todolists store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodolistsConfig {
    /// Shown when a rejection carries no messages
    pub generic_error_message: String,
    /// Shown when a transport failure carries no message
    pub network_error_message: String,
    /// Fetch the tasks of every todolist after the todolists were fetched
    pub fetch_tasks_on_load: bool,
}

impl TodolistsConfig {
    /// Create a configuration with default messages
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generic rejection message
    #[must_use]
    pub fn with_generic_error_message(mut self, message: impl Into<String>) -> Self {
        self.generic_error_message = message.into();
        self
    }

    /// Set the fallback network error message
    #[must_use]
    pub fn with_network_error_message(mut self, message: impl Into<String>) -> Self {
        self.network_error_message = message.into();
        self
    }

    /// Enable or disable fetching tasks after todolists
    #[must_use]
    pub const fn with_fetch_tasks_on_load(mut self, enabled: bool) -> Self {
        self.fetch_tasks_on_load = enabled;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `TODOLISTS_GENERIC_ERROR` (default: `"Some error occurred"`)
    /// - `TODOLISTS_NETWORK_ERROR` (default: `"Network error"`)
    /// - `TODOLISTS_FETCH_TASKS_ON_LOAD` (default: `true`)
    ///
    /// Unparseable values fall back to their default.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            generic_error_message: env::var("TODOLISTS_GENERIC_ERROR")
                .unwrap_or_else(|_| DEFAULT_GENERIC_ERROR.to_string()),
            network_error_message: env::var("TODOLISTS_NETWORK_ERROR")
                .unwrap_or_else(|_| DEFAULT_NETWORK_ERROR.to_string()),
            fetch_tasks_on_load: env::var("TODOLISTS_FETCH_TASKS_ON_LOAD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl Default for TodolistsConfig {
    fn default() -> Self {
        Self {
            generic_error_message: DEFAULT_GENERIC_ERROR.to_string(),
            network_error_message: DEFAULT_NETWORK_ERROR.to_string(),
            fetch_tasks_on_load: true,
        }
    }
}
