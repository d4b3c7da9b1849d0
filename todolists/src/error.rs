//! Error types for todolist operations.

use crate::types::{TaskId, TodolistId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todosync_runtime::StoreError;

/// Why an operation did not produce a confirmed result
///
/// Both kinds land in the same error slot of [`AppStatusState`](crate::app::AppStatusState)
/// and neither mutates the entity stores.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    /// The server (or local shape validation) rejected the operation
    #[error("{0}")]
    Application(String),

    /// The request never produced a usable response
    #[error("{0}")]
    Network(String),
}

impl AppError {
    /// The user-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Application(message) | Self::Network(message) => message,
        }
    }

    /// Returns `true` for transport failures
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Metrics label for the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Application(_) => "application",
            Self::Network(_) => "network",
        }
    }
}

/// Errors returned by [`TodolistsClient`](crate::client::TodolistsClient) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The operation completed with a failure
    #[error(transparent)]
    App(#[from] AppError),

    /// The store refused or lost the operation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The terminal action did not carry the expected payload
    #[error("unexpected outcome for operation {0}")]
    UnexpectedOutcome(String),
}

/// A confirmed result that could not be applied without breaking the
/// todolist/task key-set invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinationViolation {
    /// A task mutation targeted a todolist that has no task collection
    #[error("no task collection for todolist {todolist_id} (task {task_id:?})")]
    MissingTaskCollection {
        /// Todolist the mutation targeted
        todolist_id: TodolistId,
        /// Task involved, if the mutation concerned a single task
        task_id: Option<TaskId>,
    },

    /// A task collection exists for a todolist the todolist store does not hold
    #[error("task collection for unknown todolist {todolist_id}")]
    OrphanedTaskCollection {
        /// Key of the orphaned collection
        todolist_id: TodolistId,
    },

    /// A todolist has no task collection
    #[error("todolist {todolist_id} has no task collection")]
    MissingCollectionForTodolist {
        /// Todolist lacking a collection
        todolist_id: TodolistId,
    },
}
