//! Root state of the todolists store.

use crate::app::AppStatusState;
use crate::coordinator;
use crate::error::CoordinationViolation;
use crate::tasks::TasksState;
use crate::todolists::TodolistsState;
use serde::{Deserialize, Serialize};

/// Everything the rendering layer can observe
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Status of the latest operation
    pub app: AppStatusState,
    /// Confirmed todolists
    pub todolists: TodolistsState,
    /// Confirmed tasks per todolist
    pub tasks: TasksState,
}

impl AppState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mismatch between todolist ids and task collection keys
    #[must_use]
    pub fn check_consistency(&self) -> Vec<CoordinationViolation> {
        coordinator::check_consistency(
            self.todolists.items().iter().map(|tl| &tl.id),
            self.tasks.keys(),
        )
    }

    /// Returns `true` if every todolist has exactly one task collection
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.check_consistency().is_empty()
    }
}
