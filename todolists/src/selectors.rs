//! Derived views over [`AppState`].

use crate::state::AppState;
use crate::types::{FilterValue, Task, TaskStatus, TodolistDomain, TodolistId};

/// Returns `true` if the filter shows the task
#[must_use]
pub fn matches_filter(filter: FilterValue, task: &Task) -> bool {
    match filter {
        FilterValue::All => true,
        FilterValue::Active => task.status == TaskStatus::New,
        FilterValue::Completed => task.status == TaskStatus::Completed,
    }
}

/// Tasks of a todolist that pass its filter, in display order
#[must_use]
pub fn filtered_tasks<'a>(todolist: &TodolistDomain, tasks: &'a [Task]) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| matches_filter(todolist.filter, task))
        .collect()
}

/// Filtered tasks of a todolist looked up by id
///
/// Empty if the todolist is unknown.
#[must_use]
pub fn visible_tasks(state: &AppState, id: &TodolistId) -> Vec<Task> {
    let (Some(todolist), Some(tasks)) = (state.todolists.get(id), state.tasks.get(id)) else {
        return Vec::new();
    };
    filtered_tasks(todolist, tasks).into_iter().cloned().collect()
}
