//! Task store.
//!
//! One task collection per todolist, keyed by todolist id. Collections are
//! created and destroyed only through [`TodolistObserver`]; task mutations
//! never create a collection.

use crate::coordinator::TodolistObserver;
use crate::error::CoordinationViolation;
use crate::types::{Task, TaskId, TodolistId, UpdateDomainTaskModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Task collections keyed by owning todolist
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksState {
    collections: HashMap<TodolistId, Vec<Task>>,
}

impl TasksState {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks of a todolist in display order
    #[must_use]
    pub fn get(&self, todolist_id: &TodolistId) -> Option<&[Task]> {
        self.collections.get(todolist_id).map(Vec::as_slice)
    }

    /// Find a task by linear scan; first match wins
    #[must_use]
    pub fn find_task(&self, todolist_id: &TodolistId, task_id: &TaskId) -> Option<&Task> {
        self.collections
            .get(todolist_id)?
            .iter()
            .find(|task| &task.id == task_id)
    }

    /// Returns `true` if the todolist has a collection
    #[must_use]
    pub fn has_collection(&self, todolist_id: &TodolistId) -> bool {
        self.collections.contains_key(todolist_id)
    }

    /// Keys of every collection
    pub fn keys(&self) -> impl Iterator<Item = &TodolistId> {
        self.collections.keys()
    }

    /// Every collection
    #[must_use]
    pub const fn collections(&self) -> &HashMap<TodolistId, Vec<Task>> {
        &self.collections
    }

    /// Replace a collection with a server listing
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationViolation::MissingTaskCollection`] and leaves the
    /// store untouched if the todolist has no collection.
    pub fn set_tasks(
        &mut self,
        todolist_id: &TodolistId,
        tasks: Vec<Task>,
    ) -> Result<(), CoordinationViolation> {
        let collection = self.collection_mut(todolist_id, None)?;
        *collection = tasks;
        Ok(())
    }

    /// Prepend a confirmed task to its owning collection
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationViolation::MissingTaskCollection`] and leaves the
    /// store untouched if the owning todolist has no collection.
    pub fn add_task(&mut self, task: Task) -> Result<(), CoordinationViolation> {
        let todolist_id = task.todo_list_id.clone();
        let collection = self.collection_mut(&todolist_id, Some(&task.id))?;
        collection.insert(0, task);
        Ok(())
    }

    /// Merge a confirmed partial update into the cached task
    ///
    /// Returns `Ok(false)` if the task is no longer cached.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationViolation::MissingTaskCollection`] if the todolist
    /// has no collection.
    pub fn update_task(
        &mut self,
        todolist_id: &TodolistId,
        task_id: &TaskId,
        model: &UpdateDomainTaskModel,
    ) -> Result<bool, CoordinationViolation> {
        let collection = self.collection_mut(todolist_id, Some(task_id))?;
        match collection.iter_mut().find(|task| &task.id == task_id) {
            Some(task) => {
                model.apply_to(task);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Remove a task by scan-and-splice
    ///
    /// Idempotent: returns `false` when the task or its collection is absent.
    pub fn remove_task(&mut self, todolist_id: &TodolistId, task_id: &TaskId) -> bool {
        let Some(collection) = self.collections.get_mut(todolist_id) else {
            return false;
        };
        match collection.iter().position(|task| &task.id == task_id) {
            Some(index) => {
                collection.remove(index);
                true
            },
            None => false,
        }
    }

    fn collection_mut(
        &mut self,
        todolist_id: &TodolistId,
        task_id: Option<&TaskId>,
    ) -> Result<&mut Vec<Task>, CoordinationViolation> {
        self.collections
            .get_mut(todolist_id)
            .ok_or_else(|| CoordinationViolation::MissingTaskCollection {
                todolist_id: todolist_id.clone(),
                task_id: task_id.cloned(),
            })
    }
}

impl TodolistObserver for TasksState {
    fn on_todolists_replaced(&mut self, ids: &[TodolistId]) {
        for id in ids {
            self.collections.entry(id.clone()).or_default();
        }
    }

    fn on_todolist_created(&mut self, id: &TodolistId) {
        self.collections.insert(id.clone(), Vec::new());
    }

    fn on_todolist_removed(&mut self, id: &TodolistId) {
        self.collections.remove(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use crate::types::{TaskPriority, TaskStatus};

    fn task(id: &str, todolist: &str) -> Task {
        Task {
            id: TaskId::new(id),
            todo_list_id: TodolistId::new(todolist),
            title: format!("task {id}"),
            description: None,
            status: TaskStatus::New,
            priority: TaskPriority::Low,
            start_date: None,
            deadline: None,
            order: 0,
            added_date: String::new(),
        }
    }

    fn with_collection(id: &str) -> TasksState {
        let mut state = TasksState::new();
        state.on_todolist_created(&TodolistId::new(id));
        state
    }

    #[test]
    fn add_task_prepends_and_shifts_others() {
        let mut state = with_collection("tl");
        state.add_task(task("1", "tl")).unwrap();
        state.add_task(task("2", "tl")).unwrap();
        state.add_task(task("3", "tl")).unwrap();

        let ids: Vec<&str> = state
            .get(&TodolistId::new("tl"))
            .unwrap()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn add_task_without_collection_is_a_violation() {
        let mut state = TasksState::new();
        let result = state.add_task(task("1", "ghost"));

        assert_eq!(
            result,
            Err(CoordinationViolation::MissingTaskCollection {
                todolist_id: TodolistId::new("ghost"),
                task_id: Some(TaskId::new("1")),
            })
        );
        assert!(!state.has_collection(&TodolistId::new("ghost")));
    }

    #[test]
    fn remove_task_is_idempotent() {
        let mut state = with_collection("tl");
        state.add_task(task("1", "tl")).unwrap();
        state.add_task(task("2", "tl")).unwrap();

        assert!(state.remove_task(&TodolistId::new("tl"), &TaskId::new("1")));
        let once = state.clone();
        assert!(!state.remove_task(&TodolistId::new("tl"), &TaskId::new("1")));
        assert_eq!(state, once);
        assert!(!state.remove_task(&TodolistId::new("gone"), &TaskId::new("1")));
    }

    #[test]
    fn update_task_merges_only_given_fields() {
        let mut state = with_collection("tl");
        state.add_task(task("1", "tl")).unwrap();
        let before = state.find_task(&TodolistId::new("tl"), &TaskId::new("1")).unwrap().clone();

        let updated = state
            .update_task(
                &TodolistId::new("tl"),
                &TaskId::new("1"),
                &UpdateDomainTaskModel::status(TaskStatus::Completed),
            )
            .unwrap();

        assert!(updated);
        let after = state.find_task(&TodolistId::new("tl"), &TaskId::new("1")).unwrap();
        assert_eq!(after.status, TaskStatus::Completed);
        assert_eq!(after.title, before.title);
        assert_eq!(after.priority, before.priority);
    }

    #[test]
    fn update_absent_task_is_not_an_error() {
        let mut state = with_collection("tl");
        let updated = state
            .update_task(
                &TodolistId::new("tl"),
                &TaskId::new("missing"),
                &UpdateDomainTaskModel::title("x"),
            )
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn replaced_keeps_existing_collections() {
        let mut state = with_collection("a");
        state.add_task(task("1", "a")).unwrap();

        state.on_todolists_replaced(&[TodolistId::new("a"), TodolistId::new("b")]);

        assert_eq!(state.get(&TodolistId::new("a")).unwrap().len(), 1);
        assert_eq!(state.get(&TodolistId::new("b")).unwrap().len(), 0);
    }

    #[test]
    fn set_tasks_replaces_in_server_order() {
        let mut state = with_collection("tl");
        state.add_task(task("old", "tl")).unwrap();

        state
            .set_tasks(&TodolistId::new("tl"), vec![task("1", "tl"), task("2", "tl")])
            .unwrap();

        let ids: Vec<&str> = state
            .get(&TodolistId::new("tl"))
            .unwrap()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
