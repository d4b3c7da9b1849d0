//! Todolist store.
//!
//! Holds the confirmed todolists in display order. Every structural mutation
//! returns the [`TodolistLifecycle`] event the task store must see.

use crate::action::OperationId;
use crate::coordinator::TodolistLifecycle;
use crate::types::{FilterValue, RequestStatus, Todolist, TodolistDomain, TodolistId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered collection of todolists with their client-only metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodolistsState {
    items: Vec<TodolistDomain>,
    /// Rename and delete operations in flight, by target todolist
    #[serde(skip)]
    busy: HashMap<OperationId, TodolistId>,
}

impl TodolistsState {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Todolists in display order
    #[must_use]
    pub fn items(&self) -> &[TodolistDomain] {
        &self.items
    }

    /// Find a todolist by id
    #[must_use]
    pub fn get(&self, id: &TodolistId) -> Option<&TodolistDomain> {
        self.items.iter().find(|tl| &tl.id == id)
    }

    /// Returns `true` if the todolist is held
    #[must_use]
    pub fn contains(&self, id: &TodolistId) -> bool {
        self.get(id).is_some()
    }

    /// Ids in display order
    #[must_use]
    pub fn ids(&self) -> Vec<TodolistId> {
        self.items.iter().map(|tl| tl.id.clone()).collect()
    }

    /// Number of todolists
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no todolist is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace everything with a server listing
    ///
    /// Filters are reset. Entity statuses are reset too, except for todolists
    /// that still have a rename or delete in flight.
    pub fn replace_all(&mut self, todolists: Vec<Todolist>) -> TodolistLifecycle {
        let previous = self.ids();
        self.items = todolists.into_iter().map(TodolistDomain::from).collect();

        let current = self.ids();
        self.busy.retain(|_, id| current.contains(id));
        for todolist in &mut self.items {
            if self.busy.values().any(|id| id == &todolist.id) {
                todolist.entity_status = RequestStatus::Loading;
            }
        }

        let dropped = previous
            .into_iter()
            .filter(|id| !current.contains(id))
            .collect();

        TodolistLifecycle::Replaced { current, dropped }
    }

    /// Insert a confirmed todolist at the front
    ///
    /// A todolist with the same id is replaced.
    pub fn insert_one(&mut self, todolist: Todolist) -> TodolistLifecycle {
        self.items.retain(|tl| tl.id != todolist.id);
        let id = todolist.id.clone();
        self.items.insert(0, TodolistDomain::from(todolist));
        TodolistLifecycle::Created(id)
    }

    /// Remove a todolist
    ///
    /// Returns `None` if it was not held.
    pub fn remove_by_id(&mut self, id: &TodolistId) -> Option<TodolistLifecycle> {
        let index = self.items.iter().position(|tl| &tl.id == id)?;
        self.items.remove(index);
        self.busy.retain(|_, busy| busy != id);
        Some(TodolistLifecycle::Removed(id.clone()))
    }

    /// Remove every todolist
    pub fn clear(&mut self) -> TodolistLifecycle {
        let ids = self.ids();
        self.items.clear();
        self.busy.clear();
        TodolistLifecycle::Cleared(ids)
    }

    /// Set the title; returns `false` if the todolist is not held
    pub fn rename_by_id(&mut self, id: &TodolistId, title: &str) -> bool {
        self.update(id, |tl| tl.title = title.to_string())
    }

    /// Set the task filter; returns `false` if the todolist is not held
    pub fn set_filter_by_id(&mut self, id: &TodolistId, filter: FilterValue) -> bool {
        self.update(id, |tl| tl.filter = filter)
    }

    /// Set the entity status; returns `false` if the todolist is not held
    pub fn set_entity_status_by_id(&mut self, id: &TodolistId, status: RequestStatus) -> bool {
        self.update(id, |tl| tl.entity_status = status)
    }

    /// Mark the todolist `Loading` while `op` is in flight
    ///
    /// Does nothing if the todolist is not held.
    pub fn begin_entity_operation(&mut self, op: OperationId, id: &TodolistId) {
        if self.set_entity_status_by_id(id, RequestStatus::Loading) {
            self.busy.insert(op, id.clone());
        }
    }

    /// `op` ended; its todolist goes back to `Idle` unless another rename or
    /// delete on it is still in flight
    ///
    /// Operations that never marked a todolist are ignored.
    pub fn finish_entity_operation(&mut self, op: OperationId) {
        let Some(id) = self.busy.remove(&op) else {
            return;
        };
        if !self.busy.values().any(|other| other == &id) {
            self.set_entity_status_by_id(&id, RequestStatus::Idle);
        }
    }

    fn update(&mut self, id: &TodolistId, f: impl FnOnce(&mut TodolistDomain)) -> bool {
        match self.items.iter_mut().find(|tl| &tl.id == id) {
            Some(todolist) => {
                f(todolist);
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    fn todolist(id: &str, title: &str) -> Todolist {
        Todolist {
            id: TodolistId::new(id),
            title: title.to_string(),
            added_date: String::new(),
            order: 0,
        }
    }

    #[test]
    fn insert_one_prepends() {
        let mut state = TodolistsState::new();
        state.insert_one(todolist("a", "Work"));
        let event = state.insert_one(todolist("b", "Groceries"));

        assert_eq!(event, TodolistLifecycle::Created(TodolistId::new("b")));
        assert_eq!(state.ids(), vec![TodolistId::new("b"), TodolistId::new("a")]);
    }

    #[test]
    fn insert_one_replaces_duplicate_id() {
        let mut state = TodolistsState::new();
        state.insert_one(todolist("a", "Work"));
        state.insert_one(todolist("a", "Work v2"));

        assert_eq!(state.len(), 1);
        assert_eq!(state.get(&TodolistId::new("a")).unwrap().title, "Work v2");
    }

    #[test]
    fn replace_all_reports_dropped_ids_and_resets_metadata() {
        let mut state = TodolistsState::new();
        state.replace_all(vec![todolist("a", "Work"), todolist("b", "Home")]);
        state.set_filter_by_id(&TodolistId::new("a"), FilterValue::Completed);

        let event = state.replace_all(vec![todolist("a", "Work"), todolist("c", "Trip")]);

        assert_eq!(
            event,
            TodolistLifecycle::Replaced {
                current: vec![TodolistId::new("a"), TodolistId::new("c")],
                dropped: vec![TodolistId::new("b")],
            }
        );
        assert_eq!(state.get(&TodolistId::new("a")).unwrap().filter, FilterValue::All);
    }

    #[test]
    fn remove_missing_returns_none() {
        let mut state = TodolistsState::new();
        assert_eq!(state.remove_by_id(&TodolistId::new("nope")), None);
    }

    #[test]
    fn entity_stays_loading_until_last_operation_finishes() {
        let mut state = TodolistsState::new();
        state.insert_one(todolist("a", "Work"));
        let id = TodolistId::new("a");
        let (rename, delete) = (OperationId::next(), OperationId::next());

        state.begin_entity_operation(rename, &id);
        state.begin_entity_operation(delete, &id);
        state.finish_entity_operation(rename);
        assert_eq!(state.get(&id).unwrap().entity_status, RequestStatus::Loading);

        // Unknown operations do not release the todolist
        state.finish_entity_operation(OperationId::next());
        assert_eq!(state.get(&id).unwrap().entity_status, RequestStatus::Loading);

        state.finish_entity_operation(delete);
        assert_eq!(state.get(&id).unwrap().entity_status, RequestStatus::Idle);
    }

    #[test]
    fn replace_all_keeps_busy_todolists_loading() {
        let mut state = TodolistsState::new();
        state.replace_all(vec![todolist("a", "Work"), todolist("b", "Home")]);
        let op = OperationId::next();
        state.begin_entity_operation(op, &TodolistId::new("a"));
        state.begin_entity_operation(OperationId::next(), &TodolistId::new("b"));

        state.replace_all(vec![todolist("a", "Work"), todolist("c", "Trip")]);
        assert_eq!(
            state.get(&TodolistId::new("a")).unwrap().entity_status,
            RequestStatus::Loading
        );
        assert_eq!(
            state.get(&TodolistId::new("c")).unwrap().entity_status,
            RequestStatus::Idle
        );

        state.finish_entity_operation(op);
        assert_eq!(
            state.get(&TodolistId::new("a")).unwrap().entity_status,
            RequestStatus::Idle
        );
    }

    #[test]
    fn rename_and_status_report_presence() {
        let mut state = TodolistsState::new();
        state.insert_one(todolist("a", "Work"));

        assert!(state.rename_by_id(&TodolistId::new("a"), "Office"));
        assert!(state.set_entity_status_by_id(&TodolistId::new("a"), RequestStatus::Loading));
        assert!(!state.rename_by_id(&TodolistId::new("b"), "Office"));

        let todolist = state.get(&TodolistId::new("a")).unwrap();
        assert_eq!(todolist.title, "Office");
        assert_eq!(todolist.entity_status, RequestStatus::Loading);
    }
}
