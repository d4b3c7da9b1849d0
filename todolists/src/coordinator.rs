//! Consistency between the todolist store and the task store.
//!
//! Every todolist owns exactly one task collection. The todolist store reports
//! structural changes as [`TodolistLifecycle`] events and [`propagate`] hands
//! them to a [`TodolistObserver`] in the same reducer call, so the key-set
//! invariant holds at every observable point.

use crate::error::CoordinationViolation;
use crate::types::TodolistId;

/// Structural change of the todolist store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodolistLifecycle {
    /// The whole collection was replaced from a server fetch
    Replaced {
        /// Ids now held, in server order
        current: Vec<TodolistId>,
        /// Previously held ids that are no longer present
        dropped: Vec<TodolistId>,
    },
    /// A confirmed todolist was inserted
    Created(TodolistId),
    /// A todolist was removed after confirmation
    Removed(TodolistId),
    /// Every todolist was removed locally
    Cleared(Vec<TodolistId>),
}

/// Reacts to structural changes of the todolist store
pub trait TodolistObserver {
    /// Ensure a collection exists for each id; existing collections are kept
    fn on_todolists_replaced(&mut self, ids: &[TodolistId]);

    /// Create an empty collection for a new todolist
    fn on_todolist_created(&mut self, id: &TodolistId);

    /// Drop the collection of a removed todolist
    fn on_todolist_removed(&mut self, id: &TodolistId);
}

/// Deliver a lifecycle event to an observer
pub fn propagate<O: TodolistObserver + ?Sized>(observer: &mut O, event: &TodolistLifecycle) {
    match event {
        TodolistLifecycle::Replaced { current, dropped } => {
            for id in dropped {
                observer.on_todolist_removed(id);
            }
            observer.on_todolists_replaced(current);
        },
        TodolistLifecycle::Created(id) => observer.on_todolist_created(id),
        TodolistLifecycle::Removed(id) => observer.on_todolist_removed(id),
        TodolistLifecycle::Cleared(ids) => {
            for id in ids {
                observer.on_todolist_removed(id);
            }
        },
    }
}

/// Compare the two key sets
///
/// Returns every discrepancy; an empty vector means the stores agree.
#[must_use]
pub fn check_consistency<'a, T, K>(todolist_ids: T, collection_keys: K) -> Vec<CoordinationViolation>
where
    T: IntoIterator<Item = &'a TodolistId>,
    K: IntoIterator<Item = &'a TodolistId>,
{
    let todolists: std::collections::BTreeSet<&TodolistId> = todolist_ids.into_iter().collect();
    let collections: std::collections::BTreeSet<&TodolistId> = collection_keys.into_iter().collect();

    let missing = todolists.difference(&collections).map(|id| {
        CoordinationViolation::MissingCollectionForTodolist {
            todolist_id: (*id).clone(),
        }
    });
    let orphaned = collections.difference(&todolists).map(|id| {
        CoordinationViolation::OrphanedTaskCollection {
            todolist_id: (*id).clone(),
        }
    });

    missing.chain(orphaned).collect()
}
