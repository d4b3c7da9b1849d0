//! Actions of the todolists store.
//!
//! Three groups flow through [`TodolistsReducer`](crate::reducer::TodolistsReducer):
//!
//! - **Intents** ask for a remote operation and carry an [`OperationId`]
//! - **Confirmed results** carry the server-confirmed payload of an intent;
//!   they are the only actions that change entity state
//! - **Local actions** change client-only state without touching the network
//!
//! Every intent ends in exactly one terminal action with the same
//! [`OperationId`]: its confirmed result or [`TodolistsAction::OperationFailed`].

use crate::error::AppError;
use crate::types::{FilterValue, Task, TaskId, Todolist, TodolistId, UpdateDomainTaskModel};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, monotonically increasing identifier of a dispatched intent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    /// Allocate the next identifier
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Kind of remote operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// List todolists
    FetchTodolists,
    /// Create a todolist
    CreateTodolist,
    /// Rename a todolist
    RenameTodolist,
    /// Delete a todolist
    DeleteTodolist,
    /// List the tasks of a todolist
    FetchTasks,
    /// Create a task
    CreateTask,
    /// Update a task
    UpdateTask,
    /// Delete a task
    DeleteTask,
}

impl Operation {
    /// Stable name used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchTodolists => "fetch_todolists",
            Self::CreateTodolist => "create_todolist",
            Self::RenameTodolist => "rename_todolist",
            Self::DeleteTodolist => "delete_todolist",
            Self::FetchTasks => "fetch_tasks",
            Self::CreateTask => "create_task",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
        }
    }

    /// Returns `true` if the target todolist shows `Loading` while in flight
    #[must_use]
    pub const fn marks_entity(self) -> bool {
        matches!(self, Self::RenameTodolist | Self::DeleteTodolist)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every action the todolists store understands
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodolistsAction {
    // Intents
    /// Load every todolist from the server
    FetchTodolists {
        /// Correlation id
        op: OperationId,
    },
    /// Create a todolist
    CreateTodolist {
        /// Correlation id
        op: OperationId,
        /// Title of the new todolist
        title: String,
    },
    /// Rename a todolist
    RenameTodolist {
        /// Correlation id
        op: OperationId,
        /// Target todolist
        id: TodolistId,
        /// New title
        title: String,
    },
    /// Delete a todolist and its tasks
    DeleteTodolist {
        /// Correlation id
        op: OperationId,
        /// Target todolist
        id: TodolistId,
    },
    /// Load the tasks of a todolist
    FetchTasks {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
    },
    /// Create a task
    CreateTask {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Title of the new task
        title: String,
    },
    /// Change some fields of a task
    UpdateTask {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Target task
        task_id: TaskId,
        /// Fields to change
        model: UpdateDomainTaskModel,
    },
    /// Delete a task
    DeleteTask {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Target task
        task_id: TaskId,
    },

    // Local
    /// Select which tasks of a todolist are shown
    ChangeFilter {
        /// Target todolist
        id: TodolistId,
        /// New filter
        filter: FilterValue,
    },
    /// Clear the error slot
    DismissError,
    /// Drop every todolist and task
    ClearData,

    // Confirmed results
    /// Server listing of todolists
    TodolistsFetched {
        /// Correlation id
        op: OperationId,
        /// Todolists in server order
        todolists: Vec<Todolist>,
    },
    /// Server-created todolist
    TodolistCreated {
        /// Correlation id
        op: OperationId,
        /// The created todolist
        todolist: Todolist,
    },
    /// Confirmed rename
    TodolistRenamed {
        /// Correlation id
        op: OperationId,
        /// Renamed todolist
        id: TodolistId,
        /// New title
        title: String,
    },
    /// Confirmed deletion
    TodolistDeleted {
        /// Correlation id
        op: OperationId,
        /// Deleted todolist
        id: TodolistId,
    },
    /// Server listing of a todolist's tasks
    TasksFetched {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Tasks in server order
        tasks: Vec<Task>,
    },
    /// Server-created task
    TaskCreated {
        /// Correlation id
        op: OperationId,
        /// The created task
        task: Task,
    },
    /// Confirmed task update
    TaskUpdated {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Updated task
        task_id: TaskId,
        /// Fields the server accepted
        model: UpdateDomainTaskModel,
    },
    /// Confirmed task deletion
    TaskDeleted {
        /// Correlation id
        op: OperationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Deleted task
        task_id: TaskId,
    },

    /// An intent ended without a confirmed result
    OperationFailed {
        /// Correlation id
        op: OperationId,
        /// Which operation failed
        operation: Operation,
        /// Todolist the operation targeted, if any
        todolist_id: Option<TodolistId>,
        /// Reason
        error: AppError,
    },
}

impl TodolistsAction {
    /// Correlation id of intents and terminal actions
    #[must_use]
    pub const fn operation_id(&self) -> Option<OperationId> {
        match self {
            Self::FetchTodolists { op }
            | Self::CreateTodolist { op, .. }
            | Self::RenameTodolist { op, .. }
            | Self::DeleteTodolist { op, .. }
            | Self::FetchTasks { op, .. }
            | Self::CreateTask { op, .. }
            | Self::UpdateTask { op, .. }
            | Self::DeleteTask { op, .. }
            | Self::TodolistsFetched { op, .. }
            | Self::TodolistCreated { op, .. }
            | Self::TodolistRenamed { op, .. }
            | Self::TodolistDeleted { op, .. }
            | Self::TasksFetched { op, .. }
            | Self::TaskCreated { op, .. }
            | Self::TaskUpdated { op, .. }
            | Self::TaskDeleted { op, .. }
            | Self::OperationFailed { op, .. } => Some(*op),
            Self::ChangeFilter { .. } | Self::DismissError | Self::ClearData => None,
        }
    }

    /// Correlation id, operation and target todolist of an intent
    ///
    /// Returns `None` for every other action.
    #[must_use]
    pub fn intent(&self) -> Option<(OperationId, Operation, Option<TodolistId>)> {
        match self {
            Self::FetchTodolists { op } => Some((*op, Operation::FetchTodolists, None)),
            Self::CreateTodolist { op, .. } => Some((*op, Operation::CreateTodolist, None)),
            Self::RenameTodolist { op, id, .. } => {
                Some((*op, Operation::RenameTodolist, Some(id.clone())))
            },
            Self::DeleteTodolist { op, id } => {
                Some((*op, Operation::DeleteTodolist, Some(id.clone())))
            },
            Self::FetchTasks { op, todolist_id } => {
                Some((*op, Operation::FetchTasks, Some(todolist_id.clone())))
            },
            Self::CreateTask { op, todolist_id, .. } => {
                Some((*op, Operation::CreateTask, Some(todolist_id.clone())))
            },
            Self::UpdateTask { op, todolist_id, .. } => {
                Some((*op, Operation::UpdateTask, Some(todolist_id.clone())))
            },
            Self::DeleteTask { op, todolist_id, .. } => {
                Some((*op, Operation::DeleteTask, Some(todolist_id.clone())))
            },
            _ => None,
        }
    }

    /// Returns `true` for confirmed results and failures
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TodolistsFetched { .. }
                | Self::TodolistCreated { .. }
                | Self::TodolistRenamed { .. }
                | Self::TodolistDeleted { .. }
                | Self::TasksFetched { .. }
                | Self::TaskCreated { .. }
                | Self::TaskUpdated { .. }
                | Self::TaskDeleted { .. }
                | Self::OperationFailed { .. }
        )
    }

    /// Returns `true` if this is the terminal action of `op`
    #[must_use]
    pub fn is_terminal_for(&self, op: OperationId) -> bool {
        self.is_terminal() && self.operation_id() == Some(op)
    }
}
