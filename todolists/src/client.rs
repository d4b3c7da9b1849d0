//! Caller-facing facade over the todolists [`Store`].
//!
//! Every remote operation allocates an [`OperationId`], sends its intent and
//! resolves once the terminal action with that id has been reduced. Callers
//! that only render state may drop the returned future's result: every change
//! is also visible through [`TodolistsClient::subscribe`].
//!
//! # Example
//!
//! ```ignore
//! let client = TodolistsClient::new(Arc::new(MockTodolistsApi::new()), TodolistsConfig::default());
//!
//! let groceries = client.create_todolist("Groceries").await?;
//! client.create_task(groceries.id.clone(), "Milk").await?;
//!
//! let tasks = client.tasks(&groceries.id).await;
//! ```

use crate::action::{OperationId, TodolistsAction};
use crate::api::TodolistsApi;
use crate::app::AppStatusState;
use crate::config::TodolistsConfig;
use crate::error::ClientError;
use crate::reducer::{TodolistsEnvironment, TodolistsReducer};
use crate::selectors;
use crate::state::AppState;
use crate::types::{
    FilterValue, Task, TaskId, Todolist, TodolistDomain, TodolistId, UpdateDomainTaskModel,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use todosync_runtime::{Store, StoreConfig};
use tokio::sync::{broadcast, watch};

/// Store specialized to todolists
pub type TodolistsStore = Store<AppState, TodolistsAction, TodolistsEnvironment, TodolistsReducer>;

/// Async API over the todolists store
#[derive(Clone)]
pub struct TodolistsClient {
    store: TodolistsStore,
}

impl TodolistsClient {
    /// Create a client with an empty state
    #[must_use]
    pub fn new(api: Arc<dyn TodolistsApi>, config: TodolistsConfig) -> Self {
        Self::with_store_config(api, config, StoreConfig::default())
    }

    /// Create a client with custom runtime settings
    #[must_use]
    pub fn with_store_config(
        api: Arc<dyn TodolistsApi>,
        config: TodolistsConfig,
        store_config: StoreConfig,
    ) -> Self {
        let environment = TodolistsEnvironment::new(api, config);
        let store = Store::with_config(
            AppState::new(),
            TodolistsReducer::new(),
            environment,
            store_config,
        );
        Self { store }
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodolistsStore {
        &self.store
    }

    // ========== Snapshots ==========

    /// Clone of the whole state
    pub async fn snapshot(&self) -> AppState {
        self.store.state(Clone::clone).await
    }

    /// Todolists in display order
    pub async fn todolists(&self) -> Vec<TodolistDomain> {
        self.store.state(|s| s.todolists.items().to_vec()).await
    }

    /// Tasks of a todolist; `None` if it has no collection
    pub async fn tasks(&self, todolist_id: &TodolistId) -> Option<Vec<Task>> {
        self.store
            .state(|s| s.tasks.get(todolist_id).map(<[Task]>::to_vec))
            .await
    }

    /// Every task collection
    pub async fn all_tasks(&self) -> HashMap<TodolistId, Vec<Task>> {
        self.store.state(|s| s.tasks.collections().clone()).await
    }

    /// Status of the latest operation
    pub async fn status(&self) -> AppStatusState {
        self.store.state(|s| s.app.clone()).await
    }

    /// Tasks of a todolist that pass its filter
    pub async fn filtered_tasks(&self, todolist_id: &TodolistId) -> Vec<Task> {
        self.store
            .state(|s| selectors::visible_tasks(s, todolist_id))
            .await
    }

    /// Revision counter, bumped after every state transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe_revisions()
    }

    /// Stream of actions produced by effects, after they were reduced
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<TodolistsAction> {
        self.store.subscribe_actions()
    }

    // ========== Remote operations ==========

    /// Load every todolist, replacing the current ones
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::App`] if the operation failed, or
    /// [`ClientError::Store`] if the store is shutting down.
    pub async fn fetch_todolists(&self) -> Result<Vec<Todolist>, ClientError> {
        let op = OperationId::next();
        match self.run(op, TodolistsAction::FetchTodolists { op }).await? {
            TodolistsAction::TodolistsFetched { todolists, .. } => Ok(todolists),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Create a todolist
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn create_todolist(&self, title: impl Into<String>) -> Result<Todolist, ClientError> {
        let op = OperationId::next();
        let action = TodolistsAction::CreateTodolist {
            op,
            title: title.into(),
        };
        match self.run(op, action).await? {
            TodolistsAction::TodolistCreated { todolist, .. } => Ok(todolist),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Rename a todolist
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn rename_todolist(
        &self,
        id: TodolistId,
        title: impl Into<String>,
    ) -> Result<(), ClientError> {
        let op = OperationId::next();
        let action = TodolistsAction::RenameTodolist {
            op,
            id,
            title: title.into(),
        };
        match self.run(op, action).await? {
            TodolistsAction::TodolistRenamed { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Delete a todolist and its tasks
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn delete_todolist(&self, id: TodolistId) -> Result<(), ClientError> {
        let op = OperationId::next();
        match self.run(op, TodolistsAction::DeleteTodolist { op, id }).await? {
            TodolistsAction::TodolistDeleted { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Load the tasks of a todolist
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn fetch_tasks(&self, todolist_id: TodolistId) -> Result<Vec<Task>, ClientError> {
        let op = OperationId::next();
        match self.run(op, TodolistsAction::FetchTasks { op, todolist_id }).await? {
            TodolistsAction::TasksFetched { tasks, .. } => Ok(tasks),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Create a task
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn create_task(
        &self,
        todolist_id: TodolistId,
        title: impl Into<String>,
    ) -> Result<Task, ClientError> {
        let op = OperationId::next();
        let action = TodolistsAction::CreateTask {
            op,
            todolist_id,
            title: title.into(),
        };
        match self.run(op, action).await? {
            TodolistsAction::TaskCreated { task, .. } => Ok(task),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Change some fields of a task
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`]. A task missing from the cache
    /// fails with `"Task not found"` without calling the API.
    pub async fn update_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        model: UpdateDomainTaskModel,
    ) -> Result<(), ClientError> {
        let op = OperationId::next();
        let action = TodolistsAction::UpdateTask {
            op,
            todolist_id,
            task_id,
            model,
        };
        match self.run(op, action).await? {
            TodolistsAction::TaskUpdated { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    /// Delete a task
    ///
    /// # Errors
    ///
    /// See [`TodolistsClient::fetch_todolists`].
    pub async fn delete_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
    ) -> Result<(), ClientError> {
        let op = OperationId::next();
        let action = TodolistsAction::DeleteTask {
            op,
            todolist_id,
            task_id,
        };
        match self.run(op, action).await? {
            TodolistsAction::TaskDeleted { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedOutcome(op.to_string())),
        }
    }

    // ========== Local operations ==========

    /// Select which tasks of a todolist are shown
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the store is shutting down.
    pub async fn change_filter(&self, id: TodolistId, filter: FilterValue) -> Result<(), ClientError> {
        self.store
            .send(TodolistsAction::ChangeFilter { id, filter })
            .await?;
        Ok(())
    }

    /// Clear the error slot
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> Result<(), ClientError> {
        self.store.send(TodolistsAction::DismissError).await?;
        Ok(())
    }

    /// Drop every todolist and task
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the store is shutting down.
    pub async fn clear_data(&self) -> Result<(), ClientError> {
        self.store.send(TodolistsAction::ClearData).await?;
        Ok(())
    }

    /// Stop accepting operations and wait for in-flight ones
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if operations are still running at the
    /// timeout.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ClientError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }

    /// Send an intent and wait for its terminal action
    async fn run(
        &self,
        op: OperationId,
        action: TodolistsAction,
    ) -> Result<TodolistsAction, ClientError> {
        let terminal = self
            .store
            .send_and_wait_for(action, move |a| a.is_terminal_for(op))
            .await?;

        match terminal {
            TodolistsAction::OperationFailed { error, .. } => Err(ClientError::App(error)),
            confirmed => Ok(confirmed),
        }
    }
}

impl std::fmt::Debug for TodolistsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodolistsClient")
            .field("revision", &self.store.revision())
            .finish_non_exhaustive()
    }
}
