//! Client-side state synchronization for todolists and their tasks.
//!
//! Keeps an in-memory copy of the user's todolists and tasks consistent with a
//! remote CRUD API. State changes only after the server confirmed them, and
//! every todolist always owns exactly one task collection.
//!
//! - [`TodolistsReducer`] handles intents, confirmed results and local actions
//! - [`TodolistsClient`] wraps the [`Store`](todosync_runtime::Store) with one
//!   async method per operation
//! - [`TodolistsApi`] is the contract the transport must fulfil
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todolists::{mocks::MockTodolistsApi, TodolistsClient, TodolistsConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TodolistsClient::new(Arc::new(MockTodolistsApi::new()), TodolistsConfig::default());
//!
//! let groceries = client.create_todolist("Groceries").await?;
//! let milk = client.create_task(groceries.id.clone(), "Milk").await?;
//! client.delete_task(groceries.id.clone(), milk.id).await?;
//!
//! let status = client.status().await;
//! println!("last operation: {}", status.status);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod mocks;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod tasks;
pub mod todolists;
pub mod types;

// Re-export commonly used types
pub use action::{Operation, OperationId, TodolistsAction};
pub use api::{ApiError, ResponseEnvelope, ResultCode, TodolistsApi};
pub use client::{TodolistsClient, TodolistsStore};
pub use config::TodolistsConfig;
pub use error::{AppError, ClientError, CoordinationViolation};
pub use reducer::{TodolistsEnvironment, TodolistsReducer};
pub use state::AppState;
pub use types::{
    FilterValue, RequestStatus, Task, TaskId, TaskPriority, TaskStatus, Todolist, TodolistDomain,
    TodolistId, UpdateDomainTaskModel, UpdateTaskModel,
};
