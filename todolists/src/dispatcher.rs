//! Remote operation effects.
//!
//! Each builder returns an [`Effect::Future`] that calls the API exactly once
//! and resolves to the terminal action of its operation. Responses are turned
//! into outcomes by [`expect_success`] and [`app_error_from`], which do not
//! need a store.

use crate::action::{Operation, OperationId, TodolistsAction};
use crate::api::{ApiError, ResponseEnvelope};
use crate::config::TodolistsConfig;
use crate::error::AppError;
use crate::reducer::TodolistsEnvironment;
use crate::types::{TaskId, TodolistId, UpdateDomainTaskModel, UpdateTaskModel};
use std::sync::Arc;
use todosync_core::async_effect;
use todosync_core::effect::Effect;

/// Unwrap the payload of an accepted envelope
///
/// # Errors
///
/// Returns [`AppError::Application`] with the first server message, or the
/// configured generic message, when the result code is not success.
pub fn expect_success<D>(
    envelope: ResponseEnvelope<D>,
    config: &TodolistsConfig,
) -> Result<D, AppError> {
    if envelope.is_success() {
        return Ok(envelope.data);
    }

    let message = envelope
        .first_message()
        .map_or_else(|| config.generic_error_message.clone(), str::to_string);
    Err(AppError::Application(message))
}

/// Map a transport failure to a user-facing error
#[must_use]
pub fn app_error_from(error: &ApiError, config: &TodolistsConfig) -> AppError {
    let message = error.to_string();
    if message.trim().is_empty() {
        AppError::Network(config.network_error_message.clone())
    } else {
        AppError::Network(message)
    }
}

fn outcome<D>(
    response: Result<ResponseEnvelope<D>, ApiError>,
    config: &TodolistsConfig,
) -> Result<D, AppError> {
    response
        .map_err(|error| app_error_from(&error, config))
        .and_then(|envelope| expect_success(envelope, config))
}

/// Check that a title is not blank
///
/// # Errors
///
/// Returns `"Title is required"` as an application error.
pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Application("Title is required".to_string()));
    }
    Ok(())
}

/// Check that a todolist id is not blank
///
/// # Errors
///
/// Returns `"Todolist id is required"` as an application error.
pub fn validate_todolist_id(id: &TodolistId) -> Result<(), AppError> {
    if id.is_blank() {
        return Err(AppError::Application("Todolist id is required".to_string()));
    }
    Ok(())
}

/// Check that a task id is not blank
///
/// # Errors
///
/// Returns `"Task id is required"` as an application error.
pub fn validate_task_id(id: &TaskId) -> Result<(), AppError> {
    if id.is_blank() {
        return Err(AppError::Application("Task id is required".to_string()));
    }
    Ok(())
}

/// Build the terminal action of an operation and record its outcome
fn settle<T>(
    op: OperationId,
    operation: Operation,
    todolist_id: Option<TodolistId>,
    result: Result<T, AppError>,
    confirmed: impl FnOnce(T) -> TodolistsAction,
) -> TodolistsAction {
    match result {
        Ok(payload) => {
            tracing::debug!(%op, %operation, "Operation confirmed");
            metrics::counter!("todolists.operations.succeeded", "operation" => operation.as_str())
                .increment(1);
            confirmed(payload)
        },
        Err(error) => failed(op, operation, todolist_id, error),
    }
}

/// Build the failure of an operation and record it
#[must_use]
pub fn failed(
    op: OperationId,
    operation: Operation,
    todolist_id: Option<TodolistId>,
    error: AppError,
) -> TodolistsAction {
    tracing::warn!(%op, %operation, kind = error.kind(), "Operation failed: {error}");
    metrics::counter!(
        "todolists.operations.failed",
        "operation" => operation.as_str(),
        "kind" => error.kind()
    )
    .increment(1);

    TodolistsAction::OperationFailed {
        op,
        operation,
        todolist_id,
        error,
    }
}

/// Fail an operation without calling the API
#[must_use]
pub fn reject(
    op: OperationId,
    operation: Operation,
    todolist_id: Option<TodolistId>,
    error: AppError,
) -> Effect<TodolistsAction> {
    async_effect! {
        Some(failed(op, operation, todolist_id, error))
    }
}

/// List todolists
#[must_use]
pub fn fetch_todolists(op: OperationId, env: &TodolistsEnvironment) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = api
            .get_todolists()
            .await
            .map_err(|error| app_error_from(&error, &config));

        Some(settle(op, Operation::FetchTodolists, None, result, |todolists| {
            TodolistsAction::TodolistsFetched { op, todolists }
        }))
    }
}

/// Create a todolist
#[must_use]
pub fn create_todolist(
    op: OperationId,
    title: String,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(api.create_todolist(title).await, &config);

        Some(settle(op, Operation::CreateTodolist, None, result, |data| {
            TodolistsAction::TodolistCreated { op, todolist: data.item }
        }))
    }
}

/// Rename a todolist
#[must_use]
pub fn rename_todolist(
    op: OperationId,
    id: TodolistId,
    title: String,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(api.update_todolist_title(id.clone(), title.clone()).await, &config);

        Some(settle(op, Operation::RenameTodolist, Some(id.clone()), result, |_| {
            TodolistsAction::TodolistRenamed { op, id, title }
        }))
    }
}

/// Delete a todolist
#[must_use]
pub fn delete_todolist(
    op: OperationId,
    id: TodolistId,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(api.delete_todolist(id.clone()).await, &config);

        Some(settle(op, Operation::DeleteTodolist, Some(id.clone()), result, |_| {
            TodolistsAction::TodolistDeleted { op, id }
        }))
    }
}

/// List the tasks of a todolist
///
/// A response carrying an `error` string is an application failure.
#[must_use]
pub fn fetch_tasks(
    op: OperationId,
    todolist_id: TodolistId,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = match api.get_tasks(todolist_id.clone()).await {
            Ok(response) => match response.error {
                Some(message) if !message.trim().is_empty() => Err(AppError::Application(message)),
                _ => Ok(response.items),
            },
            Err(error) => Err(app_error_from(&error, &config)),
        };

        Some(settle(op, Operation::FetchTasks, Some(todolist_id.clone()), result, |tasks| {
            TodolistsAction::TasksFetched { op, todolist_id, tasks }
        }))
    }
}

/// Create a task
#[must_use]
pub fn create_task(
    op: OperationId,
    todolist_id: TodolistId,
    title: String,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(api.create_task(todolist_id.clone(), title).await, &config);

        Some(settle(op, Operation::CreateTask, Some(todolist_id), result, |data| {
            TodolistsAction::TaskCreated { op, task: data.item }
        }))
    }
}

/// Update a task
///
/// `full` is sent to the server; `partial` is what the confirmed result
/// merges into the cache.
#[must_use]
pub fn update_task(
    op: OperationId,
    todolist_id: TodolistId,
    task_id: TaskId,
    full: UpdateTaskModel,
    partial: UpdateDomainTaskModel,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(
            api.update_task(todolist_id.clone(), task_id.clone(), full).await,
            &config,
        );

        Some(settle(op, Operation::UpdateTask, Some(todolist_id.clone()), result, |_| {
            TodolistsAction::TaskUpdated { op, todolist_id, task_id, model: partial }
        }))
    }
}

/// Delete a task
#[must_use]
pub fn delete_task(
    op: OperationId,
    todolist_id: TodolistId,
    task_id: TaskId,
    env: &TodolistsEnvironment,
) -> Effect<TodolistsAction> {
    let api = Arc::clone(&env.api);
    let config = Arc::clone(&env.config);

    async_effect! {
        let result = outcome(
            api.delete_task(todolist_id.clone(), task_id.clone()).await,
            &config,
        );

        Some(settle(op, Operation::DeleteTask, Some(todolist_id.clone()), result, |_| {
            TodolistsAction::TaskDeleted { op, todolist_id, task_id }
        }))
    }
}
