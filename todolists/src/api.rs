//! Contract with the remote todolists API.
//!
//! The transport (HTTP client, URLs, serialization) is not part of this
//! crate. Anything that can answer these eight calls can back a store:
//! a real HTTP client, or [`MockTodolistsApi`](crate::mocks::MockTodolistsApi)
//! in tests.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! environment can hold an `Arc<dyn TodolistsApi>` and effects can capture it.

use crate::types::{Task, TaskId, Todolist, TodolistId, UpdateTaskModel};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by every [`TodolistsApi`] method
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Transport-level failure: the call itself did not produce a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never completed (connectivity, DNS, timeout in the transport)
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-2xx HTTP status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Well-known values of [`ResponseEnvelope::result_code`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// The operation was applied
    Success = 0,
    /// The operation was rejected
    Error = 1,
    /// The server requires a captcha before accepting the operation
    Captcha = 10,
}

impl ResultCode {
    /// Maps a raw result code to a known variant
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::Error),
            10 => Some(Self::Captcha),
            _ => None,
        }
    }

    /// The raw wire value
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Envelope wrapping every mutating response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<D> {
    /// `0` on success, anything else is an application-level rejection
    pub result_code: i32,
    /// Human-readable reasons; the first one is shown to the user
    #[serde(default)]
    pub messages: Vec<String>,
    /// Operation-specific payload
    pub data: D,
}

impl<D> ResponseEnvelope<D> {
    /// A successful envelope around `data`
    #[must_use]
    pub const fn success(data: D) -> Self {
        Self {
            result_code: ResultCode::Success.code(),
            messages: Vec::new(),
            data,
        }
    }

    /// A rejected envelope with the given code and messages
    #[must_use]
    pub const fn rejected(result_code: i32, messages: Vec<String>, data: D) -> Self {
        Self {
            result_code,
            messages,
            data,
        }
    }

    /// Returns `true` if the server applied the operation
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result_code == ResultCode::Success.code()
    }

    /// First message, if the server sent any
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }
}

/// Payload of create responses
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData<T> {
    /// The created entity
    pub item: T,
}

/// Payload of responses that carry no data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Response of the task listing endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTasksResponse {
    /// Tasks in server order
    pub items: Vec<Task>,
    /// Total number of tasks in the todolist
    pub total_count: usize,
    /// Set when the server could not list the tasks
    pub error: Option<String>,
}

/// CRUD operations of the remote API
///
/// Every method issues exactly one request. `Err` means the call failed at the
/// transport level; application-level rejections come back as `Ok` envelopes
/// with a non-zero result code.
pub trait TodolistsApi: Send + Sync {
    /// List every todolist of the current user
    fn get_todolists(&self) -> ApiFuture<'_, Vec<Todolist>>;

    /// Create a todolist
    fn create_todolist(&self, title: String) -> ApiFuture<'_, ResponseEnvelope<ItemData<Todolist>>>;

    /// Rename a todolist
    fn update_todolist_title(
        &self,
        id: TodolistId,
        title: String,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>>;

    /// Delete a todolist together with its tasks
    fn delete_todolist(&self, id: TodolistId) -> ApiFuture<'_, ResponseEnvelope<Empty>>;

    /// List the tasks of a todolist
    fn get_tasks(&self, todolist_id: TodolistId) -> ApiFuture<'_, GetTasksResponse>;

    /// Create a task
    fn create_task(
        &self,
        todolist_id: TodolistId,
        title: String,
    ) -> ApiFuture<'_, ResponseEnvelope<ItemData<Task>>>;

    /// Replace every mutable field of a task
    fn update_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        model: UpdateTaskModel,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>>;

    /// Delete a task
    fn delete_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_wire_shape() {
        let json = r#"{"resultCode":1,"messages":["Title is too long"],"data":{}}"#;
        let envelope: ResponseEnvelope<Empty> = serde_json::from_str(json).unwrap();

        assert!(!envelope.is_success());
        assert_eq!(ResultCode::from_code(envelope.result_code), Some(ResultCode::Error));
        assert_eq!(envelope.first_message(), Some("Title is too long"));
    }

    #[test]
    fn missing_messages_default_to_empty() {
        let json = r#"{"resultCode":0,"data":{}}"#;
        let envelope: ResponseEnvelope<Empty> = serde_json::from_str(json).unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.first_message(), None);
    }

    #[test]
    fn unknown_result_codes_are_not_success() {
        let envelope = ResponseEnvelope::rejected(42, Vec::new(), Empty {});
        assert!(!envelope.is_success());
        assert_eq!(ResultCode::from_code(42), None);
    }
}
