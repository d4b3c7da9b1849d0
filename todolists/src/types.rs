//! Domain types for todolists and tasks.
//!
//! Server DTOs ([`Todolist`], [`Task`]) mirror the remote API's camelCase wire
//! shape. Client-only metadata lives in [`TodolistDomain`].

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a todolist
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodolistId(String);

impl TodolistId {
    /// Wraps a server-provided identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for TodolistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodolistId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a task, unique within its todolist
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a server-provided identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A todolist as returned by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todolist {
    /// Server-assigned identifier
    pub id: TodolistId,
    /// Display title
    pub title: String,
    /// Creation timestamp as reported by the server
    pub added_date: String,
    /// Server-side ordering key
    pub order: i64,
}

/// Which tasks of a todolist the rendering layer shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue {
    /// Every task
    #[default]
    All,
    /// Tasks still in `New` status
    Active,
    /// Tasks in `Completed` status
    Completed,
}

/// Lifecycle of a network request
///
/// Used process-wide for the operation status and per todolist as its
/// entity status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last request was confirmed
    Succeeded,
    /// The last request was rejected or never reached the server
    Failed,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A todolist together with its client-only metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodolistDomain {
    /// Server-assigned identifier
    pub id: TodolistId,
    /// Display title
    pub title: String,
    /// Creation timestamp as reported by the server
    pub added_date: String,
    /// Server-side ordering key
    pub order: i64,
    /// Task filter selected in the UI
    pub filter: FilterValue,
    /// `Loading` while a rename or delete of this todolist is in flight
    pub entity_status: RequestStatus,
}

impl From<Todolist> for TodolistDomain {
    fn from(todolist: Todolist) -> Self {
        Self {
            id: todolist.id,
            title: todolist.title,
            added_date: todolist.added_date,
            order: todolist.order,
            filter: FilterValue::All,
            entity_status: RequestStatus::Idle,
        }
    }
}

/// Task progress, encoded as an integer on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum TaskStatus {
    /// Not started
    #[default]
    New = 0,
    /// Being worked on
    InProgress = 1,
    /// Done
    Completed = 2,
    /// Not yet ready to be worked on
    Draft = 3,
}

impl TryFrom<u8> for TaskStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Completed),
            3 => Ok(Self::Draft),
            other => Err(format!("unknown task status {other}")),
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        status as Self
    }
}

/// Task priority, encoded as an integer on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum TaskPriority {
    /// Lowest priority
    #[default]
    Low = 0,
    /// Normal priority
    Middle = 1,
    /// High priority
    High = 2,
    /// Must be handled first
    Urgent = 3,
    /// Deferred
    Later = 4,
}

impl TryFrom<u8> for TaskPriority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Middle),
            2 => Ok(Self::High),
            3 => Ok(Self::Urgent),
            4 => Ok(Self::Later),
            other => Err(format!("unknown task priority {other}")),
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority as Self
    }
}

/// A task as returned by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier, unique within the owning todolist
    pub id: TaskId,
    /// Owning todolist
    pub todo_list_id: TodolistId,
    /// Display title
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Progress
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
    /// Planned start
    pub start_date: Option<String>,
    /// Due date
    pub deadline: Option<String>,
    /// Server-side ordering key
    pub order: i64,
    /// Creation timestamp as reported by the server
    pub added_date: String,
}

/// Complete set of mutable task fields sent with every update request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskModel {
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Status
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
    /// Start date
    pub start_date: Option<String>,
    /// Deadline
    pub deadline: Option<String>,
}

/// Partial task update: `None` fields keep their current value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomainTaskModel {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New status
    pub status: Option<TaskStatus>,
    /// New priority
    pub priority: Option<TaskPriority>,
    /// New start date
    pub start_date: Option<String>,
    /// New deadline
    pub deadline: Option<String>,
}

impl UpdateDomainTaskModel {
    /// Partial model changing only the status
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Partial model changing only the title
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set the priority
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Returns `true` if no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.start_date.is_none()
            && self.deadline.is_none()
    }

    /// Full update model: the task's current values overlaid with this one
    #[must_use]
    pub fn merged_over(&self, task: &Task) -> UpdateTaskModel {
        UpdateTaskModel {
            title: self.title.clone().unwrap_or_else(|| task.title.clone()),
            description: self.description.clone().or_else(|| task.description.clone()),
            status: self.status.unwrap_or(task.status),
            priority: self.priority.unwrap_or(task.priority),
            start_date: self.start_date.clone().or_else(|| task.start_date.clone()),
            deadline: self.deadline.clone().or_else(|| task.deadline.clone()),
        }
    }

    /// Apply the set fields to a cached task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(start_date) = &self.start_date {
            task.start_date = Some(start_date.clone());
        }
        if let Some(deadline) = &self.deadline {
            task.deadline = Some(deadline.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: TaskId::new("t-1"),
            todo_list_id: TodolistId::new("tl-1"),
            title: "Milk".to_string(),
            description: Some("2 liters".to_string()),
            status: TaskStatus::New,
            priority: TaskPriority::Middle,
            start_date: None,
            deadline: Some("2026-10-20".to_string()),
            order: 0,
            added_date: "2026-10-18T10:00:00".to_string(),
        }
    }

    #[test]
    fn merged_over_uses_current_values_as_defaults() {
        let model = UpdateDomainTaskModel::status(TaskStatus::Completed).merged_over(&task());

        assert_eq!(
            model,
            UpdateTaskModel {
                title: "Milk".to_string(),
                description: Some("2 liters".to_string()),
                status: TaskStatus::Completed,
                priority: TaskPriority::Middle,
                start_date: None,
                deadline: Some("2026-10-20".to_string()),
            }
        );
    }

    #[test]
    fn apply_to_changes_only_set_fields() {
        let before = task();
        let mut after = before.clone();
        UpdateDomainTaskModel::title("Oat milk")
            .with_priority(TaskPriority::Urgent)
            .apply_to(&mut after);

        assert_eq!(after.title, "Oat milk");
        assert_eq!(after.priority, TaskPriority::Urgent);
        assert_eq!(after.description, before.description);
        assert_eq!(after.status, before.status);
        assert_eq!(after.deadline, before.deadline);
    }

    #[test]
    fn task_uses_camel_case_and_numeric_enums() {
        let json = serde_json::to_value(task()).unwrap();
        assert_eq!(json["todoListId"], "tl-1");
        assert_eq!(json["status"], 0);
        assert_eq!(json["priority"], 1);

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task());
    }

    #[test]
    fn high_priority_is_two_on_the_wire() {
        assert_eq!(serde_json::to_value(TaskPriority::High).unwrap(), 2);
        assert_eq!(
            serde_json::from_value::<TaskPriority>(serde_json::json!(2)).unwrap(),
            TaskPriority::High
        );
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let mut json = serde_json::to_value(task()).unwrap();
        json["status"] = serde_json::json!(9);
        assert!(serde_json::from_value::<Task>(json).is_err());
    }

    #[test]
    fn domain_todolist_starts_idle_with_all_filter() {
        let domain = TodolistDomain::from(Todolist {
            id: TodolistId::new("tl-1"),
            title: "Groceries".to_string(),
            added_date: String::new(),
            order: 0,
        });
        assert_eq!(domain.filter, FilterValue::All);
        assert_eq!(domain.entity_status, RequestStatus::Idle);
    }
}
