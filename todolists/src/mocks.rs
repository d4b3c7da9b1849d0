//! In-memory implementation of [`TodolistsApi`].
//!
//! [`MockTodolistsApi`] behaves like the remote server: it assigns ids,
//! prepends created entities and answers every call from memory. Failures can
//! be scripted per call with [`MockTodolistsApi::fail_next`], and an optional
//! latency makes responses arrive out of order in concurrency tests.
//!
//! # Example
//!
//! ```ignore
//! use todolists::mocks::{MockFailure, MockTodolistsApi};
//!
//! let api = MockTodolistsApi::new();
//! api.fail_next(MockFailure::reject("Title is too long"));
//! ```

use crate::api::{
    ApiError, ApiFuture, Empty, GetTasksResponse, ItemData, ResponseEnvelope, ResultCode,
    TodolistsApi,
};
use crate::types::{Task, TaskId, TaskPriority, TaskStatus, Todolist, TodolistId, UpdateTaskModel};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

/// A scripted failure consumed by the next API call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockFailure {
    /// Answer with a rejected envelope
    ///
    /// Listing calls have no envelope: `get_tasks` reports the first message in
    /// its `error` field and `get_todolists` fails with HTTP 400.
    Reject {
        /// Result code of the envelope
        result_code: i32,
        /// Messages of the envelope
        messages: Vec<String>,
    },
    /// Fail at the transport level
    Network(String),
}

impl MockFailure {
    /// Rejection with result code `Error` and one message
    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self::Reject {
            result_code: ResultCode::Error.code(),
            messages: vec![message.into()],
        }
    }

    /// Rejection with result code `Error` and no message
    #[must_use]
    pub fn reject_silently() -> Self {
        Self::Reject {
            result_code: ResultCode::Error.code(),
            messages: Vec::new(),
        }
    }

    /// Transport failure
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

#[derive(Debug, Default)]
struct ServerState {
    todolists: Vec<Todolist>,
    tasks: HashMap<TodolistId, Vec<Task>>,
    next_id: u64,
    failures: VecDeque<MockFailure>,
    calls: HashMap<&'static str, usize>,
    last_update: Option<UpdateTaskModel>,
}

impl ServerState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn record(&mut self, method: &'static str) -> Option<MockFailure> {
        *self.calls.entry(method).or_default() += 1;
        self.failures.pop_front()
    }

    fn timestamp(&self) -> String {
        format!("2026-01-01T00:00:{:02}", self.next_id % 60)
    }
}

/// In-memory todolists server
#[derive(Clone, Debug, Default)]
pub struct MockTodolistsApi {
    state: Arc<RwLock<ServerState>>,
    latency: Option<Duration>,
}

impl MockTodolistsApi {
    /// Create an empty server
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a todolist, returning its id
    pub fn seed_todolist(&self, title: &str) -> TodolistId {
        let mut state = self.write();
        let id = TodolistId::new(state.allocate("tl"));
        let todolist = Todolist {
            id: id.clone(),
            title: title.to_string(),
            added_date: state.timestamp(),
            order: 0,
        };
        state.todolists.insert(0, todolist);
        state.tasks.insert(id.clone(), Vec::new());
        id
    }

    /// Seed a task, returning its id
    ///
    /// Returns `None` if the todolist does not exist.
    pub fn seed_task(&self, todolist_id: &TodolistId, title: &str) -> Option<TaskId> {
        let mut state = self.write();
        if !state.tasks.contains_key(todolist_id) {
            return None;
        }
        let task = new_task(&mut state, todolist_id, title);
        let id = task.id.clone();
        state.tasks.get_mut(todolist_id)?.insert(0, task);
        Some(id)
    }

    /// Make the next call fail; failures queue up in order
    pub fn fail_next(&self, failure: MockFailure) {
        self.write().failures.push_back(failure);
    }

    /// Number of calls made to an API method, by method name
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.read(|state| state.calls.get(method).copied().unwrap_or(0))
    }

    /// Total number of API calls
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.read(|state| state.calls.values().sum())
    }

    /// Full model received by the latest successful `update_task`
    #[must_use]
    pub fn last_update(&self) -> Option<UpdateTaskModel> {
        self.read(|state| state.last_update.clone())
    }

    /// Tasks the server holds for a todolist
    #[must_use]
    pub fn server_tasks(&self, todolist_id: &TodolistId) -> Vec<Task> {
        self.read(|state| state.tasks.get(todolist_id).cloned().unwrap_or_default())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ServerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&ServerState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Run one call: wait, consume a scripted failure, otherwise answer
    async fn respond<D>(
        &self,
        method: &'static str,
        empty: D,
        answer: impl FnOnce(&mut ServerState) -> ResponseEnvelope<D>,
    ) -> Result<ResponseEnvelope<D>, ApiError> {
        self.delay().await;
        let mut state = self.write();
        match state.record(method) {
            Some(MockFailure::Network(message)) => Err(ApiError::Network(message)),
            Some(MockFailure::Reject {
                result_code,
                messages,
            }) => Ok(ResponseEnvelope::rejected(result_code, messages, empty)),
            None => Ok(answer(&mut state)),
        }
    }
}

fn new_task(state: &mut ServerState, todolist_id: &TodolistId, title: &str) -> Task {
    Task {
        id: TaskId::new(state.allocate("task")),
        todo_list_id: todolist_id.clone(),
        title: title.to_string(),
        description: None,
        status: TaskStatus::New,
        priority: TaskPriority::Low,
        start_date: None,
        deadline: None,
        order: 0,
        added_date: state.timestamp(),
    }
}

fn not_found(what: &str) -> ResponseEnvelope<Empty> {
    ResponseEnvelope::rejected(
        ResultCode::Error.code(),
        vec![format!("{what} not found")],
        Empty {},
    )
}

fn placeholder_todolist() -> Todolist {
    Todolist {
        id: TodolistId::new(""),
        title: String::new(),
        added_date: String::new(),
        order: 0,
    }
}

fn placeholder_task() -> Task {
    Task {
        id: TaskId::new(""),
        todo_list_id: TodolistId::new(""),
        title: String::new(),
        description: None,
        status: TaskStatus::New,
        priority: TaskPriority::Low,
        start_date: None,
        deadline: None,
        order: 0,
        added_date: String::new(),
    }
}

impl TodolistsApi for MockTodolistsApi {
    fn get_todolists(&self) -> ApiFuture<'_, Vec<Todolist>> {
        Box::pin(async move {
            self.delay().await;
            let mut state = self.write();
            match state.record("get_todolists") {
                Some(MockFailure::Network(message)) => Err(ApiError::Network(message)),
                Some(MockFailure::Reject { messages, .. }) => Err(ApiError::Status {
                    status: 400,
                    body: messages.join("; "),
                }),
                None => Ok(state.todolists.clone()),
            }
        })
    }

    fn create_todolist(&self, title: String) -> ApiFuture<'_, ResponseEnvelope<ItemData<Todolist>>> {
        Box::pin(async move {
            let empty = ItemData {
                item: placeholder_todolist(),
            };
            self.respond("create_todolist", empty, |state| {
                let id = TodolistId::new(state.allocate("tl"));
                let todolist = Todolist {
                    id: id.clone(),
                    title,
                    added_date: state.timestamp(),
                    order: 0,
                };
                state.todolists.insert(0, todolist.clone());
                state.tasks.insert(id, Vec::new());
                ResponseEnvelope::success(ItemData { item: todolist })
            })
            .await
        })
    }

    fn update_todolist_title(
        &self,
        id: TodolistId,
        title: String,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>> {
        Box::pin(async move {
            self.respond("update_todolist_title", Empty {}, |state| {
                match state.todolists.iter_mut().find(|tl| tl.id == id) {
                    Some(todolist) => {
                        todolist.title = title;
                        ResponseEnvelope::success(Empty {})
                    },
                    None => not_found("Todolist"),
                }
            })
            .await
        })
    }

    fn delete_todolist(&self, id: TodolistId) -> ApiFuture<'_, ResponseEnvelope<Empty>> {
        Box::pin(async move {
            self.respond("delete_todolist", Empty {}, |state| {
                let before = state.todolists.len();
                state.todolists.retain(|tl| tl.id != id);
                if state.todolists.len() == before {
                    return not_found("Todolist");
                }
                state.tasks.remove(&id);
                ResponseEnvelope::success(Empty {})
            })
            .await
        })
    }

    fn get_tasks(&self, todolist_id: TodolistId) -> ApiFuture<'_, GetTasksResponse> {
        Box::pin(async move {
            self.delay().await;
            let mut state = self.write();
            match state.record("get_tasks") {
                Some(MockFailure::Network(message)) => Err(ApiError::Network(message)),
                Some(MockFailure::Reject { messages, .. }) => Ok(GetTasksResponse {
                    items: Vec::new(),
                    total_count: 0,
                    error: Some(
                        messages
                            .into_iter()
                            .next()
                            .unwrap_or_else(|| "Some error occurred".to_string()),
                    ),
                }),
                None => {
                    let items = state.tasks.get(&todolist_id).cloned().unwrap_or_default();
                    Ok(GetTasksResponse {
                        total_count: items.len(),
                        items,
                        error: None,
                    })
                },
            }
        })
    }

    fn create_task(
        &self,
        todolist_id: TodolistId,
        title: String,
    ) -> ApiFuture<'_, ResponseEnvelope<ItemData<Task>>> {
        Box::pin(async move {
            let empty = ItemData {
                item: placeholder_task(),
            };
            self.respond("create_task", empty.clone(), |state| {
                if !state.tasks.contains_key(&todolist_id) {
                    return ResponseEnvelope::rejected(
                        ResultCode::Error.code(),
                        vec!["Todolist not found".to_string()],
                        empty,
                    );
                }
                let task = new_task(state, &todolist_id, &title);
                if let Some(tasks) = state.tasks.get_mut(&todolist_id) {
                    tasks.insert(0, task.clone());
                }
                ResponseEnvelope::success(ItemData { item: task })
            })
            .await
        })
    }

    fn update_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        model: UpdateTaskModel,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>> {
        Box::pin(async move {
            self.respond("update_task", Empty {}, |state| {
                let task = state
                    .tasks
                    .get_mut(&todolist_id)
                    .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id));
                let Some(task) = task else {
                    return not_found("Task");
                };
                task.title.clone_from(&model.title);
                task.description.clone_from(&model.description);
                task.status = model.status;
                task.priority = model.priority;
                task.start_date.clone_from(&model.start_date);
                task.deadline.clone_from(&model.deadline);
                state.last_update = Some(model);
                ResponseEnvelope::success(Empty {})
            })
            .await
        })
    }

    fn delete_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
    ) -> ApiFuture<'_, ResponseEnvelope<Empty>> {
        Box::pin(async move {
            self.respond("delete_task", Empty {}, |state| {
                let Some(tasks) = state.tasks.get_mut(&todolist_id) else {
                    return not_found("Todolist");
                };
                match tasks.iter().position(|t| t.id == task_id) {
                    Some(index) => {
                        tasks.remove(index);
                        ResponseEnvelope::success(Empty {})
                    },
                    None => not_found("Task"),
                }
            })
            .await
        })
    }
}
