//! Reducer logic for the todolists store.
//!
//! Intents validate their input, mark the operation as loading and return the
//! effect that calls the API. Confirmed results mutate the todolist and task
//! stores; structural todolist changes reach the task store through
//! [`coordinator::propagate`] within the same reduction.

use crate::action::{Operation, OperationId, TodolistsAction};
use crate::api::TodolistsApi;
use crate::config::TodolistsConfig;
use crate::coordinator::{self, TodolistLifecycle};
use crate::dispatcher;
use crate::error::{AppError, CoordinationViolation};
use crate::state::AppState;
use crate::types::TodolistId;
use std::sync::Arc;
use todosync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use todosync_runtime::StoreError;

/// Environment dependencies for the todolists reducer
#[derive(Clone)]
pub struct TodolistsEnvironment {
    /// Remote API
    pub api: Arc<dyn TodolistsApi>,
    /// Messages and behavior switches
    pub config: Arc<TodolistsConfig>,
}

impl TodolistsEnvironment {
    /// Creates a new `TodolistsEnvironment`
    #[must_use]
    pub fn new(api: Arc<dyn TodolistsApi>, config: TodolistsConfig) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for TodolistsEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodolistsEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reducer for todolists and their tasks
#[derive(Clone, Debug, Default)]
pub struct TodolistsReducer;

impl TodolistsReducer {
    /// Creates a new `TodolistsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn propagate(state: &mut AppState, event: &TodolistLifecycle) {
        coordinator::propagate(&mut state.tasks, event);
    }

    fn report_violation(violation: &CoordinationViolation) {
        tracing::error!(%violation, "Confirmed result dropped");
        metrics::counter!("todolists.coordination.violations").increment(1);
    }

    /// Start an operation after its input passed validation
    fn dispatch(
        state: &mut AppState,
        op: OperationId,
        operation: Operation,
        todolist_id: Option<&TodolistId>,
        validation: Result<(), AppError>,
        effect: impl FnOnce() -> Effect<TodolistsAction>,
    ) -> SmallVec<[Effect<TodolistsAction>; 4]> {
        if let Err(error) = validation {
            tracing::debug!(%op, %operation, "Rejected before dispatch: {error}");
            return smallvec![dispatcher::reject(op, operation, todolist_id.cloned(), error)];
        }

        tracing::debug!(%op, %operation, "Dispatching operation");
        state.app.start();
        if operation.marks_entity() {
            if let Some(id) = todolist_id {
                state.todolists.begin_entity_operation(op, id);
            }
        }

        smallvec![effect()]
    }

    fn fetch_tasks_for(ids: Vec<TodolistId>) -> Effect<TodolistsAction> {
        Effect::merge(
            ids.into_iter()
                .map(|todolist_id| {
                    Effect::send(TodolistsAction::FetchTasks {
                        op: OperationId::next(),
                        todolist_id,
                    })
                })
                .collect(),
        )
    }
}

impl Reducer for TodolistsReducer {
    type State = AppState;
    type Action = TodolistsAction;
    type Environment = TodolistsEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Intents ==========
            TodolistsAction::FetchTodolists { op } => {
                Self::dispatch(state, op, Operation::FetchTodolists, None, Ok(()), || {
                    dispatcher::fetch_todolists(op, env)
                })
            },

            TodolistsAction::CreateTodolist { op, title } => {
                let validation = dispatcher::validate_title(&title);
                Self::dispatch(state, op, Operation::CreateTodolist, None, validation, || {
                    dispatcher::create_todolist(op, title, env)
                })
            },

            TodolistsAction::RenameTodolist { op, id, title } => {
                let validation = dispatcher::validate_todolist_id(&id)
                    .and_then(|()| dispatcher::validate_title(&title));
                let target = id.clone();
                Self::dispatch(
                    state,
                    op,
                    Operation::RenameTodolist,
                    Some(&target),
                    validation,
                    || dispatcher::rename_todolist(op, id, title, env),
                )
            },

            TodolistsAction::DeleteTodolist { op, id } => {
                let validation = dispatcher::validate_todolist_id(&id);
                let target = id.clone();
                Self::dispatch(
                    state,
                    op,
                    Operation::DeleteTodolist,
                    Some(&target),
                    validation,
                    || dispatcher::delete_todolist(op, id, env),
                )
            },

            TodolistsAction::FetchTasks { op, todolist_id } => {
                let validation = dispatcher::validate_todolist_id(&todolist_id);
                let target = todolist_id.clone();
                Self::dispatch(
                    state,
                    op,
                    Operation::FetchTasks,
                    Some(&target),
                    validation,
                    || dispatcher::fetch_tasks(op, todolist_id, env),
                )
            },

            TodolistsAction::CreateTask {
                op,
                todolist_id,
                title,
            } => {
                let validation = dispatcher::validate_todolist_id(&todolist_id)
                    .and_then(|()| dispatcher::validate_title(&title));
                let target = todolist_id.clone();
                Self::dispatch(
                    state,
                    op,
                    Operation::CreateTask,
                    Some(&target),
                    validation,
                    || dispatcher::create_task(op, todolist_id, title, env),
                )
            },

            TodolistsAction::UpdateTask {
                op,
                todolist_id,
                task_id,
                model,
            } => {
                let validation = dispatcher::validate_todolist_id(&todolist_id)
                    .and_then(|()| dispatcher::validate_task_id(&task_id));
                if let Err(error) = validation {
                    return smallvec![dispatcher::reject(
                        op,
                        Operation::UpdateTask,
                        Some(todolist_id),
                        error
                    )];
                }

                state.app.start();

                let Some(full) = state
                    .tasks
                    .find_task(&todolist_id, &task_id)
                    .map(|task| model.merged_over(task))
                else {
                    tracing::debug!(%op, %todolist_id, %task_id, "Task not found in cache");
                    return smallvec![dispatcher::reject(
                        op,
                        Operation::UpdateTask,
                        Some(todolist_id),
                        AppError::Application("Task not found".to_string())
                    )];
                };

                tracing::debug!(%op, operation = %Operation::UpdateTask, "Dispatching operation");
                smallvec![dispatcher::update_task(
                    op,
                    todolist_id,
                    task_id,
                    full,
                    model,
                    env
                )]
            },

            TodolistsAction::DeleteTask {
                op,
                todolist_id,
                task_id,
            } => {
                let validation = dispatcher::validate_todolist_id(&todolist_id)
                    .and_then(|()| dispatcher::validate_task_id(&task_id));
                let target = todolist_id.clone();
                Self::dispatch(
                    state,
                    op,
                    Operation::DeleteTask,
                    Some(&target),
                    validation,
                    || dispatcher::delete_task(op, todolist_id, task_id, env),
                )
            },

            // ========== Local ==========
            TodolistsAction::ChangeFilter { id, filter } => {
                if !state.todolists.set_filter_by_id(&id, filter) {
                    tracing::debug!(%id, "Filter change for unknown todolist ignored");
                }
                SmallVec::new()
            },

            TodolistsAction::DismissError => {
                state.app.dismiss_error();
                SmallVec::new()
            },

            TodolistsAction::ClearData => {
                let event = state.todolists.clear();
                Self::propagate(state, &event);
                SmallVec::new()
            },

            // ========== Confirmed results ==========
            TodolistsAction::TodolistsFetched { op, todolists } => {
                state.app.succeed();
                let event = state.todolists.replace_all(todolists);
                Self::propagate(state, &event);
                tracing::debug!(%op, count = state.todolists.len(), "Todolists replaced");

                if env.config.fetch_tasks_on_load && !state.todolists.is_empty() {
                    smallvec![Self::fetch_tasks_for(state.todolists.ids())]
                } else {
                    SmallVec::new()
                }
            },

            TodolistsAction::TodolistCreated { op, todolist } => {
                state.app.succeed();
                let event = state.todolists.insert_one(todolist);
                Self::propagate(state, &event);
                tracing::debug!(%op, "Todolist inserted");
                SmallVec::new()
            },

            TodolistsAction::TodolistRenamed { op, id, title } => {
                state.app.succeed();
                if !state.todolists.rename_by_id(&id, &title) {
                    tracing::debug!(%op, %id, "Renamed todolist is no longer held");
                }
                state.todolists.finish_entity_operation(op);
                SmallVec::new()
            },

            TodolistsAction::TodolistDeleted { op, id } => {
                state.app.succeed();
                match state.todolists.remove_by_id(&id) {
                    Some(event) => Self::propagate(state, &event),
                    None => tracing::debug!(%op, %id, "Deleted todolist was not held"),
                }
                SmallVec::new()
            },

            TodolistsAction::TasksFetched {
                op,
                todolist_id,
                tasks,
            } => {
                state.app.succeed();
                if let Err(violation) = state.tasks.set_tasks(&todolist_id, tasks) {
                    Self::report_violation(&violation);
                } else {
                    tracing::debug!(%op, %todolist_id, "Tasks replaced");
                }
                SmallVec::new()
            },

            TodolistsAction::TaskCreated { op, task } => {
                state.app.succeed();
                if let Err(violation) = state.tasks.add_task(task) {
                    Self::report_violation(&violation);
                } else {
                    tracing::debug!(%op, "Task inserted");
                }
                SmallVec::new()
            },

            TodolistsAction::TaskUpdated {
                op,
                todolist_id,
                task_id,
                model,
            } => {
                state.app.succeed();
                match state.tasks.update_task(&todolist_id, &task_id, &model) {
                    Ok(true) => {},
                    Ok(false) => tracing::debug!(%op, %task_id, "Updated task is no longer cached"),
                    Err(violation) => Self::report_violation(&violation),
                }
                SmallVec::new()
            },

            TodolistsAction::TaskDeleted {
                op,
                todolist_id,
                task_id,
            } => {
                state.app.succeed();
                if !state.tasks.remove_task(&todolist_id, &task_id) {
                    tracing::debug!(%op, %task_id, "Deleted task was not cached");
                }
                SmallVec::new()
            },

            TodolistsAction::OperationFailed {
                op,
                operation,
                todolist_id,
                error,
            } => {
                state.app.fail(error.message());
                state.todolists.finish_entity_operation(op);
                tracing::debug!(%op, %operation, ?todolist_id, "Failure recorded");
                SmallVec::new()
            },
        }
    }

    /// Intents fed back by effects (the task fetches that follow a todolist
    /// listing) fail instead of reaching the API once shutdown has begun
    fn during_shutdown(&self, action: Self::Action) -> Option<Self::Action> {
        let Some((op, operation, todolist_id)) = action.intent() else {
            return Some(action);
        };

        Some(dispatcher::failed(
            op,
            operation,
            todolist_id,
            AppError::Application(StoreError::ShutdownInProgress.to_string()),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use crate::mocks::MockTodolistsApi;
    use crate::types::{
        FilterValue, RequestStatus, Task, TaskId, TaskPriority, TaskStatus, Todolist,
        UpdateDomainTaskModel,
    };
    use todosync_testing::{assertions, ReducerTest};

    fn create_test_env() -> TodolistsEnvironment {
        TodolistsEnvironment::new(Arc::new(MockTodolistsApi::new()), TodolistsConfig::default())
    }

    fn todolist(id: &str, title: &str) -> Todolist {
        Todolist {
            id: TodolistId::new(id),
            title: title.to_string(),
            added_date: String::new(),
            order: 0,
        }
    }

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

    fn with_todolist(id: &str) -> AppState {
        let mut state = AppState::new();
        let event = state.todolists.insert_one(todolist(id, "Groceries"));
        coordinator::propagate(&mut state.tasks, &event);
        state
    }

    #[test]
    fn intent_sets_loading_and_returns_future() {
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(AppState::new())
            .when_action(TodolistsAction::CreateTodolist {
                op: OperationId::next(),
                title: "Groceries".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.app.status, RequestStatus::Loading);
                assert!(state.todolists.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn blank_title_fails_without_loading() {
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(AppState::new())
            .when_action(TodolistsAction::CreateTodolist {
                op: OperationId::next(),
                title: "   ".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.app.status, RequestStatus::Idle);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn created_todolist_gets_empty_collection() {
        let op = OperationId::next();
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(AppState::new())
            .when_action(TodolistsAction::TodolistCreated {
                op,
                todolist: todolist("tl-1", "Groceries"),
            })
            .then_state(|state| {
                assert_eq!(state.app.status, RequestStatus::Succeeded);
                assert_eq!(state.todolists.ids(), vec![TodolistId::new("tl-1")]);
                assert_eq!(state.tasks.get(&TodolistId::new("tl-1")).unwrap().len(), 0);
                assert!(state.is_consistent());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn deleted_todolist_drops_its_tasks() {
        let mut state = with_todolist("tl-1");
        state.tasks.add_task(task("t-1", "tl-1")).unwrap();

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .when_action(TodolistsAction::TodolistDeleted {
                op: OperationId::next(),
                id: TodolistId::new("tl-1"),
            })
            .then_state(|state| {
                assert!(state.todolists.is_empty());
                assert!(!state.tasks.has_collection(&TodolistId::new("tl-1")));
                assert!(state.is_consistent());
            })
            .run();
    }

    #[test]
    fn fetched_todolists_schedule_task_fetches() {
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(AppState::new())
            .when_action(TodolistsAction::TodolistsFetched {
                op: OperationId::next(),
                todolists: vec![todolist("a", "Work"), todolist("b", "Home")],
            })
            .then_state(|state| {
                assert_eq!(state.todolists.len(), 2);
                assert!(state.is_consistent());
            })
            .then_effects(|effects| assertions::assert_has_parallel_effect(effects, 2))
            .run();
    }

    #[test]
    fn fetched_todolists_without_task_loading() {
        let env = TodolistsEnvironment::new(
            Arc::new(MockTodolistsApi::new()),
            TodolistsConfig::default().with_fetch_tasks_on_load(false),
        );

        ReducerTest::new(TodolistsReducer::new())
            .with_env(env)
            .given_state(AppState::new())
            .when_action(TodolistsAction::TodolistsFetched {
                op: OperationId::next(),
                todolists: vec![todolist("a", "Work")],
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn refetch_keeps_tasks_of_surviving_todolists() {
        let mut state = with_todolist("a");
        state.tasks.add_task(task("t-1", "a")).unwrap();
        let event = state.todolists.insert_one(todolist("gone", "Old"));
        coordinator::propagate(&mut state.tasks, &event);

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .when_action(TodolistsAction::TodolistsFetched {
                op: OperationId::next(),
                todolists: vec![todolist("a", "Work"), todolist("new", "New")],
            })
            .then_state(|state| {
                assert_eq!(state.tasks.get(&TodolistId::new("a")).unwrap().len(), 1);
                assert!(!state.tasks.has_collection(&TodolistId::new("gone")));
                assert!(state.tasks.has_collection(&TodolistId::new("new")));
                assert!(state.is_consistent());
            })
            .run();
    }

    #[test]
    fn rename_marks_entity_until_failure() {
        let op = OperationId::next();
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(with_todolist("tl-1"))
            .when_action(TodolistsAction::RenameTodolist {
                op,
                id: TodolistId::new("tl-1"),
                title: "Food".to_string(),
            })
            .when_action(TodolistsAction::OperationFailed {
                op,
                operation: Operation::RenameTodolist,
                todolist_id: Some(TodolistId::new("tl-1")),
                error: AppError::Network("offline".to_string()),
            })
            .then_state(|state| {
                let todolist = state.todolists.get(&TodolistId::new("tl-1")).unwrap();
                assert_eq!(todolist.title, "Groceries");
                assert_eq!(todolist.entity_status, RequestStatus::Idle);
                assert_eq!(state.app.status, RequestStatus::Failed);
                assert_eq!(state.app.error.as_deref(), Some("offline"));
            })
            .run();
    }

    #[test]
    fn failed_rename_keeps_entity_loading_while_delete_is_in_flight() {
        let (rename, delete) = (OperationId::next(), OperationId::next());
        let id = TodolistId::new("tl-1");

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(with_todolist("tl-1"))
            .when_action(TodolistsAction::RenameTodolist {
                op: rename,
                id: id.clone(),
                title: "Food".to_string(),
            })
            .when_action(TodolistsAction::DeleteTodolist { op: delete, id: id.clone() })
            .when_action(TodolistsAction::OperationFailed {
                op: rename,
                operation: Operation::RenameTodolist,
                todolist_id: Some(id.clone()),
                error: AppError::Application("Title too long".to_string()),
            })
            .then_state(move |state| {
                let todolist = state.todolists.get(&id).unwrap();
                assert_eq!(todolist.entity_status, RequestStatus::Loading);
                assert_eq!(state.app.status, RequestStatus::Failed);
            })
            .run();
    }

    #[test]
    fn failed_delete_releases_entity_after_rename_confirmed() {
        let (rename, delete) = (OperationId::next(), OperationId::next());
        let id = TodolistId::new("tl-1");

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(with_todolist("tl-1"))
            .when_action(TodolistsAction::RenameTodolist {
                op: rename,
                id: id.clone(),
                title: "Food".to_string(),
            })
            .when_action(TodolistsAction::DeleteTodolist { op: delete, id: id.clone() })
            .when_action(TodolistsAction::TodolistRenamed {
                op: rename,
                id: id.clone(),
                title: "Food".to_string(),
            })
            .when_action(TodolistsAction::OperationFailed {
                op: delete,
                operation: Operation::DeleteTodolist,
                todolist_id: Some(id.clone()),
                error: AppError::Network("offline".to_string()),
            })
            .then_state(move |state| {
                let todolist = state.todolists.get(&id).unwrap();
                assert_eq!(todolist.title, "Food");
                assert_eq!(todolist.entity_status, RequestStatus::Idle);
            })
            .run();
    }

    #[test]
    fn intents_fed_back_during_shutdown_become_failures() {
        let op = OperationId::next();
        let reducer = TodolistsReducer::new();

        let replaced = reducer.during_shutdown(TodolistsAction::FetchTasks {
            op,
            todolist_id: TodolistId::new("tl-1"),
        });

        assert_eq!(
            replaced,
            Some(TodolistsAction::OperationFailed {
                op,
                operation: Operation::FetchTasks,
                todolist_id: Some(TodolistId::new("tl-1")),
                error: AppError::Application("Store is shutting down".to_string()),
            })
        );
    }

    #[test]
    fn results_pass_through_during_shutdown() {
        let result = TodolistsAction::TodolistDeleted {
            op: OperationId::next(),
            id: TodolistId::new("tl-1"),
        };

        assert_eq!(
            TodolistsReducer::new().during_shutdown(result.clone()),
            Some(result)
        );
    }

    #[test]
    fn update_of_uncached_task_fails_without_request() {
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(with_todolist("tl-1"))
            .when_action(TodolistsAction::UpdateTask {
                op: OperationId::next(),
                todolist_id: TodolistId::new("tl-1"),
                task_id: TaskId::new("missing"),
                model: UpdateDomainTaskModel::status(TaskStatus::Completed),
            })
            .then_state(|state| {
                assert_eq!(state.app.status, RequestStatus::Loading);
                assert!(state.tasks.get(&TodolistId::new("tl-1")).unwrap().is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn task_for_unknown_todolist_is_dropped() {
        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(AppState::new())
            .when_action(TodolistsAction::TaskCreated {
                op: OperationId::next(),
                task: task("t-1", "ghost"),
            })
            .then_state(|state| {
                assert!(!state.tasks.has_collection(&TodolistId::new("ghost")));
                assert!(state.is_consistent());
            })
            .run();
    }

    #[test]
    fn filter_and_dismiss_are_local() {
        let mut state = with_todolist("tl-1");
        state.app.fail("boom");

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .when_action(TodolistsAction::ChangeFilter {
                id: TodolistId::new("tl-1"),
                filter: FilterValue::Completed,
            })
            .when_action(TodolistsAction::DismissError)
            .then_state(|state| {
                let todolist = state.todolists.get(&TodolistId::new("tl-1")).unwrap();
                assert_eq!(todolist.filter, FilterValue::Completed);
                assert_eq!(state.app.error, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn clear_data_empties_both_stores() {
        let mut state = with_todolist("tl-1");
        state.tasks.add_task(task("t-1", "tl-1")).unwrap();

        ReducerTest::new(TodolistsReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .when_action(TodolistsAction::ClearData)
            .then_state(|state| {
                assert!(state.todolists.is_empty());
                assert_eq!(state.tasks.keys().count(), 0);
            })
            .run();
    }
}
