//! Demo of the todolists store against the in-memory API.
//!
//! Runs a short session: load, create a todolist with tasks, complete one,
//! hit a rejected operation, then clean up.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use todolists::mocks::{MockFailure, MockTodolistsApi};
use todolists::{
    FilterValue, TaskStatus, TodolistsClient, TodolistsConfig, UpdateDomainTaskModel,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todolists=debug,todosync_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TodolistsConfig::from_env();
    info!(fetch_tasks_on_load = config.fetch_tasks_on_load, "Configuration loaded");

    let api = Arc::new(MockTodolistsApi::new().with_latency(Duration::from_millis(20)));
    let work = api.seed_todolist("Work");
    api.seed_task(&work, "Write report")
        .context("seeded todolist disappeared")?;

    let client = TodolistsClient::new(api.clone(), config);

    let todolists = client.fetch_todolists().await?;
    info!(count = todolists.len(), "Todolists loaded");

    let groceries = client.create_todolist("Groceries").await?;
    let milk = client.create_task(groceries.id.clone(), "Milk").await?;
    client.create_task(groceries.id.clone(), "Bread").await?;

    client
        .update_task(
            groceries.id.clone(),
            milk.id.clone(),
            UpdateDomainTaskModel::status(TaskStatus::Completed),
        )
        .await?;
    client
        .change_filter(groceries.id.clone(), FilterValue::Active)
        .await?;

    for task in client.filtered_tasks(&groceries.id).await {
        info!(title = %task.title, "Still to buy");
    }

    api.fail_next(MockFailure::reject("Title is too long"));
    if let Err(error) = client.create_task(groceries.id.clone(), "Eggs").await {
        warn!(%error, "Task rejected");
    }
    let status = client.status().await;
    info!(status = %status.status, error = ?status.error, "After rejection");
    client.dismiss_error().await?;

    client.delete_todolist(groceries.id.clone()).await?;

    let state = client.snapshot().await;
    info!(
        todolists = state.todolists.len(),
        consistent = state.is_consistent(),
        api_calls = api.total_calls(),
        "Session finished"
    );

    client.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
