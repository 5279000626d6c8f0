//! The entity store behind the repositories.
//!
//! [`TaskStore`] is the narrow query surface the rest of the backend sees:
//! find/create/update/delete for tasks (filter by status, ordered by creation)
//! and read/upsert for monthly analytics. Two implementations ship with the
//! crate: [`RedisStore`] for deployments and [`MemoryStore`] for tests and
//! store-less development.

mod memory;
mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{MonthlyAnalytics, Task, TaskPriority, TaskStatus};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::StoreBackend;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt record {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
    }
}

/// A fully defaulted task awaiting an id and timestamps from the store.
/// Assignment fields are only filled in by the seeder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to_name: Option<String>,
    pub assigned_to_avatar: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub(crate) fn into_task(self, id: Uuid, now: DateTime<Utc>) -> Task {
        Task {
            id,
            name: self.name,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assigned_to_name: self.assigned_to_name,
            assigned_to_avatar: self.assigned_to_avatar,
            due_date: self.due_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to overwrite on an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskChanges {
    pub(crate) fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.updated_at = now;
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks matching `filter`, oldest first.
    async fn find_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn insert_task(&self, draft: TaskDraft) -> StoreResult<Task>;

    /// Returns `None` when no task has this id.
    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    /// Removes the task and returns what was stored, or `None` when absent.
    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn clear_tasks(&self) -> StoreResult<()>;

    /// All analytics rows in no particular order.
    async fn monthly_analytics(&self) -> StoreResult<Vec<MonthlyAnalytics>>;

    /// Inserts or replaces the row for `(month, year)`.
    async fn upsert_monthly_analytics(&self, record: MonthlyAnalytics) -> StoreResult<()>;

    async fn clear_monthly_analytics(&self) -> StoreResult<()>;
}

pub type SharedStore = Arc<dyn TaskStore>;

/// Opens the store selected by configuration. Redis is pinged once so a bad
/// URL fails at startup instead of on the first request.
pub async fn connect(backend: &StoreBackend) -> StoreResult<SharedStore> {
    match backend {
        StoreBackend::Redis { url } => {
            let store = RedisStore::open(url)?;
            store.ping().await?;
            info!(%url, "using redis store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
