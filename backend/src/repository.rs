//! Translates task and analytics operations into store queries.
//!
//! Repositories own no business rules. They fill creation defaults, turn a
//! missing record on update/delete into [`RepositoryError::NotFound`], and
//! guarantee ordering of analytics rows regardless of the store behind them.

use shared::{CreateTaskRequest, MonthlyAnalytics, Task, TaskStatus, UpdateTaskRequest};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{SharedStore, StoreError, TaskChanges, TaskDraft, TaskFilter};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("task not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TaskRepository {
    store: SharedStore,
}

impl TaskRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn find_many(&self, status: Option<TaskStatus>) -> RepositoryResult<Vec<Task>> {
        Ok(self.store.find_tasks(TaskFilter { status }).await?)
    }

    /// Absence is a normal result here, not an error.
    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Task>> {
        Ok(self.store.find_task(id).await?)
    }

    pub async fn create(&self, input: CreateTaskRequest) -> RepositoryResult<Task> {
        let draft = TaskDraft {
            name: input.name,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            ..TaskDraft::default()
        };
        Ok(self.store.insert_task(draft).await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateTaskRequest) -> RepositoryResult<Task> {
        let changes = TaskChanges {
            name: input.name,
            description: input.description,
            status: input.status,
            priority: input.priority,
        };
        self.store
            .update_task(id, changes)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    pub async fn delete(&self, id: Uuid) -> RepositoryResult<Task> {
        self.store
            .delete_task(id)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    store: SharedStore,
}

impl AnalyticsRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Rows sorted by `(year, month)` ascending.
    pub async fn list_monthly(&self) -> RepositoryResult<Vec<MonthlyAnalytics>> {
        let mut rows = self.store.monthly_analytics().await?;
        rows.sort_by_key(MonthlyAnalytics::period);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{MemoryStore, TaskStore};
    use rstest::{fixture, rstest};
    use shared::TaskPriority;

    #[fixture]
    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    fn tasks(store: &Arc<MemoryStore>) -> TaskRepository {
        TaskRepository::new(store.clone())
    }

    fn named(name: &str, status: Option<TaskStatus>) -> CreateTaskRequest {
        CreateTaskRequest {
            status,
            ..CreateTaskRequest::new(name)
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_fills_defaults(store: Arc<MemoryStore>) {
        let repository = tasks(&store);
        let input = CreateTaskRequest {
            description: Some("details".to_string()),
            ..CreateTaskRequest::new("Plan sprint")
        };

        let created = repository.create(input).await.unwrap();
        let fetched = repository.find_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Plan sprint");
        assert_eq!(fetched.description.as_deref(), Some("details"));
        assert_eq!(fetched.status, TaskStatus::Upcoming);
        assert_eq!(fetched.priority, TaskPriority::Medium);
    }

    #[rstest]
    #[tokio::test]
    async fn find_by_id_absent_is_none(store: Arc<MemoryStore>) {
        assert!(tasks(&store)
            .find_by_id(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn find_many_filters_and_keeps_creation_order(store: Arc<MemoryStore>) {
        let repository = tasks(&store);
        let first = repository
            .create(named("first", Some(TaskStatus::Completed)))
            .await
            .unwrap();
        repository
            .create(named("second", Some(TaskStatus::InProgress)))
            .await
            .unwrap();
        let third = repository
            .create(named("third", Some(TaskStatus::Completed)))
            .await
            .unwrap();

        let completed = repository
            .find_many(Some(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(
            completed.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![first.id, third.id]
        );

        let all = repository.find_many(None).await.unwrap();
        assert_eq!(
            all.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn update_merges_supplied_fields(store: Arc<MemoryStore>) {
        let repository = tasks(&store);
        let created = repository
            .create(CreateTaskRequest {
                description: Some("keep me".to_string()),
                ..CreateTaskRequest::new("draft")
            })
            .await
            .unwrap();

        let updated = repository
            .update(created.id, UpdateTaskRequest::status(TaskStatus::InProgress))
            .await
            .unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.name, "draft");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
    }

    #[rstest]
    #[tokio::test]
    async fn update_and_delete_of_unknown_id_are_not_found(store: Arc<MemoryStore>) {
        let repository = tasks(&store);
        let id = Uuid::new_v4();

        let update = repository
            .update(id, UpdateTaskRequest::status(TaskStatus::Completed))
            .await;
        assert!(matches!(update, Err(RepositoryError::NotFound(missing)) if missing == id));

        let delete = repository.delete(id).await;
        assert!(matches!(delete, Err(RepositoryError::NotFound(missing)) if missing == id));
    }

    #[rstest]
    #[tokio::test]
    async fn second_delete_is_not_found(store: Arc<MemoryStore>) {
        let repository = tasks(&store);
        let created = repository.create(named("once", None)).await.unwrap();

        let removed = repository.delete(created.id).await.unwrap();
        assert_eq!(removed, created);
        assert!(matches!(
            repository.delete(created.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn monthly_analytics_sorted_by_year_then_month(store: Arc<MemoryStore>) {
        for (month, year) in [(2, 2025), (11, 2024), (1, 2025), (3, 2024)] {
            store
                .upsert_monthly_analytics(MonthlyAnalytics {
                    month,
                    year,
                    session_duration: 10.0,
                    page_views: 100,
                    total_visits: 50,
                })
                .await
                .unwrap();
        }

        let rows = AnalyticsRepository::new(store.clone())
            .list_monthly()
            .await
            .unwrap();

        let periods: Vec<_> = rows.iter().map(MonthlyAnalytics::period).collect();
        assert_eq!(periods, vec![(2024, 3), (2024, 11), (2025, 1), (2025, 2)]);
    }
}
