//! Service layer. A pass-through over the repositories today, and the place
//! where cross-cutting business rules (permissions, quotas) belong.
//!
//! Storage-specific failures are boxed into [`ServiceError::Unexpected`];
//! callers only branch on [`ServiceError::TaskNotFound`].

use shared::{CreateTaskRequest, MonthlyAnalytics, Task, TaskStatus, UpdateTaskRequest};
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{AnalyticsRepository, RepositoryError, TaskRepository};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("unexpected failure: {0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(id) => Self::TaskNotFound(id),
            RepositoryError::Store(store) => Self::Unexpected(Box::new(store)),
        }
    }
}

#[derive(Clone)]
pub struct TaskService {
    repository: TaskRepository,
}

impl TaskService {
    pub fn new(repository: TaskRepository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, status: Option<TaskStatus>) -> ServiceResult<Vec<Task>> {
        Ok(self.repository.find_many(status).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Option<Task>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn create(&self, input: CreateTaskRequest) -> ServiceResult<Task> {
        Ok(self.repository.create(input).await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateTaskRequest) -> ServiceResult<Task> {
        Ok(self.repository.update(id, input).await?)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Task> {
        Ok(self.repository.delete(id).await?)
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: AnalyticsRepository,
}

impl AnalyticsService {
    pub fn new(repository: AnalyticsRepository) -> Self {
        Self { repository }
    }

    pub async fn monthly(&self) -> ServiceResult<Vec<MonthlyAnalytics>> {
        Ok(self.repository.list_monthly().await?)
    }
}
