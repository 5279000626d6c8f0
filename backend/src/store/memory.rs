use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared::{MonthlyAnalytics, Task};
use uuid::Uuid;

use super::{StoreResult, TaskChanges, TaskDraft, TaskFilter, TaskStore};

/// Process-local store. Tasks are kept in insertion order, which is also
/// creation order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    analytics: BTreeMap<(u8, i32), MonthlyAnalytics>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .read()
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read().tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn insert_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        let task = draft.into_task(Uuid::new_v4(), Utc::now());
        self.write().tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut state = self.write();
        let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        changes.apply(task, Utc::now());
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut state = self.write();
        let position = state.tasks.iter().position(|task| task.id == id);
        Ok(position.map(|index| state.tasks.remove(index)))
    }

    async fn clear_tasks(&self) -> StoreResult<()> {
        self.write().tasks.clear();
        Ok(())
    }

    async fn monthly_analytics(&self) -> StoreResult<Vec<MonthlyAnalytics>> {
        Ok(self.read().analytics.values().cloned().collect())
    }

    async fn upsert_monthly_analytics(&self, record: MonthlyAnalytics) -> StoreResult<()> {
        self.write()
            .analytics
            .insert((record.month, record.year), record);
        Ok(())
    }

    async fn clear_monthly_analytics(&self) -> StoreResult<()> {
        self.write().analytics.clear();
        Ok(())
    }
}
