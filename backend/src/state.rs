use crate::repository::{AnalyticsRepository, TaskRepository};
use crate::service::{AnalyticsService, TaskService};
use crate::store::SharedStore;

/// Handler state. Cloned per request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub analytics: AnalyticsService,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            tasks: TaskService::new(TaskRepository::new(store.clone())),
            analytics: AnalyticsService::new(AnalyticsRepository::new(store)),
        }
    }
}
