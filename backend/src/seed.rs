//! Sample data loader. Replaces every task and analytics row in the store.

use chrono::{TimeZone, Utc};
use shared::{MonthlyAnalytics, TaskPriority, TaskStatus};
use tracing::info;

use crate::store::{StoreResult, TaskDraft, TaskStore};

struct SeedTask {
    name: &'static str,
    assignee: &'static str,
    avatar: &'static str,
    due: (i32, u32, u32),
    priority: TaskPriority,
    status: TaskStatus,
}

const fn task(
    name: &'static str,
    assignee: &'static str,
    avatar: &'static str,
    due: (i32, u32, u32),
    priority: TaskPriority,
    status: TaskStatus,
) -> SeedTask {
    SeedTask {
        name,
        assignee,
        avatar,
        due,
        priority,
        status,
    }
}

const ASHLEY: (&str, &str) = ("Ashley Briggs", "/assets/img/avatars/avatar-5.jpg");
const CARL: (&str, &str) = ("Carl Jenkins", "/assets/img/avatars/avatar-2.jpg");
const BERTHA: (&str, &str) = ("Bertha Martin", "/assets/img/avatars/avatar-3.jpg");

const TASKS: &[SeedTask] = &[
    task("Improve email marketing strategy", ASHLEY.0, ASHLEY.1, (2024, 8, 1), TaskPriority::Medium, TaskStatus::Upcoming),
    task("Develop new product video", CARL.0, CARL.1, (2024, 7, 15), TaskPriority::High, TaskStatus::Upcoming),
    task("Conduct user interviews for new feature", BERTHA.0, BERTHA.1, (2024, 6, 20), TaskPriority::Low, TaskStatus::Upcoming),
    task("Implement new analytics tracking", CARL.0, CARL.1, (2024, 7, 1), TaskPriority::Low, TaskStatus::InProgress),
    task("Design new marketing campaign", BERTHA.0, BERTHA.1, (2024, 8, 15), TaskPriority::High, TaskStatus::InProgress),
    task("Conduct A/B testing on landing page", ASHLEY.0, ASHLEY.1, (2024, 6, 30), TaskPriority::Low, TaskStatus::InProgress),
    task("Optimize website performance", BERTHA.0, BERTHA.1, (2024, 6, 15), TaskPriority::Low, TaskStatus::Completed),
    task("Develop mobile app prototype", ASHLEY.0, ASHLEY.1, (2024, 8, 10), TaskPriority::Medium, TaskStatus::Completed),
    task("Conduct user research interviews", ASHLEY.0, ASHLEY.1, (2024, 7, 20), TaskPriority::Low, TaskStatus::Completed),
];

// (month, session duration, page views, total visits), all for 2024.
const ANALYTICS_2024: &[(u8, f64, u64, u64)] = &[
    (1, 10.0, 5000, 2000),
    (2, 11.0, 4550, 2250),
    (3, 9.0, 4980, 2400),
    (4, 10.0, 5520, 2750),
    (5, 12.0, 5100, 2500),
    (6, 11.0, 4750, 2800),
    (7, 13.0, 5300, 3100),
    (8, 12.0, 5900, 3500),
    (9, 10.0, 5200, 3000),
    (10, 11.0, 5800, 3300),
    (11, 13.0, 6200, 3800),
    (12, 12.0, 5600, 3500),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub tasks: usize,
    pub months: usize,
}

pub async fn run(store: &dyn TaskStore) -> StoreResult<SeedSummary> {
    info!("deleting existing tasks");
    store.clear_tasks().await?;

    for seed in TASKS {
        let (year, month, day) = seed.due;
        store
            .insert_task(TaskDraft {
                name: seed.name.to_string(),
                description: None,
                status: seed.status,
                priority: seed.priority,
                assigned_to_name: Some(seed.assignee.to_string()),
                assigned_to_avatar: Some(seed.avatar.to_string()),
                due_date: Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single(),
            })
            .await?;
    }
    info!(count = TASKS.len(), "seed tasks created");

    info!("deleting existing monthly analytics");
    store.clear_monthly_analytics().await?;

    for &(month, session_duration, page_views, total_visits) in ANALYTICS_2024 {
        store
            .upsert_monthly_analytics(MonthlyAnalytics {
                month,
                year: 2024,
                session_duration,
                page_views,
                total_visits,
            })
            .await?;
    }
    info!(months = ANALYTICS_2024.len(), "monthly analytics seeded");

    Ok(SeedSummary {
        tasks: TASKS.len(),
        months: ANALYTICS_2024.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TaskFilter};

    #[tokio::test]
    async fn seeding_replaces_existing_data() {
        let store = MemoryStore::new();
        store
            .insert_task(TaskDraft {
                name: "leftover".to_string(),
                description: None,
                ..TaskDraft::default()
            })
            .await
            .unwrap();

        let summary = run(&store).await.unwrap();
        assert_eq!(summary, SeedSummary { tasks: 9, months: 12 });

        let tasks = store.find_tasks(TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 9);
        assert!(tasks.iter().all(|task| task.name != "leftover"));

        let in_progress = store
            .find_tasks(TaskFilter {
                status: Some(TaskStatus::InProgress),
            })
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 3);
    }

    #[tokio::test]
    async fn seeded_tasks_keep_assignee_and_due_date() {
        let store = MemoryStore::new();
        run(&store).await.unwrap();

        let tasks = store.find_tasks(TaskFilter::default()).await.unwrap();
        let video = tasks
            .iter()
            .find(|task| task.name == "Develop new product video")
            .unwrap();
        assert_eq!(video.assigned_to_name.as_deref(), Some("Carl Jenkins"));
        assert_eq!(
            video.assigned_to_avatar.as_deref(),
            Some("/assets/img/avatars/avatar-2.jpg")
        );
        assert_eq!(video.due_date, Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).single());
        assert_eq!(video.description, None);
        assert!(tasks.iter().all(|task| task.due_date.is_some()));
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_row_per_month() {
        let store = MemoryStore::new();
        run(&store).await.unwrap();
        run(&store).await.unwrap();
        assert_eq!(store.monthly_analytics().await.unwrap().len(), 12);
    }
}
