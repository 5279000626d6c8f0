use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use backend::store::{
    MemoryStore, StoreError, StoreResult, TaskChanges, TaskDraft, TaskFilter, TaskStore,
};
use backend::{router, AppState};
use http_body_util::BodyExt;
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use shared::{MonthlyAnalytics, Task, TaskStatus};
use tower::ServiceExt;
use uuid::Uuid;

const TASKS: &str = "/api/exercises/tasks";

struct TestApp {
    store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn create(&self, body: Value) -> Task {
        let (status, body) = self.json("POST", TASKS, body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body).unwrap()
    }
}

#[fixture]
fn app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let router = router(AppState::new(store.clone()));
    TestApp { store, router }
}

#[rstest]
#[tokio::test]
async fn health_reports_up(app: TestApp) {
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "UP"}));
}

#[rstest]
#[tokio::test]
async fn create_then_get_applies_defaults(app: TestApp) {
    let created = app
        .create(json!({"name": "Write release notes", "description": "for v2"}))
        .await;
    assert_eq!(created.status, TaskStatus::Upcoming);

    let (status, body) = app.get(&format!("{TASKS}/{}", created.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Write release notes");
    assert_eq!(body["description"], "for v2");
    assert_eq!(body["status"], "UPCOMING");
    assert_eq!(body["priority"], "MEDIUM");
}

#[rstest]
#[tokio::test]
async fn create_stores_sanitized_values(app: TestApp) {
    let created = app
        .create(json!({"name": "  <script>x</script>  ", "priority": "HIGH"}))
        .await;
    assert_eq!(created.name, "&lt;script&gt;x&lt;&#x2F;script&gt;");
    assert_eq!(created.priority.as_str(), "HIGH");
}

#[rstest]
#[tokio::test]
async fn create_without_content_type_still_reaches_handler(app: TestApp) {
    let request = Request::post(TASKS)
        .body(Body::from(r#"{"name":"x"}"#))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["name"], "x");
}

#[rstest]
#[tokio::test]
async fn update_with_text_content_type_still_reaches_handler(app: TestApp) {
    let created = app.create(json!({"name": "plain"})).await;
    let request = Request::put(format!("{TASKS}/{}", created.id))
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"status":"COMPLETED"}"#))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "COMPLETED");
}

#[rstest]
#[tokio::test]
async fn create_with_failing_rules_is_422_and_stores_nothing(app: TestApp) {
    let (status, body) = app
        .json("POST", TASKS, json!({"status": "DONE", "priority": "URGENT"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"errors": [
            {"name": "Task name is required"},
            {"status": "Invalid task status"},
            {"priority": "Invalid task priority"}
        ]})
    );
    assert!(app
        .store
        .find_tasks(TaskFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[rstest]
#[tokio::test]
async fn non_object_body_is_a_general_error(app: TestApp) {
    let (status, body) = app.json("POST", TASKS, json!(["name"])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"errors": [{"general": "Request body must be a JSON object"}]})
    );
}

#[rstest]
#[tokio::test]
async fn list_filters_by_status_in_creation_order(app: TestApp) {
    let a = app.create(json!({"name": "a", "status": "COMPLETED"})).await;
    app.create(json!({"name": "b"})).await;
    let c = app.create(json!({"name": "c", "status": "COMPLETED"})).await;

    let (status, body) = app.get(&format!("{TASKS}?status=COMPLETED")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<Uuid> = serde_json::from_value::<Vec<Task>>(body)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(ids, vec![a.id, c.id]);

    let (_, all) = app.get(TASKS).await;
    let names: Vec<String> = serde_json::from_value::<Vec<Task>>(all)
        .unwrap()
        .into_iter()
        .map(|task| task.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[rstest]
#[tokio::test]
async fn unknown_status_filter_is_ignored(app: TestApp) {
    app.create(json!({"name": "one"})).await;
    app.create(json!({"name": "two", "status": "IN_PROGRESS"})).await;

    let unfiltered = app.get(TASKS).await;
    let bogus = app.get(&format!("{TASKS}?status=bogus")).await;

    assert_eq!(bogus.0, StatusCode::OK);
    assert_eq!(bogus, unfiltered);
}

#[rstest]
#[tokio::test]
async fn get_unknown_id_is_404(app: TestApp) {
    let (status, body) = app.get(&format!("{TASKS}/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Task not found"}));
}

#[rstest]
#[case("GET")]
#[case("DELETE")]
#[tokio::test]
async fn malformed_id_is_422(app: TestApp, #[case] method: &str) {
    let request = Request::builder()
        .method(method)
        .uri(format!("{TASKS}/not-a-uuid"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"errors": [{"id": "Invalid task ID format"}]}));
}

#[rstest]
#[tokio::test]
async fn put_reports_id_and_body_errors_together(app: TestApp) {
    let (status, body) = app
        .json("PUT", &format!("{TASKS}/123"), json!({"name": ""}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"errors": [
            {"id": "Invalid task ID format"},
            {"name": "Task name cannot be empty"}
        ]})
    );
}

#[rstest]
#[tokio::test]
async fn put_merges_only_supplied_fields(app: TestApp) {
    let created = app
        .create(json!({"name": "draft", "description": "keep", "priority": "LOW"}))
        .await;

    let (status, body) = app
        .json(
            "PUT",
            &format!("{TASKS}/{}", created.id),
            json!({"status": "IN_PROGRESS"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let updated: Task = serde_json::from_value(body).unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.name, "draft");
    assert_eq!(updated.description.as_deref(), Some("keep"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[rstest]
#[tokio::test]
async fn put_with_empty_description_clears_it(app: TestApp) {
    let created = app
        .create(json!({"name": "n", "description": "old"}))
        .await;
    let (status, body) = app
        .json(
            "PUT",
            &format!("{TASKS}/{}", created.id),
            json!({"description": ""}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "");
}

#[rstest]
#[tokio::test]
async fn put_with_empty_body_is_400_and_leaves_task_alone(app: TestApp) {
    let created = app.create(json!({"name": "untouched"})).await;

    let (status, body) = app
        .json("PUT", &format!("{TASKS}/{}", created.id), json!({}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No update data provided"}));
    let stored = app.store.find_task(created.id).await.unwrap().unwrap();
    assert_eq!(stored, created);
}

#[rstest]
#[tokio::test]
async fn put_unknown_id_is_404(app: TestApp) {
    let (status, body) = app
        .json(
            "PUT",
            &format!("{TASKS}/{}", Uuid::new_v4()),
            json!({"name": "ghost"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Task not found"}));
}

#[rstest]
#[tokio::test]
async fn delete_is_204_then_404(app: TestApp) {
    let created = app.create(json!({"name": "short-lived"})).await;
    let uri = format!("{TASKS}/{}", created.id);

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Task not found"}));
}

#[rstest]
#[tokio::test]
async fn monthly_analytics_sorted_regardless_of_insertion(app: TestApp) {
    for (month, year) in [(12, 2024), (1, 2025), (6, 2024)] {
        app.store
            .upsert_monthly_analytics(MonthlyAnalytics {
                month,
                year,
                session_duration: 11.5,
                page_views: 4000,
                total_visits: 1800,
            })
            .await
            .unwrap();
    }

    let (status, body) = app.get("/api/analytics/monthly").await;
    assert_eq!(status, StatusCode::OK);
    let periods: Vec<(i64, i64)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| (row["year"].as_i64().unwrap(), row["month"].as_i64().unwrap()))
        .collect();
    assert_eq!(periods, vec![(2024, 6), (2024, 12), (2025, 1)]);
    assert_eq!(body[0]["pageViews"], 4000);
    assert_eq!(body[0]["sessionDuration"], 11.5);
}

/// A store whose backend is always down.
struct UnavailableStore;

fn down() -> StoreError {
    StoreError::from(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl TaskStore for UnavailableStore {
    async fn find_tasks(&self, _: TaskFilter) -> StoreResult<Vec<Task>> {
        Err(down())
    }
    async fn find_task(&self, _: Uuid) -> StoreResult<Option<Task>> {
        Err(down())
    }
    async fn insert_task(&self, _: TaskDraft) -> StoreResult<Task> {
        Err(down())
    }
    async fn update_task(&self, _: Uuid, _: TaskChanges) -> StoreResult<Option<Task>> {
        Err(down())
    }
    async fn delete_task(&self, _: Uuid) -> StoreResult<Option<Task>> {
        Err(down())
    }
    async fn clear_tasks(&self) -> StoreResult<()> {
        Err(down())
    }
    async fn monthly_analytics(&self) -> StoreResult<Vec<MonthlyAnalytics>> {
        Err(down())
    }
    async fn upsert_monthly_analytics(&self, _: MonthlyAnalytics) -> StoreResult<()> {
        Err(down())
    }
    async fn clear_monthly_analytics(&self) -> StoreResult<()> {
        Err(down())
    }
}

async fn send_to_unavailable(request: Request<Body>) -> (StatusCode, Value) {
    let response = router(AppState::new(Arc::new(UnavailableStore)))
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn store_failure_on_list_is_500_with_message_and_error() {
    let (status, body) =
        send_to_unavailable(Request::get(TASKS).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn store_failure_on_delete_is_not_mistaken_for_404() {
    let uri = format!("{TASKS}/{}", Uuid::new_v4());
    let (status, _) = send_to_unavailable(Request::delete(uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn analytics_failure_has_its_own_message() {
    let (status, body) = send_to_unavailable(
        Request::get("/api/analytics/monthly")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error fetching monthly analytics");
    assert!(body["error"].is_string());
}
