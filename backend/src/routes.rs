use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::{
    create_task, delete_task, get_task, health, list_tasks, monthly_analytics, update_task,
};
use crate::state::AppState;
use crate::validation::{validate, CREATE_TASK, TASK_ID, UPDATE_TASK};

/// API routes without transport layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/exercises/tasks",
            get(list_tasks)
                .merge(post(create_task).route_layer(from_fn_with_state(CREATE_TASK, validate))),
        )
        .route(
            "/api/exercises/tasks/:id",
            get(get_task)
                .route_layer(from_fn_with_state(TASK_ID, validate))
                .merge(put(update_task).route_layer(from_fn_with_state(UPDATE_TASK, validate)))
                .merge(delete(delete_task).route_layer(from_fn_with_state(TASK_ID, validate))),
        )
        .route("/api/analytics/monthly", get(monthly_analytics))
        .route("/health", get(health))
        .with_state(state)
}

/// The full application: API routes, optional static frontend, CORS and
/// request tracing.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = router(state);
    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.frontend_origins)),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
