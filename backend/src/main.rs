use std::error::Error;

use backend::{app, store, telemetry, AppConfig, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init("info,backend=debug,tower_http=debug");

    let config = AppConfig::from_env().inspect_err(|err| error!(%err, "bad configuration"))?;
    let store = store::connect(&config.store)
        .await
        .inspect_err(|err| error!(%err, "store unavailable"))?;

    let router = app(AppState::new(store), &config);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");
    info!("  GET    /api/exercises/tasks?status=");
    info!("  GET    /api/exercises/tasks/:id");
    info!("  POST   /api/exercises/tasks");
    info!("  PUT    /api/exercises/tasks/:id");
    info!("  DELETE /api/exercises/tasks/:id");
    info!("  GET    /api/analytics/monthly");
    info!("  GET    /health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
