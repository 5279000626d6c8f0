use std::error::Error;

use backend::{seed, store, telemetry, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init("info");

    let config = AppConfig::from_env()?;
    let store = store::connect(&config.store).await?;

    info!("start seeding");
    let summary = seed::run(store.as_ref()).await?;
    info!(tasks = summary.tasks, months = summary.months, "seeding finished");
    Ok(())
}
