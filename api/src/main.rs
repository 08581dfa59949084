use anyhow::Result;
use api::scheduler::start_refresh_scheduler;
use api::{app_router, init_tracing, AppState};
use shared::Config;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Trading Competition API server...");

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let refresh_interval = config.refresh_interval_secs;

    let state = AppState::new(config).await?;

    if let Some(secs) = refresh_interval {
        start_refresh_scheduler(state.refresh.clone(), Duration::from_secs(secs));
    }

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
