//! In-process timer that runs the balance refresh on a fixed interval.

use shared::{BalanceRefreshService, RefreshError, RefreshTrigger};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{debug, info, warn};

/// Starts the refresh loop. The first run happens one full interval after startup.
pub fn start_refresh_scheduler(refresh: Arc<BalanceRefreshService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Balance refresh scheduler started ({}s interval)", every.as_secs());
        let mut ticker = interval_at(Instant::now() + every, every);

        loop {
            ticker.tick().await;
            run_scheduled_refresh(&refresh).await;
        }
    })
}

async fn run_scheduled_refresh(refresh: &BalanceRefreshService) {
    match refresh.run(RefreshTrigger::Scheduler).await {
        Ok(summary) => info!(
            "Scheduled balance refresh: {} updated, {} failed, {} total",
            summary.updated, summary.failed, summary.total
        ),
        Err(RefreshError::AlreadyRunning) => {
            debug!("Scheduled balance refresh skipped: another run is in progress")
        }
        Err(e) => warn!("Scheduled balance refresh failed: {}", e),
    }
}
