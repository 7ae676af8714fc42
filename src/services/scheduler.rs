use log::{error, info, warn};
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::config::settings::SchedulerSettings;
use crate::errors::RecomputeError;
use crate::services::recompute::RecomputeOrchestrator;

/// Periodically recomputes every analysis. Runs until the task is dropped.
///
/// A tick that finds a run already in flight is skipped.
pub async fn run_scheduler(orchestrator: Arc<RecomputeOrchestrator>, settings: SchedulerSettings) {
    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Analysis scheduler started, every {:?}", settings.interval);

    loop {
        ticker.tick().await;

        let guard = match orchestrator.begin() {
            Ok(guard) => guard,
            Err(RecomputeError::AlreadyRunning) => {
                warn!("Scheduled recompute skipped: a run is already in progress");
                continue;
            }
            Err(e) => {
                error!("Scheduled recompute could not start: {:?}", e);
                continue;
            }
        };

        let worker = Arc::clone(&orchestrator);
        match tokio::task::spawn_blocking(move || worker.run(guard)).await {
            Ok(Ok(summary)) => info!("Scheduled recompute finished: {:?}", summary),
            Ok(Err(e)) => error!("Scheduled recompute failed: {:?}", e),
            Err(e) => error!("Scheduled recompute panicked: {:?}", e),
        }
    }
}
