//! Background task that triggers checks on an interval
//!
//! Cadence lives here, not in the checker: the scheduler is just another
//! caller of the trigger adapter. A failed or rejected run is logged and the
//! loop keeps ticking.

use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

use crate::trigger::{CheckTrigger, TriggerError};

/// Periodically run expiration checks until the task is dropped
pub async fn run_check_task(trigger: Arc<CheckTrigger>, interval_seconds: u64) {
    let mut interval = time::interval(Duration::from_secs(interval_seconds));
    // The first tick fires immediately; skip it so startup isn't a check
    interval.tick().await;

    info!(interval_seconds = interval_seconds, "Starting scheduled expiration checks");

    loop {
        interval.tick().await;

        match trigger.trigger().await {
            Ok(report) => {
                info!(
                    expired = report.expired,
                    unexpired = report.unexpired,
                    "Scheduled expiration check completed"
                );
            }
            Err(TriggerError::Busy) => {
                warn!("Skipping scheduled check: previous run still in progress");
            }
            Err(e) => {
                error!(error = %e, "Scheduled expiration check failed");
            }
        }
    }
}
