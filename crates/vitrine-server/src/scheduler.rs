//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring rotation tick. The tick itself is cheap: the engine's own
//! guards decide whether anything actually rotates.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use vitrine_db::PgStore;
use vitrine_engine::{RotationOutcome, RotationScheduler, RotationTrigger, SystemClock};

type Rotation = RotationScheduler<PgStore, SystemClock>;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    rotation: Arc<Rotation>,
    tick_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_rotation_tick(&scheduler, rotation, tick_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring rotation tick.
///
/// Runs every five minutes by default (`0 */5 * * * *`, overridable with
/// `VITRINE_ROTATION_TICK_CRON`). Each tick asks the engine to rotate; the
/// engine skips itself when nothing is due or a pass is already running.
async fn register_rotation_tick(
    scheduler: &JobScheduler,
    rotation: Arc<Rotation>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let rotation = Arc::clone(&rotation);
        Box::pin(async move {
            run_rotation_tick(&rotation).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered rotation tick job");
    Ok(())
}

/// Drive one rotation tick and log what it did.
///
/// All failures are logged rather than propagated; the next tick re-attempts
/// anything still due.
async fn run_rotation_tick(rotation: &Rotation) {
    match rotation.rotate(RotationTrigger::Automatic).await {
        Ok(RotationOutcome::Completed(report)) => {
            if report.rotated.is_empty() && report.failed.is_empty() {
                tracing::debug!(
                    archived = report.archived,
                    "scheduler: rotation tick: nothing due"
                );
                return;
            }
            for result in &report.rotated {
                tracing::info!(
                    placement = %result.placement,
                    committed = result.committed.len(),
                    "scheduler: rotation tick: placement rotated"
                );
            }
            for (placement, error) in &report.failed {
                tracing::error!(
                    placement = %placement,
                    error = %error,
                    "scheduler: rotation tick: placement rotation failed"
                );
            }
        }
        Ok(RotationOutcome::Skipped(reason)) => {
            tracing::info!(?reason, "scheduler: rotation tick skipped");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: rotation tick failed");
        }
    }
}
