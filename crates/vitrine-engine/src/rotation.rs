//! Rotation pass orchestration: due checks, guards, selection, archival.
//!
//! One `RotationScheduler` value per process owns all rotation state — the
//! in-flight flag and the last-rotation timestamps — so nothing lives in
//! module-level globals. The guard is process-local; a multi-instance
//! deployment would swap [`RotationGuard::acquire`] for a lease row in the
//! shared store without touching the selection logic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use vitrine_core::PlacementType;

use crate::error::EngineError;
use crate::selection::{self, SelectionResult};
use crate::store::{Clock, Store};

/// Minimum spacing between rotation passes from automatic triggers, to stop
/// a runaway scheduler from issuing rapid repeated ticks.
const AUTO_SPACING_SECS: i64 = 60;
/// Independent, shorter spacing for admin-triggered rotations.
const MANUAL_SPACING_SECS: i64 = 30;

/// What initiated a rotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// A cron-like tick. Subject to the 60-second spacing guard.
    Automatic,
    /// An admin action. Subject only to the 30-second manual cooldown.
    Manual,
}

impl std::fmt::Display for RotationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationTrigger::Automatic => f.write_str("automatic"),
            RotationTrigger::Manual => f.write_str("manual"),
        }
    }
}

/// Why a rotation pass did not run. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another pass holds the in-process guard.
    AlreadyRunning,
    /// The previous pass ran less than the trigger's spacing ago.
    TooSoon { retry_after_secs: i64 },
}

/// Result of one `rotate` call.
#[derive(Debug)]
pub enum RotationOutcome {
    Completed(RotationReport),
    Skipped(SkipReason),
}

/// What a completed pass did, per placement type.
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Expired placements archived at the start of the pass.
    pub archived: u64,
    pub rotated: Vec<SelectionResult>,
    pub not_due: Vec<PlacementType>,
    /// Types whose rotation failed; the rest of the pass still ran.
    pub failed: Vec<(PlacementType, EngineError)>,
}

/// Decision surface for the admin "rotate now" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRotationGate {
    pub allowed: bool,
    pub reason: Option<String>,
}

pub struct RotationScheduler<S, C> {
    store: S,
    clock: C,
    rotation_in_progress: AtomicBool,
    last_rotation: Mutex<Option<DateTime<Utc>>>,
    last_manual_rotation: Mutex<Option<DateTime<Utc>>>,
}

impl<S: Store, C: Clock> RotationScheduler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            rotation_in_progress: AtomicBool::new(false),
            last_rotation: Mutex::new(None),
            last_manual_rotation: Mutex::new(None),
        }
    }

    /// Run one rotation pass: archive expired placements, then select new
    /// ones for every placement type that is due.
    ///
    /// Idempotent and safe to call repeatedly — overlapping calls and calls
    /// inside the spacing window return [`RotationOutcome::Skipped`] without
    /// touching storage. A failing type is reported and the pass continues
    /// with the remaining types; the guard is released on every path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] only when the archival step itself
    /// fails; per-type failures are collected in the report instead.
    pub async fn rotate(&self, trigger: RotationTrigger) -> Result<RotationOutcome, EngineError> {
        let Some(_guard) = RotationGuard::acquire(&self.rotation_in_progress) else {
            tracing::info!(%trigger, "rotation: pass already in flight; skipping");
            return Ok(RotationOutcome::Skipped(SkipReason::AlreadyRunning));
        };

        let now = self.clock.now();
        if let Some(skip) = self.spacing_check(trigger, now) {
            tracing::info!(%trigger, ?skip, "rotation: within minimum spacing; skipping");
            return Ok(RotationOutcome::Skipped(skip));
        }
        self.stamp_rotation(trigger, now);

        // Expired placements come off the board before selection so the
        // per-type active-slot limits hold while new rows are committed,
        // and archival runs on every guarded pass.
        let archived = self.store.deactivate_expired(now).await?;
        if archived > 0 {
            tracing::info!(archived, "rotation: archived expired placements");
        }

        let mut report = RotationReport {
            archived,
            ..RotationReport::default()
        };

        for placement in PlacementType::ALL {
            let due = match self.should_rotate(placement, now).await {
                Ok(due) => due,
                Err(e) => {
                    tracing::error!(%placement, error = %e, "rotation: due check failed");
                    report.failed.push((placement, e));
                    continue;
                }
            };
            if !due {
                report.not_due.push(placement);
                continue;
            }
            match self.replace_placement(placement, now).await {
                Ok(result) => {
                    tracing::info!(
                        %placement,
                        committed = result.committed.len(),
                        "rotation: placement rotated"
                    );
                    report.rotated.push(result);
                }
                Err(e) => {
                    tracing::error!(%placement, error = %e, "rotation: placement rotation failed");
                    report.failed.push((placement, e));
                }
            }
        }

        Ok(RotationOutcome::Completed(report))
    }

    /// Plan a due type's replacement batch, retire the outgoing one, then
    /// commit. Planning is read-only, so a failed or empty selection never
    /// clears the board; retirement lands between plan and commit so the
    /// per-type slot limits hold while the new rows are written.
    async fn replace_placement(
        &self,
        placement: PlacementType,
        now: DateTime<Utc>,
    ) -> Result<SelectionResult, EngineError> {
        let plan = selection::plan_selection(&self.store, placement, now).await?;

        if !plan.is_empty() {
            let retired = self.store.deactivate_active(placement).await?;
            if retired > 0 {
                tracing::info!(%placement, retired, "rotation: retired outgoing placements");
            }
        }

        selection::commit_plan(&self.store, plan, now).await
    }

    /// Whether a placement type is due for rotation at `now`.
    ///
    /// Due when the most recent spotlight of the type was created longer ago
    /// than the type's soft interval, or when no spotlight exists yet.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the latest-spotlight lookup.
    pub async fn should_rotate(
        &self,
        placement: PlacementType,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let Some(latest) = self.store.latest_spotlight(placement).await? else {
            return Ok(true);
        };
        Ok(now - latest.created_at > placement.due_interval())
    }

    /// Whether an admin-triggered rotation would run right now, with the
    /// reason when it would not.
    pub fn can_rotate_manually(&self) -> ManualRotationGate {
        if self.rotation_in_progress.load(Ordering::SeqCst) {
            return ManualRotationGate {
                allowed: false,
                reason: Some("a rotation pass is already running".to_string()),
            };
        }

        let now = self.clock.now();
        let last_manual = *lock_unpoisoned(&self.last_manual_rotation);
        if let Some(remaining) = spacing_remaining(last_manual, now, MANUAL_SPACING_SECS) {
            return ManualRotationGate {
                allowed: false,
                reason: Some(format!("manual rotation available in {remaining}s")),
            };
        }

        ManualRotationGate {
            allowed: true,
            reason: None,
        }
    }

    fn spacing_check(&self, trigger: RotationTrigger, now: DateTime<Utc>) -> Option<SkipReason> {
        let (last, spacing) = match trigger {
            RotationTrigger::Automatic => {
                (*lock_unpoisoned(&self.last_rotation), AUTO_SPACING_SECS)
            }
            RotationTrigger::Manual => (
                *lock_unpoisoned(&self.last_manual_rotation),
                MANUAL_SPACING_SECS,
            ),
        };
        spacing_remaining(last, now, spacing)
            .map(|retry_after_secs| SkipReason::TooSoon { retry_after_secs })
    }

    fn stamp_rotation(&self, trigger: RotationTrigger, now: DateTime<Utc>) {
        *lock_unpoisoned(&self.last_rotation) = Some(now);
        if trigger == RotationTrigger::Manual {
            *lock_unpoisoned(&self.last_manual_rotation) = Some(now);
        }
    }
}

/// Seconds until `spacing_secs` have elapsed since `last`, if they have not.
fn spacing_remaining(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    spacing_secs: i64,
) -> Option<i64> {
    let last = last?;
    let elapsed = (now - last).num_seconds();
    (elapsed < spacing_secs).then(|| spacing_secs - elapsed)
}

/// RAII guard over the in-flight flag; releases unconditionally on drop, so
/// an early return or error cannot leave the scheduler wedged.
struct RotationGuard<'a>(&'a AtomicBool);

impl<'a> RotationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| Self(flag))
    }
}

impl Drop for RotationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
