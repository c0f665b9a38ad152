//! Candidate pool filtering: activity, verification, duplication, cooldown.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use vitrine_core::{Business, PlacementType};

use crate::error::EngineError;
use crate::store::{BusinessStore, HistoryStore, SpotlightStore};

/// Businesses allowed to compete for the given placement type.
///
/// Applies, in order: the active filter, the verification filter (degraded
/// mode: only enforced once at least one verified business exists, so the
/// feature stays usable on a young directory), exclusion of businesses
/// already holding an active spotlight of this type, and the cooldown
/// window against the history trail.
///
/// Result order is unspecified; callers re-sort by score.
///
/// # Errors
///
/// Propagates [`EngineError::Storage`] from the underlying store.
pub async fn eligible_businesses<S>(
    store: &S,
    placement: PlacementType,
    now: DateTime<Utc>,
) -> Result<Vec<Business>, EngineError>
where
    S: BusinessStore + SpotlightStore + HistoryStore,
{
    let mut pool = store.list_active_businesses().await?;

    if store.has_verified_business().await? {
        pool.retain(|b| b.is_verified);
    }

    let currently_featured: HashSet<i64> = store
        .list_active_spotlights(placement)
        .await?
        .into_iter()
        .filter(|s| s.end_date > now)
        .map(|s| s.business_id)
        .collect();
    pool.retain(|b| !currently_featured.contains(&b.id));

    let since = now - placement.cooldown();
    let cooling_down: HashSet<i64> = store
        .history_ended_since(placement, since)
        .await?
        .into_iter()
        .map(|h| h.business_id)
        .collect();
    pool.retain(|b| !cooling_down.contains(&b.id));

    Ok(pool)
}

/// Time left before a business can hold this placement type again.
///
/// `None` when the business has never been featured for this type or its
/// cooldown has already elapsed.
///
/// # Errors
///
/// Propagates [`EngineError::Storage`] from the underlying store.
pub async fn cooldown_remaining<S>(
    store: &S,
    business_id: i64,
    placement: PlacementType,
    now: DateTime<Utc>,
) -> Result<Option<Duration>, EngineError>
where
    S: HistoryStore,
{
    let Some(last) = store.most_recent_history(business_id, placement).await? else {
        return Ok(None);
    };
    let until = last.end_date + placement.cooldown();
    Ok((until > now).then(|| until - now))
}
