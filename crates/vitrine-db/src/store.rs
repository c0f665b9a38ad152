//! Postgres implementation of the engine's store traits.
//!
//! Thin delegation onto the per-table query modules, translating [`DbError`]
//! into the engine's error taxonomy at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vitrine_core::{
    Business, EngagementMetrics, NewSpotlight, NewVote, PlacementType, Spotlight,
    SpotlightHistory, SpotlightVote,
};
use vitrine_engine::{
    BusinessStore, EngineError, HistoryStore, MetricsStore, SpotlightStore, VoteCount, VoteStore,
};

use crate::{
    businesses, engagement_metrics, spotlight_history, spotlight_votes, spotlights, DbError,
};

/// Engine store backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn storage(e: DbError) -> EngineError {
    EngineError::storage(e)
}

#[async_trait]
impl BusinessStore for PgStore {
    async fn business(&self, id: i64) -> Result<Business, EngineError> {
        match businesses::get_business(&self.pool, id).await {
            Ok(row) => Ok(row.into()),
            Err(DbError::NotFound) => Err(EngineError::BusinessNotFound(id)),
            Err(e) => Err(storage(e)),
        }
    }

    async fn list_active_businesses(&self) -> Result<Vec<Business>, EngineError> {
        let rows = businesses::list_active_businesses(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Business::from).collect())
    }

    async fn has_verified_business(&self) -> Result<bool, EngineError> {
        businesses::has_verified_business(&self.pool)
            .await
            .map_err(storage)
    }
}

#[async_trait]
impl MetricsStore for PgStore {
    async fn engagement_metrics(
        &self,
        business_id: i64,
    ) -> Result<Option<EngagementMetrics>, EngineError> {
        let row = engagement_metrics::get_engagement_metrics(&self.pool, business_id)
            .await
            .map_err(storage)?;
        Ok(row.map(EngagementMetrics::from))
    }
}

#[async_trait]
impl SpotlightStore for PgStore {
    async fn list_active_spotlights(
        &self,
        placement: PlacementType,
    ) -> Result<Vec<Spotlight>, EngineError> {
        let rows = spotlights::list_active_spotlights(&self.pool, placement)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| Spotlight::try_from(row).map_err(storage))
            .collect()
    }

    async fn latest_spotlight(
        &self,
        placement: PlacementType,
    ) -> Result<Option<Spotlight>, EngineError> {
        let row = spotlights::latest_spotlight(&self.pool, placement)
            .await
            .map_err(storage)?;
        row.map(|r| Spotlight::try_from(r).map_err(storage))
            .transpose()
    }

    async fn commit_placement(&self, new: NewSpotlight) -> Result<Spotlight, EngineError> {
        match spotlights::commit_placement(&self.pool, &new).await {
            Ok(row) => Spotlight::try_from(row).map_err(storage),
            Err(DbError::NotFound) => Err(EngineError::BusinessNotFound(new.business_id)),
            Err(e) => Err(storage(e)),
        }
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, EngineError> {
        spotlights::deactivate_expired_spotlights(&self.pool, now)
            .await
            .map_err(storage)
    }

    async fn deactivate_active(&self, placement: PlacementType) -> Result<u64, EngineError> {
        spotlights::deactivate_active_spotlights(&self.pool, placement)
            .await
            .map_err(storage)
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn most_recent_history(
        &self,
        business_id: i64,
        placement: PlacementType,
    ) -> Result<Option<SpotlightHistory>, EngineError> {
        let row = spotlight_history::most_recent_history(&self.pool, business_id, placement)
            .await
            .map_err(storage)?;
        row.map(|r| SpotlightHistory::try_from(r).map_err(storage))
            .transpose()
    }

    async fn history_ended_since(
        &self,
        placement: PlacementType,
        since: DateTime<Utc>,
    ) -> Result<Vec<SpotlightHistory>, EngineError> {
        let rows = spotlight_history::history_ended_since(&self.pool, placement, since)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| SpotlightHistory::try_from(row).map_err(storage))
            .collect()
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn insert_vote(&self, vote: NewVote) -> Result<SpotlightVote, EngineError> {
        match spotlight_votes::insert_spotlight_vote(&self.pool, &vote).await {
            Ok(row) => Ok(row.into()),
            Err(DbError::DuplicateVote) => Err(EngineError::DuplicateVote {
                user_id: vote.user_id,
                month: vote.month,
            }),
            Err(e) => Err(storage(e)),
        }
    }

    async fn vote_counts_for_month(&self, month: &str) -> Result<Vec<VoteCount>, EngineError> {
        let rows = spotlight_votes::vote_counts_for_month(&self.pool, month)
            .await
            .map_err(storage)?;
        Ok(rows
            .into_iter()
            .map(|(business_id, votes)| VoteCount { business_id, votes })
            .collect())
    }

    async fn has_voted(&self, user_id: i64, month: &str) -> Result<bool, EngineError> {
        spotlight_votes::has_voted(&self.pool, user_id, month)
            .await
            .map_err(storage)
    }
}
