//! Storage and time abstractions the engine is driven through.
//!
//! Implemented over Postgres by `vitrine-db::PgStore`; engine tests use an
//! in-memory implementation. All methods are read paths except
//! [`SpotlightStore::commit_placement`], [`SpotlightStore::deactivate_expired`],
//! and [`VoteStore::insert_vote`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vitrine_core::{
    Business, EngagementMetrics, NewSpotlight, NewVote, PlacementType, Spotlight,
    SpotlightHistory, SpotlightVote,
};

use crate::error::EngineError;

/// Vote tally for one business in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCount {
    pub business_id: i64,
    pub votes: i64,
}

#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EngineError::BusinessNotFound`] when no such business exists.
    async fn business(&self, id: i64) -> Result<Business, EngineError>;

    async fn list_active_businesses(&self) -> Result<Vec<Business>, EngineError>;

    /// Whether any business anywhere in the directory is verified.
    ///
    /// Drives the eligibility filter's degraded mode: verification is only
    /// required once at least one business has it.
    async fn has_verified_business(&self) -> Result<bool, EngineError>;
}

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// The engagement snapshot for a business, if one has been recorded.
    async fn engagement_metrics(
        &self,
        business_id: i64,
    ) -> Result<Option<EngagementMetrics>, EngineError>;
}

#[async_trait]
pub trait SpotlightStore: Send + Sync {
    /// Active spotlight rows of the given type (archival may lag, so callers
    /// still compare `end_date` against their own `now`).
    async fn list_active_spotlights(
        &self,
        placement: PlacementType,
    ) -> Result<Vec<Spotlight>, EngineError>;

    /// Most recently created spotlight of the given type, active or not.
    async fn latest_spotlight(
        &self,
        placement: PlacementType,
    ) -> Result<Option<Spotlight>, EngineError>;

    /// Apply one selection as a single logical unit: the spotlight row, its
    /// matching history row, and the `last_featured_*` stamp on the
    /// business's engagement metrics. Partial application must never be
    /// observable to readers.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BusinessNotFound`] when the business vanished
    /// between selection and commit.
    async fn commit_placement(&self, new: NewSpotlight) -> Result<Spotlight, EngineError>;

    /// Archive placements with `end_date <= now`. Returns the number of rows
    /// deactivated.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, EngineError>;

    /// Archive every active spotlight of the given type, making room for its
    /// replacement batch. Runs just before a due type's selection so the
    /// per-type active-slot limits hold even when rotation fires ahead of
    /// the outgoing placements' end dates.
    async fn deactivate_active(&self, placement: PlacementType) -> Result<u64, EngineError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Most recent history row for a business and placement type.
    async fn most_recent_history(
        &self,
        business_id: i64,
        placement: PlacementType,
    ) -> Result<Option<SpotlightHistory>, EngineError>;

    /// History rows of the given type whose `end_date` is after `since`.
    /// Backs the cooldown filter with one set query instead of a lookup per
    /// candidate.
    async fn history_ended_since(
        &self,
        placement: PlacementType,
        since: DateTime<Utc>,
    ) -> Result<Vec<SpotlightHistory>, EngineError>;
}

#[async_trait]
pub trait VoteStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateVote`] when the user already voted
    /// this month. The store must enforce this with a uniqueness constraint,
    /// not a check-then-insert, so it holds under concurrent submissions.
    async fn insert_vote(&self, vote: NewVote) -> Result<SpotlightVote, EngineError>;

    /// Per-business tallies for a month, descending by count.
    async fn vote_counts_for_month(&self, month: &str) -> Result<Vec<VoteCount>, EngineError>;

    async fn has_voted(&self, user_id: i64, month: &str) -> Result<bool, EngineError>;
}

/// Everything a rotation pass needs from storage.
pub trait Store: BusinessStore + MetricsStore + SpotlightStore + HistoryStore + VoteStore {}

impl<T> Store for T where T: BusinessStore + MetricsStore + SpotlightStore + HistoryStore + VoteStore
{}

/// Injectable time source so rotation logic is testable at fixed instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
