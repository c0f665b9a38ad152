//! In-memory store and manual clock shared by the engine integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use vitrine_core::{
    Business, EngagementMetrics, NewSpotlight, NewVote, PlacementType, Spotlight,
    SpotlightHistory, SpotlightVote,
};
use vitrine_engine::{
    BusinessStore, Clock, EngineError, HistoryStore, MetricsStore, SpotlightStore, VoteCount,
    VoteStore,
};

#[derive(Default)]
pub struct MemState {
    pub businesses: Vec<Business>,
    pub metrics: HashMap<i64, EngagementMetrics>,
    pub spotlights: Vec<Spotlight>,
    pub history: Vec<SpotlightHistory>,
    pub votes: Vec<SpotlightVote>,
    next_id: i64,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store handle; clones share state, so tests can keep one handle
/// and move another into the scheduler.
#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
    /// Milliseconds to stall inside `deactivate_expired`, to hold a rotation
    /// pass in flight while a second one is attempted.
    pub stall_archival_ms: u64,
    /// Business ids whose commit fails as not-found, simulating a business
    /// deleted between selection and commit.
    pub vanish_on_commit: Arc<Mutex<HashSet<i64>>>,
    /// When set, the monthly vote tally fails with a storage error.
    pub fail_vote_counts: Arc<Mutex<bool>>,
}

fn backend_error(message: &str) -> EngineError {
    EngineError::storage(std::io::Error::other(message.to_string()))
}

impl MemStore {
    /// A store that stalls inside archival, holding a rotation pass in
    /// flight long enough for an overlapping pass to hit the guard.
    pub fn with_archival_stall(ms: u64) -> Self {
        Self {
            stall_archival_ms: ms,
            ..Self::default()
        }
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        self.state.lock().unwrap()
    }

    pub fn add_business(&self, id: i64, category: Option<&str>, verified: bool) {
        self.lock().businesses.push(Business {
            id,
            public_id: Uuid::new_v4(),
            name: format!("Business {id}"),
            slug: format!("business-{id}"),
            category: category.map(ToString::to_string),
            is_active: true,
            is_verified: verified,
            follower_count: 0,
            review_count: 0,
            rating: Decimal::ZERO,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        });
    }

    pub fn set_business_stats(&self, id: i64, follower_count: i32, review_count: i32) {
        let mut state = self.lock();
        if let Some(b) = state.businesses.iter_mut().find(|b| b.id == id) {
            b.follower_count = follower_count;
            b.review_count = review_count;
        }
    }

    pub fn set_metrics(&self, business_id: i64, posts_engagement: f64, followers_growth: i32) {
        self.lock().metrics.insert(
            business_id,
            EngagementMetrics {
                business_id,
                followers_growth,
                posts_engagement,
                recent_activity: 0,
                last_featured_daily: None,
                last_featured_weekly: None,
                last_featured_monthly: None,
                updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        );
    }

    pub fn add_active_spotlight(
        &self,
        business_id: i64,
        placement: PlacementType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) {
        let mut state = self.lock();
        let id = state.next_id();
        state.spotlights.push(Spotlight {
            id,
            business_id,
            placement,
            position: 1,
            start_date,
            end_date,
            is_active: true,
            created_at: start_date,
        });
    }

    pub fn add_history(
        &self,
        business_id: i64,
        placement: PlacementType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) {
        let mut state = self.lock();
        let id = state.next_id();
        state.history.push(SpotlightHistory {
            id,
            public_id: Uuid::new_v4(),
            business_id,
            placement,
            position: 1,
            start_date,
            end_date,
            total_score: 50.0,
            created_at: start_date,
        });
    }

    /// Record `count` votes for a business from distinct synthetic users.
    pub fn add_votes(&self, business_id: i64, month: &str, count: i64) {
        let mut state = self.lock();
        for _ in 0..count {
            let id = state.next_id();
            state.votes.push(SpotlightVote {
                id,
                business_id,
                // Synthetic voter ids offset far from test business ids.
                user_id: 1_000_000 + id,
                month: month.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            });
        }
    }

    pub fn active_spotlights(&self, placement: PlacementType) -> Vec<Spotlight> {
        let mut rows: Vec<Spotlight> = self
            .lock()
            .spotlights
            .iter()
            .filter(|s| s.placement == placement && s.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.position);
        rows
    }

    pub fn history_rows(&self, placement: PlacementType) -> Vec<SpotlightHistory> {
        let mut rows: Vec<SpotlightHistory> = self
            .lock()
            .history
            .iter()
            .filter(|h| h.placement == placement)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.position);
        rows
    }
}

#[async_trait]
impl BusinessStore for MemStore {
    async fn business(&self, id: i64) -> Result<Business, EngineError> {
        self.lock()
            .businesses
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(EngineError::BusinessNotFound(id))
    }

    async fn list_active_businesses(&self) -> Result<Vec<Business>, EngineError> {
        Ok(self
            .lock()
            .businesses
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect())
    }

    async fn has_verified_business(&self) -> Result<bool, EngineError> {
        Ok(self.lock().businesses.iter().any(|b| b.is_verified))
    }
}

#[async_trait]
impl MetricsStore for MemStore {
    async fn engagement_metrics(
        &self,
        business_id: i64,
    ) -> Result<Option<EngagementMetrics>, EngineError> {
        Ok(self.lock().metrics.get(&business_id).cloned())
    }
}

#[async_trait]
impl SpotlightStore for MemStore {
    async fn list_active_spotlights(
        &self,
        placement: PlacementType,
    ) -> Result<Vec<Spotlight>, EngineError> {
        Ok(self
            .lock()
            .spotlights
            .iter()
            .filter(|s| s.placement == placement && s.is_active)
            .cloned()
            .collect())
    }

    async fn latest_spotlight(
        &self,
        placement: PlacementType,
    ) -> Result<Option<Spotlight>, EngineError> {
        Ok(self
            .lock()
            .spotlights
            .iter()
            .filter(|s| s.placement == placement)
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn commit_placement(&self, new: NewSpotlight) -> Result<Spotlight, EngineError> {
        if self.vanish_on_commit.lock().unwrap().contains(&new.business_id) {
            return Err(EngineError::BusinessNotFound(new.business_id));
        }

        let mut state = self.lock();
        if !state.businesses.iter().any(|b| b.id == new.business_id) {
            return Err(EngineError::BusinessNotFound(new.business_id));
        }

        let id = state.next_id();
        let spotlight = Spotlight {
            id,
            business_id: new.business_id,
            placement: new.placement,
            position: new.position,
            start_date: new.start_date,
            end_date: new.end_date,
            is_active: true,
            created_at: new.start_date,
        };
        state.spotlights.push(spotlight.clone());

        let history_id = state.next_id();
        state.history.push(SpotlightHistory {
            id: history_id,
            public_id: Uuid::new_v4(),
            business_id: new.business_id,
            placement: new.placement,
            position: new.position,
            start_date: new.start_date,
            end_date: new.end_date,
            total_score: new.total_score,
            created_at: new.start_date,
        });

        let metrics = state
            .metrics
            .entry(new.business_id)
            .or_insert_with(|| EngagementMetrics {
                business_id: new.business_id,
                followers_growth: 0,
                posts_engagement: 0.0,
                recent_activity: 0,
                last_featured_daily: None,
                last_featured_weekly: None,
                last_featured_monthly: None,
                updated_at: new.start_date,
            });
        match new.placement {
            PlacementType::Daily => metrics.last_featured_daily = Some(new.start_date),
            PlacementType::Weekly => metrics.last_featured_weekly = Some(new.start_date),
            PlacementType::Monthly => metrics.last_featured_monthly = Some(new.start_date),
        }
        metrics.updated_at = new.start_date;

        Ok(spotlight)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, EngineError> {
        if self.stall_archival_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.stall_archival_ms)).await;
        }
        let mut state = self.lock();
        let mut archived = 0;
        for spotlight in &mut state.spotlights {
            if spotlight.is_active && spotlight.end_date <= now {
                spotlight.is_active = false;
                archived += 1;
            }
        }
        Ok(archived)
    }

    async fn deactivate_active(&self, placement: PlacementType) -> Result<u64, EngineError> {
        let mut state = self.lock();
        let mut retired = 0;
        for spotlight in &mut state.spotlights {
            if spotlight.is_active && spotlight.placement == placement {
                spotlight.is_active = false;
                retired += 1;
            }
        }
        Ok(retired)
    }
}

#[async_trait]
impl HistoryStore for MemStore {
    async fn most_recent_history(
        &self,
        business_id: i64,
        placement: PlacementType,
    ) -> Result<Option<SpotlightHistory>, EngineError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.business_id == business_id && h.placement == placement)
            .max_by_key(|h| (h.created_at, h.id))
            .cloned())
    }

    async fn history_ended_since(
        &self,
        placement: PlacementType,
        since: DateTime<Utc>,
    ) -> Result<Vec<SpotlightHistory>, EngineError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.placement == placement && h.end_date > since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VoteStore for MemStore {
    async fn insert_vote(&self, vote: NewVote) -> Result<SpotlightVote, EngineError> {
        let mut state = self.lock();
        if state
            .votes
            .iter()
            .any(|v| v.user_id == vote.user_id && v.month == vote.month)
        {
            return Err(EngineError::DuplicateVote {
                user_id: vote.user_id,
                month: vote.month,
            });
        }
        let id = state.next_id();
        let row = SpotlightVote {
            id,
            business_id: vote.business_id,
            user_id: vote.user_id,
            month: vote.month,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        state.votes.push(row.clone());
        Ok(row)
    }

    async fn vote_counts_for_month(&self, month: &str) -> Result<Vec<VoteCount>, EngineError> {
        if *self.fail_vote_counts.lock().unwrap() {
            return Err(backend_error("vote tally unavailable"));
        }
        let mut tally: HashMap<i64, i64> = HashMap::new();
        for vote in self.lock().votes.iter().filter(|v| v.month == month) {
            *tally.entry(vote.business_id).or_insert(0) += 1;
        }
        let mut counts: Vec<VoteCount> = tally
            .into_iter()
            .map(|(business_id, votes)| VoteCount { business_id, votes })
            .collect();
        counts.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.business_id.cmp(&b.business_id))
        });
        Ok(counts)
    }

    async fn has_voted(&self, user_id: i64, month: &str) -> Result<bool, EngineError> {
        Ok(self
            .lock()
            .votes
            .iter()
            .any(|v| v.user_id == user_id && v.month == month))
    }
}

/// Settable clock; clones share the same instant.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A fixed reference instant partway through a month.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}
