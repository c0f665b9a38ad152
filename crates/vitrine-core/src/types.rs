//! Domain entities shared across the engine and persistence layers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::placement::PlacementType;

/// A directory business competing for spotlight placements.
///
/// Read-only to the spotlight engine; ownership of these rows belongs to the
/// directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub follower_count: i32,
    pub review_count: i32,
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Per-business engagement snapshot consumed by the score calculator.
///
/// `followers_growth` is the delta since the last snapshot;
/// `posts_engagement` averages likes + comments over the trailing 7 days;
/// `recent_activity` counts posts over the same window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub business_id: i64,
    pub followers_growth: i32,
    pub posts_engagement: f64,
    pub recent_activity: i32,
    pub last_featured_daily: Option<DateTime<Utc>>,
    pub last_featured_weekly: Option<DateTime<Utc>>,
    pub last_featured_monthly: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl EngagementMetrics {
    /// Most recent feature timestamp across all placement types.
    ///
    /// The recency sub-score deliberately looks at any placement type, not
    /// the one being selected for.
    #[must_use]
    pub fn last_featured(&self) -> Option<DateTime<Utc>> {
        [
            self.last_featured_daily,
            self.last_featured_weekly,
            self.last_featured_monthly,
        ]
        .into_iter()
        .flatten()
        .max()
    }
}

/// A current spotlight placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spotlight {
    pub id: i64,
    pub business_id: i64,
    pub placement: PlacementType,
    pub position: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An append-only audit record of one selection.
///
/// The sole source for cooldown lookups; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightHistory {
    pub id: i64,
    pub public_id: Uuid,
    pub business_id: i64,
    pub placement: PlacementType,
    pub position: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
}

/// One community vote for the monthly placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightVote {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub month: String,
    pub created_at: DateTime<Utc>,
}

/// Commit payload for one selected business.
///
/// The store applies this as a single logical unit: the spotlight row, the
/// matching history row, and the `last_featured_*` stamp on the business's
/// engagement metrics.
#[derive(Debug, Clone)]
pub struct NewSpotlight {
    pub business_id: i64,
    pub placement: PlacementType,
    pub position: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_score: f64,
}

/// Insert payload for a community vote.
#[derive(Debug, Clone)]
pub struct NewVote {
    pub business_id: i64,
    pub user_id: i64,
    pub month: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn last_featured_picks_most_recent_stamp() {
        let metrics = EngagementMetrics {
            business_id: 1,
            followers_growth: 0,
            posts_engagement: 0.0,
            recent_activity: 0,
            last_featured_daily: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            last_featured_weekly: Some(Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap()),
            last_featured_monthly: Some(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap()),
            updated_at: Utc::now(),
        };
        assert_eq!(
            metrics.last_featured(),
            Some(Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn last_featured_none_when_never_featured() {
        let metrics = EngagementMetrics {
            business_id: 1,
            followers_growth: 0,
            posts_engagement: 0.0,
            recent_activity: 0,
            last_featured_daily: None,
            last_featured_weekly: None,
            last_featured_monthly: None,
            updated_at: Utc::now(),
        };
        assert!(metrics.last_featured().is_none());
    }

    #[test]
    fn placement_serializes_lowercase_in_entities() {
        let json = serde_json::to_string(&PlacementType::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
    }
}
