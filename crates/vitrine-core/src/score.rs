//! Fitness scoring for spotlight candidates.
//!
//! A weighted sum of five clamped sub-scores, each normalized to `[0, 100]`.
//! Deterministic: identical inputs always produce the identical integer.

use chrono::{DateTime, Utc};

use crate::types::{Business, EngagementMetrics};

const ENGAGEMENT_WEIGHT: f64 = 0.30;
const RECENCY_WEIGHT: f64 = 0.25;
const REVIEWS_WEIGHT: f64 = 0.20;
const GROWTH_WEIGHT: f64 = 0.15;
const REACH_WEIGHT: f64 = 0.10;

/// The five sub-scores feeding the weighted total, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub engagement: f64,
    pub recency: f64,
    pub reviews: f64,
    pub growth: f64,
    pub reach: f64,
}

impl ScoreBreakdown {
    /// Weighted total, rounded to an integer in `[0, 100]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn weighted_total(&self) -> u8 {
        let total = self.engagement * ENGAGEMENT_WEIGHT
            + self.recency * RECENCY_WEIGHT
            + self.reviews * REVIEWS_WEIGHT
            + self.growth * GROWTH_WEIGHT
            + self.reach * REACH_WEIGHT;
        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Compute the fitness score for one business.
///
/// A missing metrics snapshot zeroes the engagement, recency, and growth
/// sub-scores; reviews and follower reach still count.
#[must_use]
pub fn fitness_score(
    business: &Business,
    metrics: Option<&EngagementMetrics>,
    now: DateTime<Utc>,
) -> u8 {
    score_breakdown(business, metrics, now).weighted_total()
}

/// Compute the individual sub-scores for one business.
#[must_use]
pub fn score_breakdown(
    business: &Business,
    metrics: Option<&EngagementMetrics>,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let (engagement, recency, growth) = match metrics {
        Some(m) => (
            m.posts_engagement.min(100.0),
            recency_score(m, now),
            (f64::from(m.followers_growth) * 2.0).clamp(0.0, 100.0),
        ),
        None => (0.0, 0.0, 0.0),
    };

    ScoreBreakdown {
        engagement,
        recency,
        reviews: (f64::from(business.review_count) * 5.0).min(100.0),
        growth,
        reach: f64::from(business.follower_count).min(100.0),
    }
}

/// 100 for a business never featured; otherwise two points per day since the
/// most recent feature of any placement type, capped at 100.
#[allow(clippy::cast_precision_loss)]
fn recency_score(metrics: &EngagementMetrics, now: DateTime<Utc>) -> f64 {
    let Some(last) = metrics.last_featured() else {
        return 100.0;
    };
    let days = (now - last).num_days().max(0);
    (days as f64 * 2.0).min(100.0)
}
