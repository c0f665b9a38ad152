//! Database operations for the `engagement_metrics` table.
//!
//! One snapshot per business, keyed by `business_id`. All writes are
//! upserts against that key so rapid successive recalculations cannot lose
//! updates to a read-then-write race.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vitrine_core::EngagementMetrics;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `engagement_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EngagementMetricsRow {
    pub id: i64,
    pub business_id: i64,
    pub followers_growth: i32,
    pub posts_engagement: f64,
    pub recent_activity: i32,
    pub last_featured_daily: Option<DateTime<Utc>>,
    pub last_featured_weekly: Option<DateTime<Utc>>,
    pub last_featured_monthly: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<EngagementMetricsRow> for EngagementMetrics {
    fn from(row: EngagementMetricsRow) -> Self {
        EngagementMetrics {
            business_id: row.business_id,
            followers_growth: row.followers_growth,
            posts_engagement: row.posts_engagement,
            recent_activity: row.recent_activity,
            last_featured_daily: row.last_featured_daily,
            last_featured_weekly: row.last_featured_weekly,
            last_featured_monthly: row.last_featured_monthly,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the engagement snapshot for a business, or `None` if none has
/// been recorded yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_engagement_metrics(
    pool: &PgPool,
    business_id: i64,
) -> Result<Option<EngagementMetricsRow>, DbError> {
    let row = sqlx::query_as::<_, EngagementMetricsRow>(
        "SELECT id, business_id, followers_growth, posts_engagement, recent_activity, \
                last_featured_daily, last_featured_weekly, last_featured_monthly, updated_at \
         FROM engagement_metrics \
         WHERE business_id = $1",
    )
    .bind(business_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert the recalculated engagement numbers for a business.
///
/// The `last_featured_*` stamps are left untouched; those belong to the
/// placement commit path in [`crate::spotlights::commit_placement`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_engagement_metrics(
    pool: &PgPool,
    business_id: i64,
    followers_growth: i32,
    posts_engagement: f64,
    recent_activity: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO engagement_metrics \
             (business_id, followers_growth, posts_engagement, recent_activity) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (business_id) DO UPDATE SET \
             followers_growth = EXCLUDED.followers_growth, \
             posts_engagement = EXCLUDED.posts_engagement, \
             recent_activity = EXCLUDED.recent_activity, \
             updated_at = NOW()",
    )
    .bind(business_id)
    .bind(followers_growth)
    .bind(posts_engagement)
    .bind(recent_activity)
    .execute(pool)
    .await?;

    Ok(())
}
