//! Database operations for the `spotlight_history` table.
//!
//! Append-only: rows are written inside the placement commit transaction
//! ([`crate::spotlights::commit_placement`]) and never updated or deleted.
//! This trail is the sole source for cooldown lookups.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vitrine_core::{PlacementType, SpotlightHistory};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `spotlight_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpotlightHistoryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub business_id: i64,
    pub placement_type: String,
    pub position: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SpotlightHistoryRow> for SpotlightHistory {
    type Error = DbError;

    fn try_from(row: SpotlightHistoryRow) -> Result<Self, Self::Error> {
        let placement: PlacementType = row
            .placement_type
            .parse()
            .map_err(|_| DbError::InvalidPlacement(row.placement_type.clone()))?;
        Ok(SpotlightHistory {
            id: row.id,
            public_id: row.public_id,
            business_id: row.business_id,
            placement,
            position: row.position,
            start_date: row.start_date,
            end_date: row.end_date,
            total_score: row.total_score,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the most recent history row for a business and placement type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn most_recent_history(
    pool: &PgPool,
    business_id: i64,
    placement: PlacementType,
) -> Result<Option<SpotlightHistoryRow>, DbError> {
    let row = sqlx::query_as::<_, SpotlightHistoryRow>(
        "SELECT id, public_id, business_id, placement_type, position, start_date, \
                end_date, total_score, created_at \
         FROM spotlight_history \
         WHERE business_id = $1 AND placement_type = $2 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(business_id)
    .bind(placement.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns history rows of one placement type whose `end_date` is after
/// `since`. Backs the eligibility cooldown filter with one set query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn history_ended_since(
    pool: &PgPool,
    placement: PlacementType,
    since: DateTime<Utc>,
) -> Result<Vec<SpotlightHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, SpotlightHistoryRow>(
        "SELECT id, public_id, business_id, placement_type, position, start_date, \
                end_date, total_score, created_at \
         FROM spotlight_history \
         WHERE placement_type = $1 AND end_date > $2 \
         ORDER BY end_date DESC, id DESC",
    )
    .bind(placement.as_str())
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a business's most recent features across all placement types,
/// newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_history(
    pool: &PgPool,
    business_id: i64,
    limit: i64,
) -> Result<Vec<SpotlightHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, SpotlightHistoryRow>(
        "SELECT id, public_id, business_id, placement_type, position, start_date, \
                end_date, total_score, created_at \
         FROM spotlight_history \
         WHERE business_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(business_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
