//! Database operations for the `spotlights` table, including the
//! transactional placement commit.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vitrine_core::{NewSpotlight, PlacementType, Spotlight};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `spotlights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpotlightRow {
    pub id: i64,
    pub business_id: i64,
    pub placement_type: String,
    pub position: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SpotlightRow> for Spotlight {
    type Error = DbError;

    fn try_from(row: SpotlightRow) -> Result<Self, Self::Error> {
        let placement: PlacementType = row
            .placement_type
            .parse()
            .map_err(|_| DbError::InvalidPlacement(row.placement_type.clone()))?;
        Ok(Spotlight {
            id: row.id,
            business_id: row.business_id,
            placement,
            position: row.position,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the active spotlights of one placement type, ordered by position.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_spotlights(
    pool: &PgPool,
    placement: PlacementType,
) -> Result<Vec<SpotlightRow>, DbError> {
    let rows = sqlx::query_as::<_, SpotlightRow>(
        "SELECT id, business_id, placement_type, position, start_date, end_date, \
                is_active, created_at \
         FROM spotlights \
         WHERE placement_type = $1 AND is_active = true \
         ORDER BY position",
    )
    .bind(placement.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recently created spotlight of one placement type,
/// active or archived. Drives the rotation due check.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_spotlight(
    pool: &PgPool,
    placement: PlacementType,
) -> Result<Option<SpotlightRow>, DbError> {
    let row = sqlx::query_as::<_, SpotlightRow>(
        "SELECT id, business_id, placement_type, position, start_date, end_date, \
                is_active, created_at \
         FROM spotlights \
         WHERE placement_type = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(placement.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Archive every placement whose end date has passed. Returns the number of
/// rows deactivated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_expired_spotlights(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE spotlights SET is_active = false \
         WHERE is_active = true AND end_date <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Archive every active placement of one type, making room for its
/// replacement batch. Returns the number of rows deactivated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_active_spotlights(
    pool: &PgPool,
    placement: PlacementType,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE spotlights SET is_active = false \
         WHERE is_active = true AND placement_type = $1",
    )
    .bind(placement.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Commit one selection as a single transaction: the spotlight row, its
/// history row, and the `last_featured_*` stamp on the business's
/// engagement metrics. Readers never observe a partial commit.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the business no longer exists (foreign
/// key violation), or [`DbError::Sqlx`] on any other failure. The
/// transaction rolls back in every error case.
pub async fn commit_placement(pool: &PgPool, new: &NewSpotlight) -> Result<SpotlightRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, SpotlightRow>(
        "INSERT INTO spotlights \
             (business_id, placement_type, position, start_date, end_date, is_active) \
         VALUES ($1, $2, $3, $4, $5, true) \
         RETURNING id, business_id, placement_type, position, start_date, end_date, \
                   is_active, created_at",
    )
    .bind(new.business_id)
    .bind(new.placement.as_str())
    .bind(new.position)
    .bind(new.start_date)
    .bind(new.end_date)
    .fetch_one(&mut *tx)
    .await
    .map_err(missing_business_as_not_found)?;

    sqlx::query(
        "INSERT INTO spotlight_history \
             (public_id, business_id, placement_type, position, start_date, end_date, total_score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(new.business_id)
    .bind(new.placement.as_str())
    .bind(new.position)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.total_score)
    .execute(&mut *tx)
    .await?;

    let stamp_sql = match new.placement {
        PlacementType::Daily => {
            "INSERT INTO engagement_metrics (business_id, last_featured_daily) \
             VALUES ($1, $2) \
             ON CONFLICT (business_id) DO UPDATE SET \
                 last_featured_daily = EXCLUDED.last_featured_daily, updated_at = NOW()"
        }
        PlacementType::Weekly => {
            "INSERT INTO engagement_metrics (business_id, last_featured_weekly) \
             VALUES ($1, $2) \
             ON CONFLICT (business_id) DO UPDATE SET \
                 last_featured_weekly = EXCLUDED.last_featured_weekly, updated_at = NOW()"
        }
        PlacementType::Monthly => {
            "INSERT INTO engagement_metrics (business_id, last_featured_monthly) \
             VALUES ($1, $2) \
             ON CONFLICT (business_id) DO UPDATE SET \
                 last_featured_monthly = EXCLUDED.last_featured_monthly, updated_at = NOW()"
        }
    };
    sqlx::query(stamp_sql)
        .bind(new.business_id)
        .bind(new.start_date)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// A foreign-key violation on insert means the referenced business is gone.
fn missing_business_as_not_found(e: sqlx::Error) -> DbError {
    match &e {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
        {
            DbError::NotFound
        }
        _ => DbError::Sqlx(e),
    }
}
