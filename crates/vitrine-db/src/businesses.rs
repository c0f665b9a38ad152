//! Database operations for the `businesses` table.
//!
//! The spotlight engine treats this table as read-only; `insert_business`
//! exists for seeding and tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use vitrine_core::Business;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
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

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Business {
            id: row.id,
            public_id: row.public_id,
            name: row.name,
            slug: row.slug,
            category: row.category,
            is_active: row.is_active,
            is_verified: row.is_verified,
            follower_count: row.follower_count,
            review_count: row.review_count,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

/// Insert payload for a new business.
#[derive(Debug, Clone)]
pub struct NewBusiness<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub category: Option<&'a str>,
    pub is_verified: bool,
    pub follower_count: i32,
    pub review_count: i32,
    pub rating: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a single business by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such business exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_business(pool: &PgPool, id: i64) -> Result<BusinessRow, DbError> {
    let row = sqlx::query_as::<_, BusinessRow>(
        "SELECT id, public_id, name, slug, category, is_active, is_verified, \
                follower_count, review_count, rating, created_at \
         FROM businesses \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Returns all active businesses, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_businesses(pool: &PgPool) -> Result<Vec<BusinessRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessRow>(
        "SELECT id, public_id, name, slug, category, is_active, is_verified, \
                follower_count, review_count, rating, created_at \
         FROM businesses \
         WHERE is_active = true \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Whether any business in the directory is verified, active or not.
///
/// Drives the eligibility filter's degraded mode.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_verified_business(pool: &PgPool) -> Result<bool, DbError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM businesses WHERE is_verified = true)")
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Insert a new business and return the full row.
///
/// Generates the public UUID in Rust and binds it, as with audit rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a slug conflict).
pub async fn insert_business(
    pool: &PgPool,
    business: &NewBusiness<'_>,
) -> Result<BusinessRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, BusinessRow>(
        "INSERT INTO businesses \
             (public_id, name, slug, category, is_verified, follower_count, review_count, rating) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, public_id, name, slug, category, is_active, is_verified, \
                   follower_count, review_count, rating, created_at",
    )
    .bind(public_id)
    .bind(business.name)
    .bind(business.slug)
    .bind(business.category)
    .bind(business.is_verified)
    .bind(business.follower_count)
    .bind(business.review_count)
    .bind(business.rating)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
