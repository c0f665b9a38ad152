//! Database operations for the `spotlight_votes` table.
//!
//! The `(user_id, month)` unique constraint is the authority on one vote per
//! user per month; this module surfaces its violation as a typed error
//! rather than pre-checking, so concurrent submissions cannot race.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vitrine_core::{NewVote, SpotlightVote};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `spotlight_votes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpotlightVoteRow {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub month: String,
    pub created_at: DateTime<Utc>,
}

impl From<SpotlightVoteRow> for SpotlightVote {
    fn from(row: SpotlightVoteRow) -> Self {
        SpotlightVote {
            id: row.id,
            business_id: row.business_id,
            user_id: row.user_id,
            month: row.month,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert one community vote.
///
/// # Errors
///
/// Returns [`DbError::DuplicateVote`] when the user already voted this
/// month, or [`DbError::Sqlx`] on any other failure.
pub async fn insert_spotlight_vote(
    pool: &PgPool,
    vote: &NewVote,
) -> Result<SpotlightVoteRow, DbError> {
    let row = sqlx::query_as::<_, SpotlightVoteRow>(
        "INSERT INTO spotlight_votes (business_id, user_id, month) \
         VALUES ($1, $2, $3) \
         RETURNING id, business_id, user_id, month, created_at",
    )
    .bind(vote.business_id)
    .bind(vote.user_id)
    .bind(&vote.month)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            DbError::DuplicateVote
        }
        _ => DbError::Sqlx(e),
    })?;

    Ok(row)
}

/// Per-business vote tallies for one month, descending by count with ties
/// on ascending business id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn vote_counts_for_month(
    pool: &PgPool,
    month: &str,
) -> Result<Vec<(i64, i64)>, DbError> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT business_id, COUNT(*) \
         FROM spotlight_votes \
         WHERE month = $1 \
         GROUP BY business_id \
         ORDER BY COUNT(*) DESC, business_id",
    )
    .bind(month)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Whether a user has already voted in the given month.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_voted(pool: &PgPool, user_id: i64, month: &str) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM spotlight_votes WHERE user_id = $1 AND month = $2)",
    )
    .bind(user_id)
    .bind(month)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
