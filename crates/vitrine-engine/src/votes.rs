//! Community vote recording and aggregation.
//!
//! Votes are keyed by `"YYYY-MM"`; uniqueness per `(user, month)` is
//! enforced by the store's constraint, so recording never needs a
//! check-then-insert.

use chrono::{DateTime, Utc};
use vitrine_core::{days_remaining_in_month, month_key, parse_month_key, NewVote, SpotlightVote};

use crate::error::EngineError;
use crate::store::{BusinessStore, VoteCount, VoteStore};

const TOP_BUSINESS_COUNT: usize = 3;

/// Aggregate vote statistics for one month.
#[derive(Debug, Clone)]
pub struct MonthVoteStats {
    pub month: String,
    pub total_votes: i64,
    pub distinct_voters: i64,
    pub participating_businesses: usize,
    /// Days left in the month while it is current; 0 once it has passed.
    pub days_remaining: u32,
    pub top_businesses: Vec<VoteCount>,
}

/// Record one community vote.
///
/// # Errors
///
/// Returns [`EngineError::BusinessNotFound`] for an unknown business,
/// [`EngineError::DuplicateVote`] when the user already voted this month,
/// and [`EngineError::Invalid`] for a malformed month key.
pub async fn record_vote<S>(
    store: &S,
    user_id: i64,
    business_id: i64,
    month: &str,
) -> Result<SpotlightVote, EngineError>
where
    S: BusinessStore + VoteStore,
{
    parse_month_key(month)?;
    store.business(business_id).await?;
    store
        .insert_vote(NewVote {
            business_id,
            user_id,
            month: month.to_string(),
        })
        .await
}

/// Per-business tallies for a month, descending by count (ties on ascending
/// business id).
///
/// # Errors
///
/// Returns [`EngineError::Invalid`] for a malformed month key, or a storage
/// error from the tally query.
pub async fn counts_by_month<S: VoteStore>(
    store: &S,
    month: &str,
) -> Result<Vec<VoteCount>, EngineError> {
    parse_month_key(month)?;
    let mut counts = store.vote_counts_for_month(month).await?;
    counts.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.business_id.cmp(&b.business_id))
    });
    Ok(counts)
}

/// Aggregate statistics for one month's voting.
///
/// Every vote has a distinct voter (the store enforces one vote per user per
/// month), so `distinct_voters` equals `total_votes`.
///
/// # Errors
///
/// Returns [`EngineError::Invalid`] for a malformed month key, or a storage
/// error from the tally query.
pub async fn stats_for_month<S: VoteStore>(
    store: &S,
    month: &str,
    now: DateTime<Utc>,
) -> Result<MonthVoteStats, EngineError> {
    let counts = counts_by_month(store, month).await?;
    let total_votes: i64 = counts.iter().map(|c| c.votes).sum();
    let days_remaining = if month == month_key(now) {
        days_remaining_in_month(now)
    } else {
        0
    };

    Ok(MonthVoteStats {
        month: month.to_string(),
        total_votes,
        distinct_voters: total_votes,
        participating_businesses: counts.len(),
        days_remaining,
        top_businesses: counts.into_iter().take(TOP_BUSINESS_COUNT).collect(),
    })
}
