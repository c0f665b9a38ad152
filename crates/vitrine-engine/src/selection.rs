//! Selection strategies for the three placement types.
//!
//! Daily takes the top three by fitness score; weekly fills five slots with a
//! one-per-category diversity pass before falling back to overall score;
//! monthly blends community votes (70%) with the fitness score (30%) for a
//! single winner. All orderings share one tie-break: score descending, then
//! business id ascending, so equal scores select deterministically.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use vitrine_core::{fitness_score, month_key, Business, NewSpotlight, PlacementType};

use crate::eligibility;
use crate::error::EngineError;
use crate::store::Store;

/// Community votes count for 70% of the monthly blend.
pub const VOTE_WEIGHT: f64 = 0.7;
/// Algorithmic fitness makes up the remaining 30%.
pub const ALGORITHM_WEIGHT: f64 = 0.3;
/// Ten votes are worth one normalized point, capped at 100.
pub const VOTES_PER_POINT: f64 = 10.0;

#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) business: Business,
    pub(crate) score: f64,
}

/// One committed slot from a selection run.
#[derive(Debug, Clone)]
pub struct CommittedPlacement {
    pub spotlight_id: i64,
    pub business_id: i64,
    pub position: i32,
    pub score: f64,
}

/// Outcome of one placement type's selection.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub placement: PlacementType,
    pub committed: Vec<CommittedPlacement>,
}

/// Scored winners for one placement type, not yet committed.
///
/// Planning is read-only, so the scheduler can retire the outgoing batch
/// only once it knows there is a replacement to commit.
#[derive(Debug, Clone)]
pub struct SelectionPlan {
    pub placement: PlacementType,
    winners: Vec<Candidate>,
}

impl SelectionPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}

/// Run the selection strategy for one placement type and commit the winners.
///
/// An empty eligible pool is a no-op, not an error. A business that vanishes
/// between selection and commit is skipped; the rest of the batch proceeds.
///
/// # Errors
///
/// Propagates storage errors other than the per-business not-found case.
pub async fn run_selection<S: Store>(
    store: &S,
    placement: PlacementType,
    now: DateTime<Utc>,
) -> Result<SelectionResult, EngineError> {
    let plan = plan_selection(store, placement, now).await?;
    commit_plan(store, plan, now).await
}

/// Score the eligible pool and pick this placement type's winners, without
/// writing anything.
///
/// # Errors
///
/// Propagates storage errors from the eligibility, metrics, and vote reads.
pub async fn plan_selection<S: Store>(
    store: &S,
    placement: PlacementType,
    now: DateTime<Utc>,
) -> Result<SelectionPlan, EngineError> {
    let pool = eligibility::eligible_businesses(store, placement, now).await?;
    if pool.is_empty() {
        tracing::info!(placement = %placement, "selection: eligible pool is empty; nothing to select");
        return Ok(SelectionPlan {
            placement,
            winners: Vec::new(),
        });
    }

    let mut candidates = Vec::with_capacity(pool.len());
    for business in pool {
        let metrics = store.engagement_metrics(business.id).await?;
        let score = f64::from(fitness_score(&business, metrics.as_ref(), now));
        candidates.push(Candidate { business, score });
    }

    let winners = match placement {
        PlacementType::Daily => pick_top(sorted(candidates), placement.slot_count()),
        PlacementType::Weekly => pick_weekly(sorted(candidates), placement.slot_count()),
        PlacementType::Monthly => {
            let counts = store.vote_counts_for_month(&month_key(now)).await?;
            let votes: HashMap<i64, i64> =
                counts.iter().map(|c| (c.business_id, c.votes)).collect();
            let blended = candidates
                .into_iter()
                .map(|c| blend_with_votes(c, &votes))
                .collect();
            pick_top(sorted(blended), placement.slot_count())
        }
    };

    Ok(SelectionPlan { placement, winners })
}

/// Commit a plan's winners in rank order: position `n` gets the spotlight
/// row, its history row, and the last-featured stamp as one logical unit.
///
/// # Errors
///
/// Propagates storage errors other than the per-business not-found case.
pub async fn commit_plan<S: Store>(
    store: &S,
    plan: SelectionPlan,
    now: DateTime<Utc>,
) -> Result<SelectionResult, EngineError> {
    let placement = plan.placement;
    let end_date = placement.placement_end(now);
    let mut committed = Vec::with_capacity(plan.winners.len());
    let mut position: i32 = 0;

    for candidate in plan.winners {
        position += 1;
        let new = NewSpotlight {
            business_id: candidate.business.id,
            placement,
            position,
            start_date: now,
            end_date,
            total_score: candidate.score,
        };
        match store.commit_placement(new).await {
            Ok(spotlight) => {
                tracing::info!(
                    placement = %placement,
                    business = %candidate.business.slug,
                    position,
                    score = candidate.score,
                    "selection: committed placement"
                );
                committed.push(CommittedPlacement {
                    spotlight_id: spotlight.id,
                    business_id: candidate.business.id,
                    position,
                    score: candidate.score,
                });
            }
            Err(EngineError::BusinessNotFound(id)) => {
                tracing::warn!(
                    placement = %placement,
                    business_id = id,
                    "selection: business vanished before commit; skipping"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(SelectionResult {
        placement,
        committed,
    })
}

/// Score descending, business id ascending on ties.
fn sorted(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.business.id.cmp(&b.business.id))
    });
    candidates
}

fn pick_top(sorted: Vec<Candidate>, count: usize) -> Vec<Candidate> {
    sorted.into_iter().take(count).collect()
}

/// One slot per category first (alphabetical category order, stable), then
/// fill any remainder from the overall pool by score. No business appears
/// twice; final positions follow overall score order across the chosen set.
fn pick_weekly(pool: Vec<Candidate>, slots: usize) -> Vec<Candidate> {
    let mut category_top: BTreeMap<&str, &Candidate> = BTreeMap::new();
    for candidate in &pool {
        // `pool` is score-ordered, so the first entry per category wins it.
        category_top
            .entry(category_key(&candidate.business))
            .or_insert(candidate);
    }

    let mut chosen: HashSet<i64> = HashSet::new();
    let mut winners: Vec<Candidate> = Vec::new();
    for candidate in category_top.values().take(slots) {
        if chosen.insert(candidate.business.id) {
            winners.push((*candidate).clone());
        }
    }
    for candidate in &pool {
        if winners.len() >= slots {
            break;
        }
        if chosen.insert(candidate.business.id) {
            winners.push(candidate.clone());
        }
    }

    sorted(winners)
}

fn category_key(business: &Business) -> &str {
    business.category.as_deref().unwrap_or("uncategorized")
}

#[allow(clippy::cast_precision_loss)]
fn blend_with_votes(mut candidate: Candidate, votes: &HashMap<i64, i64>) -> Candidate {
    let count = votes.get(&candidate.business.id).copied().unwrap_or(0);
    let normalized = (count as f64 / VOTES_PER_POINT).min(100.0);
    candidate.score = normalized * VOTE_WEIGHT + candidate.score * ALGORITHM_WEIGHT;
    candidate
}
