//! Vote recording and aggregation tests over the in-memory store.

mod common;

use common::{test_now, MemStore};
use vitrine_engine::{votes, EngineError, VoteStore};

#[tokio::test]
async fn vote_is_recorded_once_per_user_per_month() {
    let store = MemStore::default();
    store.add_business(1, None, true);
    store.add_business(2, None, true);

    let vote = votes::record_vote(&store, 77, 1, "2025-06").await.unwrap();
    assert_eq!(vote.business_id, 1);
    assert_eq!(vote.month, "2025-06");
    assert!(store.has_voted(77, "2025-06").await.unwrap());

    // Second vote in the same month, even for a different business.
    let err = votes::record_vote(&store, 77, 2, "2025-06")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::DuplicateVote { user_id: 77, ref month } if month == "2025-06"
    ));

    let counts = votes::counts_by_month(&store, "2025-06").await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].votes, 1);

    // A new month is a fresh ballot.
    votes::record_vote(&store, 77, 2, "2025-07").await.unwrap();
}

#[tokio::test]
async fn vote_for_unknown_business_is_rejected() {
    let store = MemStore::default();
    let err = votes::record_vote(&store, 77, 999, "2025-06")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BusinessNotFound(999)));
    assert!(!store.has_voted(77, "2025-06").await.unwrap());
}

#[tokio::test]
async fn malformed_month_key_is_rejected() {
    let store = MemStore::default();
    store.add_business(1, None, true);
    for month in ["2025-6", "June 2025", "2025/06", "2025-00"] {
        let err = votes::record_vote(&store, 77, 1, month).await.unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)), "accepted {month}");
    }
}

#[tokio::test]
async fn counts_order_by_votes_then_business_id() {
    let store = MemStore::default();
    store.add_votes(3, "2025-06", 2);
    store.add_votes(1, "2025-06", 5);
    store.add_votes(2, "2025-06", 2);

    let counts = votes::counts_by_month(&store, "2025-06").await.unwrap();
    let ordered: Vec<(i64, i64)> = counts.iter().map(|c| (c.business_id, c.votes)).collect();
    assert_eq!(ordered, vec![(1, 5), (2, 2), (3, 2)]);
}

#[tokio::test]
async fn stats_summarize_the_current_month() {
    let store = MemStore::default();
    store.add_votes(1, "2025-06", 4);
    store.add_votes(2, "2025-06", 3);
    store.add_votes(3, "2025-06", 2);
    store.add_votes(4, "2025-06", 1);
    // Votes in another month do not leak in.
    store.add_votes(1, "2025-05", 9);

    let stats = votes::stats_for_month(&store, "2025-06", test_now())
        .await
        .unwrap();

    assert_eq!(stats.total_votes, 10);
    // One vote per user per month makes every vote a distinct voter.
    assert_eq!(stats.distinct_voters, 10);
    assert_eq!(stats.participating_businesses, 4);
    // June 15th: fifteen days left in a thirty-day month.
    assert_eq!(stats.days_remaining, 15);

    let top: Vec<i64> = stats.top_businesses.iter().map(|c| c.business_id).collect();
    assert_eq!(top, vec![1, 2, 3]);
}

#[tokio::test]
async fn stats_for_a_past_month_have_no_days_remaining() {
    let store = MemStore::default();
    store.add_votes(1, "2025-05", 2);

    let stats = votes::stats_for_month(&store, "2025-05", test_now())
        .await
        .unwrap();
    assert_eq!(stats.total_votes, 2);
    assert_eq!(stats.days_remaining, 0);
}
