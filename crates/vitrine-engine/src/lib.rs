//! Spotlight selection & rotation engine.
//!
//! Periodically chooses which businesses occupy the daily, weekly, and
//! monthly promotional slots, blending an algorithmic fitness score with
//! community votes, under fairness cooldowns and category diversity rules.
//! Storage is abstracted behind the traits in [`store`]; `vitrine-db`
//! provides the Postgres implementation.

pub mod eligibility;
mod error;
pub mod rotation;
pub mod selection;
pub mod store;
pub mod votes;

pub use error::EngineError;
pub use rotation::{
    ManualRotationGate, RotationOutcome, RotationReport, RotationScheduler, RotationTrigger,
    SkipReason,
};
pub use selection::{
    commit_plan, plan_selection, run_selection, CommittedPlacement, SelectionPlan, SelectionResult,
};
pub use store::{
    BusinessStore, Clock, HistoryStore, MetricsStore, SpotlightStore, Store, SystemClock,
    VoteCount, VoteStore,
};
pub use votes::MonthVoteStats;
