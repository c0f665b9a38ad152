//! Shared domain vocabulary for the vitrine spotlight engine.
//!
//! Placement types, domain entities, the fitness score calculator, calendar
//! month helpers, and application configuration. Everything here is pure and
//! storage-agnostic; persistence lives in `vitrine-db` and the selection
//! logic in `vitrine-engine`.

use thiserror::Error;

pub mod app_config;
mod config;
pub mod month;
pub mod placement;
pub mod score;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use month::{days_remaining_in_month, month_key, parse_month_key};
pub use placement::PlacementType;
pub use score::{fitness_score, score_breakdown, ScoreBreakdown};
pub use types::{
    Business, EngagementMetrics, NewSpotlight, NewVote, Spotlight, SpotlightHistory, SpotlightVote,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid placement type: {0}")]
    InvalidPlacementType(String),
    #[error("invalid month key (expected YYYY-MM): {0}")]
    InvalidMonthKey(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
