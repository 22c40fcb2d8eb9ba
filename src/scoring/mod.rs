pub mod config;
pub mod engine;
pub mod rank;
pub mod tier;
pub mod validation;

pub use config::*;
pub use engine::{calculate_score, compute_score, KolMetrics, ScoreBreakdown, ScoreResult};
pub use rank::{rank_entries, RankedEntry};
pub use tier::{determine_tier, Tier, TierThresholds};
pub use validation::validate_scoring;
