use serde::{Deserialize, Serialize};

use super::tier::TierThresholds;

/// Main scoring configuration.
///
/// Every section is optional in YAML; missing fields fall back to the
/// leaderboard defaults (30/25/25/20 weighting, diamond at 90).
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     followers: 0.4
///     campaigns: 0.2
///     earnings: 0.2
///     rating: 0.2
///   normalization:
///     followers_per_point: 5000
///   tiers:
///     diamond: 95
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Weights,

    #[serde(default)]
    pub normalization: Normalization,

    #[serde(default)]
    pub tiers: TierThresholds,
}

/// Weight applied to each capped sub-score. Must sum to 1.0.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub followers: f64,
    pub campaigns: f64,
    pub earnings: f64,
    pub rating: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            followers: 0.30,
            campaigns: 0.25,
            earnings: 0.25,
            rating: 0.20,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.followers + self.campaigns + self.earnings + self.rating
    }
}

/// How raw metrics are turned into 0-100 sub-scores.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Normalization {
    /// Followers needed for one point (10k followers = 1 point, 1M saturates)
    pub followers_per_point: f64,

    /// Points per completed campaign (50 campaigns saturate)
    pub points_per_campaign: f64,

    /// Earnings needed for one point (100k saturates)
    pub earnings_per_point: f64,

    /// Top of the rating scale; a rating equal to this maps to 100
    pub rating_scale: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            followers_per_point: 10_000.0,
            points_per_campaign: 2.0,
            earnings_per_point: 1_000.0,
            rating_scale: 5.0,
        }
    }
}
