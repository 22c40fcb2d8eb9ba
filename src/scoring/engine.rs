use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;

/// Ceiling for every sub-score and for the final score
pub const SCORE_CAP: f64 = 100.0;

/// Raw performance metrics for one KOL, built from profile fields per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KolMetrics {
    pub followers: u64,
    pub campaigns: u64,
    pub earnings: f64,
    /// 0.0 - 5.0 on the default scale
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub label: String,   // e.g. "Followers", "Rating"
    pub raw: f64,        // Input value after clamping
    pub sub_score: f64,  // 0-100 after the cap
    pub weight: f64,
    pub weighted: f64,   // sub_score * weight
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorContribution>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score metrics with the default weighting
pub fn compute_score(metrics: &KolMetrics) -> f64 {
    calculate_score(metrics, &ScoringConfig::default()).score
}

pub fn calculate_score(metrics: &KolMetrics, config: &ScoringConfig) -> ScoreResult {
    let norm = &config.normalization;
    let weights = &config.weights;

    let followers = metrics.followers as f64;
    let campaigns = metrics.campaigns as f64;
    let earnings = non_negative(metrics.earnings);
    let rating = non_negative(metrics.rating);

    let factors = vec![
        factor(
            "Followers",
            followers,
            ratio(followers, norm.followers_per_point),
            weights.followers,
        ),
        factor(
            "Campaigns",
            campaigns,
            campaigns * norm.points_per_campaign,
            weights.campaigns,
        ),
        factor(
            "Earnings",
            earnings,
            ratio(earnings, norm.earnings_per_point),
            weights.earnings,
        ),
        factor(
            "Rating",
            rating,
            ratio(rating, norm.rating_scale) * SCORE_CAP,
            weights.rating,
        ),
    ];

    let score: f64 = factors.iter().map(|f| f.weighted).sum();

    ScoreResult {
        score: non_negative(score).min(SCORE_CAP),
        breakdown: ScoreBreakdown { factors },
    }
}

fn factor(label: &str, raw: f64, uncapped: f64, weight: f64) -> FactorContribution {
    let sub_score = non_negative(uncapped).min(SCORE_CAP);
    FactorContribution {
        label: label.to_string(),
        raw,
        sub_score,
        weight,
        weighted: sub_score * weight,
    }
}

/// Division that yields 0 for a zero or negative divisor instead of inf/NaN
fn ratio(value: f64, divisor: f64) -> f64 {
    if divisor > 0.0 {
        value / divisor
    } else {
        0.0
    }
}

/// NaN and negatives collapse to zero; +inf is left for the cap to handle
fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}
