use super::config::ScoringConfig;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Weights: each finite and non-negative, together summing to 1
    let weights = [
        ("followers", config.weights.followers),
        ("campaigns", config.weights.campaigns),
        ("earnings", config.weights.earnings),
        ("rating", config.weights.rating),
    ];
    let mut weights_ok = true;
    for (name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!(
                "scoring.weights.{}: must be a non-negative number, got {}",
                name, value
            ));
            weights_ok = false;
        }
    }
    if weights_ok {
        let sum = config.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            errors.push(format!("scoring.weights: must sum to 1.0, got {}", sum));
        }
    }

    // Normalization: every divisor/multiplier strictly positive
    let norm = &config.normalization;
    let factors = [
        ("followers_per_point", norm.followers_per_point),
        ("points_per_campaign", norm.points_per_campaign),
        ("earnings_per_point", norm.earnings_per_point),
        ("rating_scale", norm.rating_scale),
    ];
    for (name, value) in factors {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!(
                "scoring.normalization.{}: must be greater than 0, got {}",
                name, value
            ));
        }
    }

    // Tier thresholds: inside [0, 100] and strictly descending
    let tiers = &config.tiers;
    let thresholds = [
        ("diamond", tiers.diamond),
        ("platinum", tiers.platinum),
        ("gold", tiers.gold),
        ("silver", tiers.silver),
    ];
    for (name, value) in thresholds {
        if !(0.0..=100.0).contains(&value) {
            errors.push(format!(
                "scoring.tiers.{}: must be between 0 and 100, got {}",
                name, value
            ));
        }
    }
    for pair in thresholds.windows(2) {
        let (upper_name, upper) = pair[0];
        let (lower_name, lower) = pair[1];
        if upper <= lower {
            errors.push(format!(
                "scoring.tiers: {} ({}) must be above {} ({})",
                upper_name, upper, lower_name, lower
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
