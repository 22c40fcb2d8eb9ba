use super::config::ScoringConfig;
use super::engine::{calculate_score, KolMetrics, ScoreBreakdown};
use super::tier::Tier;

/// One leaderboard row: the entity plus its scoring outcome.
#[derive(Debug, Clone)]
pub struct RankedEntry<T> {
    /// 1-based position in the full ranking
    pub rank: usize,
    pub score: f64,
    pub tier: Tier,
    pub metrics: KolMetrics,
    pub breakdown: ScoreBreakdown,
    pub entity: T,
}

/// Score every entry, sort by score descending and number the result.
///
/// The sort is stable: entries with equal scores keep their input order, so
/// ranking the same collection twice yields the same ranks.
pub fn rank_entries<T, I>(entries: I, config: &ScoringConfig) -> Vec<RankedEntry<T>>
where
    I: IntoIterator<Item = (T, KolMetrics)>,
{
    let mut scored: Vec<_> = entries
        .into_iter()
        .map(|(entity, metrics)| {
            let result = calculate_score(&metrics, config);
            RankedEntry {
                rank: 0,
                score: result.score,
                tier: config.tiers.tier_for(result.score),
                metrics,
                breakdown: result.breakdown,
                entity,
            }
        })
        .collect();

    // Scores are clamped and never NaN, so partial_cmp always succeeds
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (idx, entry) in scored.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(followers: u64, campaigns: u64, earnings: f64, rating: f64) -> KolMetrics {
        KolMetrics {
            followers,
            campaigns,
            earnings,
            rating,
        }
    }

    #[test]
    fn test_sorted_descending_with_ranks() {
        let entries = vec![
            ("low", m(0, 0, 0.0, 1.0)),
            ("high", m(1_000_000, 50, 100_000.0, 5.0)),
            ("mid", m(400_000, 20, 40_000.0, 3.0)),
        ];
        let ranked = rank_entries(entries, &ScoringConfig::default());

        let names: Vec<_> = ranked.iter().map(|e| e.entity).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
        let ranks: Vec<_> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(ranked[0].tier, Tier::Diamond);
        assert_eq!(ranked[2].tier, Tier::Bronze);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let same = m(100_000, 5, 5_000.0, 4.0);
        let entries = vec![
            ("first", same),
            ("top", m(900_000, 45, 90_000.0, 5.0)),
            ("second", same),
            ("third", same),
        ];
        let ranked = rank_entries(entries, &ScoringConfig::default());

        let names: Vec<_> = ranked.iter().map(|e| e.entity).collect();
        assert_eq!(names, vec!["top", "first", "second", "third"]);
        assert_eq!(ranked[1].score, ranked[3].score);
    }

    #[test]
    fn test_reranking_is_idempotent() {
        let entries = vec![
            ("a", m(10_000, 3, 1_000.0, 4.0)),
            ("b", m(10_000, 3, 1_000.0, 4.0)),
            ("c", m(700_000, 1, 0.0, 2.0)),
            ("d", m(0, 40, 0.0, 5.0)),
        ];
        let first = rank_entries(entries.clone(), &ScoringConfig::default());
        let second = rank_entries(entries, &ScoringConfig::default());

        let a: Vec<_> = first.iter().map(|e| (e.rank, e.entity, e.score)).collect();
        let b: Vec<_> = second.iter().map(|e| (e.rank, e.entity, e.score)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let ranked = rank_entries(Vec::<((), KolMetrics)>::new(), &ScoringConfig::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_custom_tiers_used_for_entries() {
        let mut config = ScoringConfig::default();
        config.tiers.silver = 10.0;
        let ranked = rank_entries(vec![("x", m(0, 0, 0.0, 3.0))], &config);
        // 3/5 -> 60 * 0.2 = 12
        assert_eq!(ranked[0].tier, Tier::Silver);
    }
}
