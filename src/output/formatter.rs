use anyhow::Result;
use chrono::Duration;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{Width, terminal_size};

use crate::metrics::PostSummary;
use crate::profiles::KolProfile;
use crate::scoring::{RankedEntry, ScoreResult, Tier, TierThresholds};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Scores are shown with one decimal: "87.5", "0.0", "100.0"
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Format a count in compact notation (1.5k, 2.3M, 847)
pub fn format_compact(value: f64) -> String {
    let formatted = if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    formatted.replace(".0M", "M").replace(".0k", "k")
}

/// Tier name padded to the badge column, colored per tier when enabled
pub fn format_tier(tier: Tier, use_colors: bool) -> String {
    let label = format!("{:<8}", tier.as_str());
    if !use_colors {
        return label;
    }
    match tier {
        Tier::Diamond => label.cyan().bold().to_string(),
        Tier::Platinum => label.white().bold().to_string(),
        Tier::Gold => label.yellow().to_string(),
        Tier::Silver => label.bright_black().to_string(),
        Tier::Bronze => label.red().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn handle_label(profile: &KolProfile) -> String {
    profile
        .handle
        .as_deref()
        .map(|h| format!("@{}", h.trim_start_matches('@')))
        .unwrap_or_else(|| "-".to_string())
}

fn metrics_summary(profile: &KolProfile) -> String {
    format!(
        "{} followers  {} campaigns  ${} earned  {:.1}/5",
        format_compact(profile.followers as f64),
        profile.campaigns_count,
        format_compact(profile.total_earnings.max(0.0)),
        profile.rating
    )
}

/// Format the leaderboard as a table: rank, score, tier, name, handle, metrics
/// No headers. Rank is the position in the full ranking, so filtered
/// views keep the original numbers.
pub fn format_leaderboard_table(entries: &[RankedEntry<KolProfile>], use_colors: bool) -> String {
    if entries.is_empty() {
        return "No profiles found.".to_string();
    }

    let term_width = get_terminal_width();

    // Rank: 4 chars ("999."), score: 5 ("100.0"), tier: 8, separators: 2 each
    let rank_width = 4;
    let score_width = 5;
    let tier_width = 8;
    let separator = "  ";

    entries
        .iter()
        .map(|entry| {
            let profile = &entry.entity;
            let rank_str = format!("{:>width$}", format!("{}.", entry.rank), width = rank_width);
            let score_str = format!("{:>width$}", format_score(entry.score), width = score_width);
            let tier_str = format_tier(entry.tier, use_colors);
            let handle = handle_label(profile);
            let summary = metrics_summary(profile);

            let fixed_width = rank_width
                + score_width
                + tier_width
                + handle.chars().count()
                + summary.chars().count()
                + separator.len() * 5;

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(&profile.display_name, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_text(&profile.display_name, 20),
                // No terminal (pipe), don't truncate
                None => profile.display_name.clone(),
            };

            if use_colors {
                format!(
                    "{}{}{}{}{}{}{}{}{}{}{}",
                    rank_str.dimmed(),
                    separator,
                    score_str.bold(),
                    separator,
                    tier_str,
                    separator,
                    name,
                    separator,
                    handle.cyan(),
                    separator,
                    summary.dimmed()
                )
            } else {
                format!(
                    "{}{}{}{}{}{}{}{}{}{}{}",
                    rank_str, separator, score_str, separator, tier_str, separator, name,
                    separator, handle, separator, summary
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the leaderboard as tab-separated values for scripting
/// Columns: rank, score, tier, id, name, followers, campaigns, earnings, rating
pub fn format_tsv(entries: &[RankedEntry<KolProfile>]) -> String {
    entries
        .iter()
        .map(|entry| {
            let p = &entry.entity;
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                entry.rank,
                format_score(entry.score),
                entry.tier,
                p.id,
                p.display_name,
                p.followers,
                p.campaigns_count,
                p.total_earnings,
                p.rating
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardJsonRow<'a> {
    rank: usize,
    score: f64,
    tier: Tier,
    id: &'a str,
    display_name: &'a str,
    handle: Option<&'a str>,
    avatar_url: Option<&'a str>,
    display_metrics: DisplayMetrics,
}

#[derive(Serialize)]
struct DisplayMetrics {
    followers: u64,
    campaigns: u64,
    earnings: f64,
    rating: f64,
}

/// Format the leaderboard as pretty JSON: `[{rank, score, tier, displayMetrics, ..}]`
pub fn format_json(entries: &[RankedEntry<KolProfile>]) -> Result<String> {
    let rows: Vec<_> = entries
        .iter()
        .map(|entry| {
            let p = &entry.entity;
            LeaderboardJsonRow {
                rank: entry.rank,
                score: entry.score,
                tier: entry.tier,
                id: &p.id,
                display_name: &p.display_name,
                handle: p.handle.as_deref(),
                avatar_url: p.avatar_url.as_deref(),
                display_metrics: DisplayMetrics {
                    followers: p.followers,
                    campaigns: p.campaigns_count,
                    earnings: p.total_earnings,
                    rating: p.rating,
                },
            }
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Multi-line score explanation: one line per factor, then the total with
/// its tier and the distance to the next one up
pub fn format_breakdown(
    result: &ScoreResult,
    thresholds: &TierThresholds,
    use_colors: bool,
) -> String {
    let mut lines: Vec<String> = result
        .breakdown
        .factors
        .iter()
        .map(|f| {
            format!(
                "  {:<10} {:>12}  -> {:>5} x {:.2} = {:>5}",
                f.label,
                format_compact(f.raw),
                format_score(f.sub_score),
                f.weight,
                format!("{:.2}", f.weighted)
            )
        })
        .collect();

    let tier = thresholds.tier_for(result.score);
    // Tier::ALL is best first, so walk it backwards to find the next tier up
    let next = Tier::ALL
        .iter()
        .rev()
        .copied()
        .find(|t| *t > tier)
        .and_then(|t| thresholds.lower_bound(t).map(|bound| (t, bound)));

    let total = match next {
        Some((next_tier, bound)) => format!(
            "Score: {} ({}, {} to {})",
            format_score(result.score),
            tier,
            format_score(bound - result.score),
            next_tier
        ),
        None => format!("Score: {} ({})", format_score(result.score), tier),
    };
    if use_colors {
        lines.push(format!("{}", total.bold()));
    } else {
        lines.push(total);
    }
    lines.join("\n")
}

/// Format a feed: a header line, then one line per post
/// Post line: "  {age}  {likes} likes  {interactions} interactions  {text}"
pub fn format_feed(handle: &str, posts: &[PostSummary], use_colors: bool) -> String {
    let header = format!("@{}", handle.trim_start_matches('@'));
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    if posts.is_empty() {
        return format!("{}\n  No posts yet. Try refreshing again in a moment.", header);
    }

    let term_width = get_terminal_width();

    let mut lines = vec![header];
    for post in posts {
        let age = format!("{:>4}", format_age(post.age()));
        let stats = format!(
            "{:>5} likes {:>5} interactions",
            format_compact(post.engagement.likes as f64),
            format_compact(post.engagement.interactions() as f64)
        );
        // Posts can be multi-line; keep one row per post
        let text = post.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let fixed_width = 2 + age.len() + 2 + stats.len() + 2;
        let text = match term_width {
            Some(width) if width > fixed_width + 10 => truncate_text(&text, width - fixed_width),
            Some(_) => truncate_text(&text, 40),
            None => text,
        };

        if use_colors {
            lines.push(format!("  {}  {}  {}", age.dimmed(), stats.yellow(), text));
        } else {
            lines.push(format!("  {}  {}  {}", age, stats, text));
        }
    }
    lines.join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::sample_post;
    use crate::scoring::{calculate_score, rank_entries, KolMetrics, ScoringConfig};

    fn profile(id: &str, name: &str, followers: u64, campaigns: u64, earnings: f64, rating: f64) -> KolProfile {
        let mut p = KolProfile::new(id, name);
        p.handle = Some(format!("{}_calls", id));
        p.followers = followers;
        p.campaigns_count = campaigns;
        p.total_earnings = earnings;
        p.rating = rating;
        p
    }

    fn ranked() -> Vec<RankedEntry<KolProfile>> {
        let profiles = vec![
            profile("beta", "Beta Signals", 100_000, 5, 6_000.0, 4.0),
            profile("alpha", "Alpha Caller", 1_000_000, 60, 150_000.0, 5.0),
        ];
        rank_entries(
            profiles.into_iter().map(|p| {
                let m = p.metrics();
                (p, m)
            }),
            &ScoringConfig::default(),
        )
    }

    #[test]
    fn test_format_age_hours() {
        assert_eq!(format_age(Duration::hours(3)), "3h");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age(Duration::days(2)), "2d");
    }

    #[test]
    fn test_format_age_weeks() {
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }

    #[test]
    fn test_format_age_minutes() {
        assert_eq!(format_age(Duration::minutes(30)), "30m");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.0), "0.0");
        assert_eq!(format_score(100.0), "100.0");
        assert_eq!(format_score(22.74), "22.7");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(500.0), "500");
        assert_eq!(format_compact(1000.0), "1k");
        assert_eq!(format_compact(1500.0), "1.5k");
        assert_eq!(format_compact(1_000_000.0), "1M");
        assert_eq!(format_compact(2_300_000.0), "2.3M");
    }

    #[test]
    fn test_format_tier_plain() {
        assert_eq!(format_tier(Tier::Gold, false), "gold    ");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Short name", 20), "Short name");
        assert_eq!(truncate_text("Exact", 5), "Exact");
        assert_eq!(truncate_text("This is a very long name", 15), "This is a ve...");
        assert_eq!(truncate_text("Hello world", 3), "Hel");
    }

    #[test]
    fn test_leaderboard_table_empty() {
        assert_eq!(format_leaderboard_table(&[], false), "No profiles found.");
    }

    #[test]
    fn test_leaderboard_table_rows() {
        let entries = ranked();
        let result = format_leaderboard_table(&entries, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);

        assert!(lines[0].starts_with("  1."));
        assert!(lines[0].contains("100.0"));
        assert!(lines[0].contains("diamond"));
        assert!(lines[0].contains("Alpha Caller"));
        assert!(lines[0].contains("@alpha_calls"));
        assert!(lines[0].contains("1M followers"));

        assert!(lines[1].starts_with("  2."));
        assert!(lines[1].contains("bronze"));
        assert!(lines[1].contains("Beta Signals"));
        assert!(lines[1].contains("$6k earned"));
    }

    #[test]
    fn test_format_tsv() {
        let entries = ranked();
        let result = format_tsv(&entries);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').count(), 9);
        assert!(lines[0].starts_with("1\t100.0\tdiamond\talpha\t"));
        assert!(lines[1].starts_with("2\t23.0\tbronze\tbeta\t"));
        assert_eq!(format_tsv(&[]), "");
    }

    #[test]
    fn test_format_json() {
        let entries = ranked();
        let json = format_json(&entries).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["rank"], 1);
        assert_eq!(value[0]["tier"], "diamond");
        assert_eq!(value[0]["displayName"], "Alpha Caller");
        assert_eq!(value[0]["displayMetrics"]["followers"], 1_000_000);
        assert_eq!(value[1]["displayMetrics"]["campaigns"], 5);
    }

    #[test]
    fn test_format_breakdown() {
        let metrics = KolMetrics {
            followers: 200_000,
            campaigns: 10,
            earnings: 30_000.0,
            rating: 4.5,
        };
        let result = calculate_score(&metrics, &ScoringConfig::default());
        let text = format_breakdown(&result, &TierThresholds::default(), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("Followers"));
        assert!(lines[0].contains("200k"));
        assert!(lines[3].contains("Rating"));
        assert_eq!(lines[4], "Score: 36.5 (bronze, 8.5 to silver)");
    }

    #[test]
    fn test_format_breakdown_top_and_custom_tiers() {
        let saturated = KolMetrics {
            followers: 1_000_000,
            campaigns: 1000,
            earnings: 1_000_000.0,
            rating: 5.0,
        };
        let result = calculate_score(&saturated, &ScoringConfig::default());
        let text = format_breakdown(&result, &TierThresholds::default(), false);
        assert_eq!(text.lines().last(), Some("Score: 100.0 (diamond)"));

        let zero = calculate_score(&KolMetrics::default(), &ScoringConfig::default());
        let thresholds = TierThresholds {
            diamond: 80.0,
            platinum: 60.0,
            gold: 40.0,
            silver: 20.0,
        };
        let text = format_breakdown(&zero, &thresholds, false);
        assert_eq!(text.lines().last(), Some("Score: 0.0 (bronze, 20.0 to silver)"));
    }

    #[test]
    fn test_format_feed() {
        let mut post = sample_post("1");
        post.text = "gm\nnew campaign   live".to_string();
        let text = format_feed("@alpha_calls", &[post], false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "@alpha_calls");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("2h"));
        assert!(lines[1].contains("10 likes"));
        assert!(lines[1].contains("13 interactions"));
        assert!(lines[1].contains("gm new campaign live"));
    }

    #[test]
    fn test_format_empty_feed() {
        let text = format_feed("alpha", &[], false);
        assert!(text.starts_with("@alpha\n"));
        assert!(text.contains("No posts yet"));
    }
}
