pub mod formatter;

pub use formatter::{
    format_age, format_breakdown, format_compact, format_feed, format_json,
    format_leaderboard_table, format_score, format_tier, format_tsv, should_use_colors,
};
