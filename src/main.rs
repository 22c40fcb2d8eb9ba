use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kol_board::config::Config;
use kol_board::feed::{FeedFetcher, FeedResult, FeedState};
use kol_board::metrics::cache::{clear_cache, get_cache_path, read_cached_feed, write_cached_feed};
use kol_board::metrics::{CachedMetricsRecord, HttpMetricsProvider, PostSummary};
use kol_board::profiles::{get_profiles_path, JsonProfileStore, KolProfile, ProfileStore};
use kol_board::scoring::{calculate_score, rank_entries, KolMetrics, ScoringConfig, Tier};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank all stored profiles (default if no subcommand)
    Leaderboard(LeaderboardArgs),
    /// Score a set of metrics without storing anything
    Score {
        #[arg(long, default_value_t = 0)]
        followers: u64,
        #[arg(long, default_value_t = 0)]
        campaigns: u64,
        #[arg(long, default_value_t = 0.0)]
        earnings: f64,
        /// Average rating, 0-5
        #[arg(long, default_value_t = 0.0)]
        rating: f64,
    },
    /// Manage stored KOL profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show recent posts for one or more handles
    Feed {
        /// Social handles, with or without a leading @
        #[arg(required = true)]
        handles: Vec<String>,
        /// Owner id sent to the provider (defaults to the matching profile id)
        #[arg(long)]
        owner: Option<String>,
        /// Skip the local feed cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Manage the local feed cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug, Default)]
struct LeaderboardArgs {
    /// Only show profiles in this tier
    #[arg(long)]
    tier: Option<Tier>,
    /// Show at most N rows
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Create or update a profile; omitted fields keep their stored value
    Set {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        followers: Option<u64>,
        #[arg(long)]
        campaigns: Option<u64>,
        #[arg(long)]
        earnings: Option<f64>,
        #[arg(long)]
        rating: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Remove every cached feed
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "kol-board")]
#[command(about = "KOL leaderboard scoring and profile feed CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/kol-board/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "kol_board=debug" } else { "kol_board=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Leaderboard(LeaderboardArgs::default()));
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match kol_board::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate scoring config at startup
    let scoring = config.scoring.clone().unwrap_or_default();
    if let Err(errors) = kol_board::scoring::validate_scoring(&scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let code = match command {
        Commands::Leaderboard(args) => run_leaderboard(&config, &scoring, args),
        Commands::Score {
            followers,
            campaigns,
            earnings,
            rating,
        } => {
            let metrics = KolMetrics {
                followers,
                campaigns,
                earnings,
                rating,
            };
            let result = calculate_score(&metrics, &scoring);
            let use_colors = kol_board::output::should_use_colors();
            println!(
                "{}",
                kol_board::output::format_breakdown(&result, &scoring.tiers, use_colors)
            );
            EXIT_SUCCESS
        }
        Commands::Profile {
            action:
                ProfileAction::Set {
                    id,
                    name,
                    handle,
                    followers,
                    campaigns,
                    earnings,
                    rating,
                },
        } => {
            let update = ProfileUpdate {
                name,
                handle,
                followers,
                campaigns,
                earnings,
                rating,
            };
            run_profile_set(&config, &scoring, &id, update)
        }
        Commands::Feed {
            handles,
            owner,
            no_cache,
        } => run_feed(&config, handles, owner, no_cache).await,
        Commands::Cache {
            action: CacheAction::Clear,
        } => match clear_cache(&get_cache_path()) {
            Ok(()) => {
                println!("Feed cache cleared.");
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to clear cache: {:#}", e);
                EXIT_CONFIG
            }
        },
    };

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(code);
}

fn open_store(config: &Config) -> Result<JsonProfileStore, i32> {
    let path = match &config.profiles_path {
        Some(p) => PathBuf::from(p),
        None => match get_profiles_path() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Config error: {}", e);
                return Err(EXIT_CONFIG);
            }
        },
    };
    Ok(JsonProfileStore::new(path))
}

fn run_leaderboard(config: &Config, scoring: &ScoringConfig, args: LeaderboardArgs) -> i32 {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let profiles = match store.load_profiles() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load profiles: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    tracing::debug!(count = profiles.len(), path = %store.path().display(), "profiles loaded");

    let mut ranked = rank_entries(
        profiles.into_iter().map(|p| {
            let metrics = p.metrics();
            (p, metrics)
        }),
        scoring,
    );

    // Filters keep the rank from the full leaderboard
    if let Some(tier) = args.tier {
        ranked.retain(|entry| entry.tier == tier);
    }
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }

    match args.format {
        OutputFormat::Table => {
            let use_colors = kol_board::output::should_use_colors();
            println!(
                "{}",
                kol_board::output::format_leaderboard_table(&ranked, use_colors)
            );
        }
        OutputFormat::Tsv => {
            if !ranked.is_empty() {
                println!("{}", kol_board::output::format_tsv(&ranked));
            }
        }
        OutputFormat::Json => match kol_board::output::format_json(&ranked) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to encode leaderboard: {}", e);
                return EXIT_CONFIG;
            }
        },
    }

    EXIT_SUCCESS
}

struct ProfileUpdate {
    name: Option<String>,
    handle: Option<String>,
    followers: Option<u64>,
    campaigns: Option<u64>,
    earnings: Option<f64>,
    rating: Option<f64>,
}

fn run_profile_set(
    config: &Config,
    scoring: &ScoringConfig,
    id: &str,
    update: ProfileUpdate,
) -> i32 {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let existing = match store.get_profile(id) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load profiles: {:#}", e);
            return EXIT_CONFIG;
        }
    };
    let mut profile = existing.unwrap_or_else(|| KolProfile::new(id, id));

    if let Some(name) = update.name {
        profile.display_name = name;
    }
    if let Some(handle) = update.handle {
        profile.handle = Some(handle.trim_start_matches('@').to_string());
    }
    if let Some(followers) = update.followers {
        profile.followers = followers;
    }
    if let Some(campaigns) = update.campaigns {
        profile.campaigns_count = campaigns;
    }
    if let Some(earnings) = update.earnings {
        profile.total_earnings = earnings;
    }
    if let Some(rating) = update.rating {
        profile.rating = rating;
    }

    let result = calculate_score(&profile.metrics(), scoring);
    let tier = scoring.tiers.tier_for(result.score);

    if let Err(e) = store.upsert_profile(profile) {
        eprintln!("Failed to save profile: {:#}", e);
        return EXIT_CONFIG;
    }

    println!(
        "Saved profile {}: score {} ({})",
        id,
        kol_board::output::format_score(result.score),
        tier
    );
    EXIT_SUCCESS
}

/// Owner id for a handle: explicit flag, else the stored profile with that handle, else the handle
fn resolve_owner(handle: &str, owner: Option<&str>, profiles: &[KolProfile]) -> String {
    if let Some(owner) = owner {
        return owner.to_string();
    }
    profiles
        .iter()
        .find(|p| {
            p.handle
                .as_deref()
                .is_some_and(|h| h.trim_start_matches('@').eq_ignore_ascii_case(handle))
        })
        .map(|p| p.id.clone())
        .unwrap_or_else(|| handle.to_string())
}

enum FeedOutcome {
    Cached(Vec<PostSummary>),
    Fetched(FeedResult),
    Cancelled,
}

async fn run_feed(
    config: &Config,
    handles: Vec<String>,
    owner: Option<String>,
    no_cache: bool,
) -> i32 {
    let (retry_delay, request_timeout, ttl) = match (
        config.provider.retry_delay(),
        config.provider.request_timeout(),
        config.cache.ttl(),
    ) {
        (Ok(d), Ok(t), Ok(ttl)) => (d, t, ttl),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            eprintln!("Config error: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    let provider =
        match HttpMetricsProvider::new(&config.provider.base_url, config.provider.token()) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                return EXIT_CONFIG;
            }
        };
    let fetcher = FeedFetcher::new(provider)
        .with_retry_delay(retry_delay)
        .with_request_timeout(request_timeout);

    // Profiles only feed owner lookup; a broken store shouldn't block the feed
    let profiles = match open_store(config).map(|s| s.load_profiles()) {
        Ok(Ok(p)) => p,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "could not load profiles for owner lookup");
            Vec::new()
        }
        Err(_) => Vec::new(),
    };

    let use_cache = config.cache.enabled && !no_cache;
    let cache_path = get_cache_path();

    let handles: Vec<String> = handles
        .iter()
        .map(|h| h.trim_start_matches('@').to_string())
        .collect();

    let mut pending = FuturesUnordered::new();
    for (index, handle) in handles.iter().enumerate() {
        if use_cache {
            if let Some(record) = read_cached_feed(&cache_path, handle) {
                if record.is_fresh(ttl) {
                    tracing::debug!(handle = %handle, "serving feed from local cache");
                    pending.push(futures::future::Either::Left(futures::future::ready((
                        index,
                        FeedOutcome::Cached(record.posts),
                    ))));
                    continue;
                }
            }
        }

        let owner_id = resolve_owner(handle, owner.as_deref(), &profiles);
        let fetcher = fetcher.clone();
        let handle = handle.clone();
        pending.push(futures::future::Either::Right(async move {
            let mut feed = fetcher.spawn(&handle, &owner_id);
            let mut rx = feed.subscribe();
            loop {
                let state = rx.borrow_and_update().clone();
                if state == FeedState::Refreshing {
                    eprintln!(
                        "@{}: cold cache, retrying in {}",
                        handle,
                        humantime::format_duration(fetcher.retry_delay())
                    );
                }
                if state.is_terminal() || rx.changed().await.is_err() {
                    break;
                }
            }
            let outcome = match feed.wait().await {
                Some(result) => FeedOutcome::Fetched(result),
                None => FeedOutcome::Cancelled,
            };
            (index, outcome)
        }));
    }

    let mut outcomes: Vec<Option<FeedOutcome>> = handles.iter().map(|_| None).collect();
    while let Some((index, outcome)) = pending.next().await {
        outcomes[index] = Some(outcome);
    }

    let use_colors = kol_board::output::should_use_colors();
    let mut failures = 0;
    let mut blocks = Vec::new();
    for (handle, outcome) in handles.iter().zip(outcomes) {
        match outcome {
            Some(FeedOutcome::Cached(posts)) => {
                blocks.push(kol_board::output::format_feed(handle, &posts, use_colors));
            }
            Some(FeedOutcome::Fetched(FeedResult::Ready(posts))) => {
                if use_cache && !posts.is_empty() {
                    let record = CachedMetricsRecord::new(handle, posts.clone());
                    if let Err(e) = write_cached_feed(&cache_path, &record) {
                        tracing::warn!(handle = %handle, error = %e, "failed to cache feed");
                    }
                }
                blocks.push(kol_board::output::format_feed(handle, &posts, use_colors));
            }
            Some(FeedOutcome::Fetched(FeedResult::Failed(message))) => {
                failures += 1;
                blocks.push(format!("@{}\n  Failed to load posts: {}", handle, message));
            }
            Some(FeedOutcome::Cancelled) | None => {
                failures += 1;
                blocks.push(format!("@{}\n  Fetch cancelled", handle));
            }
        }
    }
    println!("{}", blocks.join("\n\n"));

    if failures == handles.len() {
        eprintln!("All feed requests failed. Check the provider URL and your network connection.");
        return EXIT_NETWORK;
    }
    EXIT_SUCCESS
}
