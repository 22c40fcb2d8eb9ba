use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::types::PostSummary;

/// Last resolved feed for one handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMetricsRecord {
    pub handle: String,
    pub posts: Vec<PostSummary>,
    pub fetched_at: u64, // Unix timestamp
}

impl CachedMetricsRecord {
    pub fn new(handle: &str, posts: Vec<PostSummary>) -> Self {
        Self {
            handle: normalize_handle(handle),
            posts,
            fetched_at: unix_now(),
        }
    }

    /// Check if the record is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        unix_now().saturating_sub(self.fetched_at) < ttl.as_secs()
    }
}

/// Get the platform-appropriate cache directory for kol-board
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("kol-board/feeds"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/kol-board/feeds",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the feed cache directory
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Read the cached feed for a handle. Unreadable entries count as absent.
pub fn read_cached_feed(cache_path: &Path, handle: &str) -> Option<CachedMetricsRecord> {
    let bytes = cacache::read_sync(cache_path, cache_key(handle)).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn write_cached_feed(cache_path: &Path, record: &CachedMetricsRecord) -> Result<()> {
    let json = serde_json::to_vec(record)?;
    cacache::write_sync(cache_path, cache_key(&record.handle), &json)
        .with_context(|| format!("Failed to write feed cache for @{}", record.handle))?;
    Ok(())
}

fn cache_key(handle: &str) -> String {
    format!("feed:{}", normalize_handle(handle))
}

/// Handles are case-insensitive and may be written with a leading '@'
fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_ascii_lowercase()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::sample_post;
    use std::env;

    fn temp_cache(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("kol_board_test_cache_{}", name));
        let _ = std::fs::remove_dir_all(&path);
        path
    }

    #[test]
    fn test_write_and_read() {
        let path = temp_cache("roundtrip");
        let record = CachedMetricsRecord::new("@Alpha_Calls", vec![sample_post("1")]);
        write_cached_feed(&path, &record).unwrap();

        // Lookup ignores case and '@'
        let loaded = read_cached_feed(&path, "alpha_calls").unwrap();
        assert_eq!(loaded.handle, "alpha_calls");
        assert_eq!(loaded.posts.len(), 1);
        assert!(read_cached_feed(&path, "someone_else").is_none());

        clear_cache(&path).unwrap();
        assert!(read_cached_feed(&path, "alpha_calls").is_none());
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let path = temp_cache("never_created");
        assert!(clear_cache(&path).is_ok());
    }

    #[test]
    fn test_freshness() {
        let mut record = CachedMetricsRecord::new("alpha", vec![]);
        assert!(record.is_fresh(Duration::from_secs(60)));

        record.fetched_at -= 120;
        assert!(!record.is_fresh(Duration::from_secs(60)));
        assert!(record.is_fresh(Duration::from_secs(600)));
        assert!(!record.is_fresh(Duration::ZERO));
    }
}
