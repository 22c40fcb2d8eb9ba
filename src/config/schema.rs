use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the profile JSON file (defaults to ~/.config/kol-board/profiles.json)
    #[serde(default)]
    pub profiles_path: Option<String>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cache: CacheSettings,
}

/// Social metrics provider settings.
///
/// Durations use humantime syntax: "3s", "500ms", "1m".
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub base_url: String,

    /// Bearer token sent with every request; falls back to KOL_BOARD_PROVIDER_TOKEN
    pub token: Option<String>,

    /// Delay before the single retry after a cold-cache miss
    pub retry_delay: String,

    /// Per-request timeout; a timed-out request counts as a provider error
    pub request_timeout: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/twitter".to_string(),
            token: None,
            retry_delay: "3s".to_string(),
            request_timeout: "10s".to_string(),
        }
    }
}

/// Environment variable consulted when the config has no provider token
pub const TOKEN_ENV_VAR: &str = "KOL_BOARD_PROVIDER_TOKEN";

impl ProviderConfig {
    /// Configured token, else KOL_BOARD_PROVIDER_TOKEN. Blank values count as unset.
    pub fn token(&self) -> Option<String> {
        self.token_or(std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn token_or(&self, from_env: Option<String>) -> Option<String> {
        self.token
            .clone()
            .or(from_env)
            .filter(|t| !t.trim().is_empty())
    }

    pub fn retry_delay(&self) -> anyhow::Result<Duration> {
        parse_duration("provider.retry_delay", &self.retry_delay)
    }

    pub fn request_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("provider.request_timeout", &self.request_timeout)
    }
}

/// Local feed cache settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub enabled: bool,
    /// How long a stored feed is served without asking the provider
    pub ttl: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: "15m".to_string(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> anyhow::Result<Duration> {
        parse_duration("cache.ttl", &self.ttl)
    }
}

fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| anyhow::anyhow!("{}: invalid duration '{}' - {}", field, value, e))
}
