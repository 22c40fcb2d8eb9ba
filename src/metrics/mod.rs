pub mod cache;
pub mod provider;
pub mod types;

pub use cache::CachedMetricsRecord;
pub use provider::{HttpMetricsProvider, MetricsProvider, ProviderError};
pub use types::{EngagementCounts, FeedSource, PostSummary, ProviderOutcome, ProviderResponse};
