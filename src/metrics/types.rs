use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
    #[serde(default)]
    pub impressions: u64,
}

impl EngagementCounts {
    /// Interactions excluding impressions
    pub fn interactions(&self) -> u64 {
        self.likes + self.reposts + self.replies + self.quotes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "engagement_counts", alias = "engagement")]
    pub engagement: EngagementCounts,
    pub author_handle: String,
    #[serde(default)]
    pub author_image: Option<String>,
}

impl PostSummary {
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

/// Where the provider got its answer from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Cache,
    FreshApi,
    Error,
}

/// Response body of the provider's posts endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub posts: Vec<PostSummary>,
    #[serde(default)]
    pub cached: bool,
    pub source: FeedSource,
    #[serde(default)]
    pub error: Option<String>,
}

/// A provider response reduced to the three cases the fetcher acts on
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// Posts served from the provider's cache. Empty when the profile has none.
    Hit(Vec<PostSummary>),
    /// Nothing cached yet; the provider is refreshing in the background
    Miss,
    /// Explicit failure reported by the provider
    Error(String),
}

impl ProviderResponse {
    pub fn hit(posts: Vec<PostSummary>) -> Self {
        Self {
            posts,
            cached: true,
            source: FeedSource::Cache,
            error: None,
        }
    }

    pub fn cold() -> Self {
        Self {
            posts: Vec::new(),
            cached: false,
            source: FeedSource::FreshApi,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            cached: false,
            source: FeedSource::Error,
            error: Some(message.into()),
        }
    }

    /// Classify the response. An error source or message wins over any
    /// posts that came along with it.
    pub fn outcome(self) -> ProviderOutcome {
        if self.source == FeedSource::Error || self.error.is_some() {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "metrics provider reported an error".to_string());
            return ProviderOutcome::Error(message);
        }

        // An empty answer is cold only if it didn't come from the provider's cache
        let cold = !self.cached || self.source == FeedSource::FreshApi;
        if self.posts.is_empty() && cold {
            ProviderOutcome::Miss
        } else {
            ProviderOutcome::Hit(self.posts)
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_post(id: &str) -> PostSummary {
    PostSummary {
        id: id.to_string(),
        text: format!("gm from post {}", id),
        created_at: Utc::now() - chrono::Duration::hours(2),
        engagement: EngagementCounts {
            likes: 10,
            reposts: 2,
            replies: 1,
            quotes: 0,
            impressions: 500,
        },
        author_handle: "alpha_calls".to_string(),
        author_image: None,
    }
}
