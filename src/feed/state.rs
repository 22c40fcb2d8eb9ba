use crate::metrics::PostSummary;

/// Terminal outcome of a feed fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FeedResult {
    /// Posts to show. Empty is valid: the provider had nothing even after the retry.
    Ready(Vec<PostSummary>),
    /// Provider error, to be shown to the user as-is
    Failed(String),
}

/// What an observer of an in-flight fetch sees
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    /// First answer was a cold miss; the single retry is scheduled
    Refreshing,
    Ready(Vec<PostSummary>),
    Failed(String),
}

impl FeedState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedState::Ready(_) | FeedState::Failed(_))
    }

    /// Posts visible in this state (none until ready)
    pub fn posts(&self) -> &[PostSummary] {
        match self {
            FeedState::Ready(posts) => posts,
            _ => &[],
        }
    }

    pub fn to_result(&self) -> Option<FeedResult> {
        match self {
            FeedState::Ready(posts) => Some(FeedResult::Ready(posts.clone())),
            FeedState::Failed(message) => Some(FeedResult::Failed(message.clone())),
            FeedState::Loading | FeedState::Refreshing => None,
        }
    }
}

impl From<FeedResult> for FeedState {
    fn from(result: FeedResult) -> Self {
        match result {
            FeedResult::Ready(posts) => FeedState::Ready(posts),
            FeedResult::Failed(message) => FeedState::Failed(message),
        }
    }
}
