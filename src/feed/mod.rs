pub mod fetcher;
pub mod state;

pub use fetcher::{FeedFetcher, FeedHandle, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY};
pub use state::{FeedResult, FeedState};
