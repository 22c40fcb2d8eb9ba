use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use super::state::{FeedResult, FeedState};
use crate::metrics::{MetricsProvider, PostSummary, ProviderError, ProviderOutcome};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries after the initial request. One retry means at most two provider calls.
const MAX_RETRIES: usize = 1;

/// Pulls a profile's posts from a metrics provider, retrying once after a
/// fixed delay when the provider's cache is still cold.
pub struct FeedFetcher<P> {
    provider: Arc<P>,
    retry_delay: Duration,
    request_timeout: Duration,
}

impl<P> Clone for FeedFetcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            retry_delay: self.retry_delay,
            request_timeout: self.request_timeout,
        }
    }
}

impl<P: MetricsProvider + 'static> FeedFetcher<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Fetch and wait for the final result.
    pub async fn fetch_profile_feed(&self, handle: &str, owner_id: &str) -> FeedResult {
        let outcome = run_fetch(
            self.provider.as_ref(),
            handle,
            owner_id,
            self.retry_delay,
            self.request_timeout,
            None,
        )
        .await;

        // Without a publisher nothing can cancel the fetch
        outcome.unwrap_or(FeedResult::Ready(Vec::new()))
    }

    /// Start a fetch in the background.
    ///
    /// The returned handle starts in `Loading`, moves to `Refreshing` if the
    /// first answer is a cold miss, and ends in `Ready` or `Failed`.
    pub fn spawn(&self, handle: &str, owner_id: &str) -> FeedHandle {
        let (tx, rx) = watch::channel(FeedState::Loading);
        let publisher = Publisher {
            tx,
            cancelled: Arc::new(Mutex::new(false)),
        };
        let cancelled = publisher.cancelled.clone();

        let provider = self.provider.clone();
        let retry_delay = self.retry_delay;
        let request_timeout = self.request_timeout;
        let handle = handle.to_string();
        let owner_id = owner_id.to_string();

        let task = tokio::spawn(async move {
            let outcome = run_fetch(
                provider.as_ref(),
                &handle,
                &owner_id,
                retry_delay,
                request_timeout,
                Some(&publisher),
            )
            .await;

            match outcome {
                Some(result) => {
                    publisher.publish(result.into());
                }
                None => tracing::debug!(handle = %handle, "feed fetch cancelled"),
            }
        });

        FeedHandle {
            state: rx,
            cancelled,
            task,
        }
    }
}

/// Observer side of a background fetch. Dropping it cancels the fetch.
pub struct FeedHandle {
    state: watch::Receiver<FeedState>,
    cancelled: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Current state, provisional or final
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// A receiver that sees every state the fetch publishes
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Wait for `Ready` or `Failed`. Returns None if the fetch was cancelled first.
    pub async fn wait(&mut self) -> Option<FeedResult> {
        let state = self.state.wait_for(FeedState::is_terminal).await.ok()?;
        state.to_result()
    }

    /// Stop the fetch: the pending retry never fires and the state is frozen.
    pub fn cancel(&self) {
        *self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Write side of a background fetch. The cancel flag is checked under its
/// lock while publishing, so nothing is published after `cancel()` returns.
struct Publisher {
    tx: watch::Sender<FeedState>,
    cancelled: Arc<Mutex<bool>>,
}

impl Publisher {
    fn is_cancelled(&self) -> bool {
        *self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: FeedState) -> bool {
        let cancelled = self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *cancelled {
            return false;
        }
        self.tx.send_replace(state);
        true
    }
}

#[derive(Debug)]
enum AttemptError {
    Cold,
    Failed(String),
    Cancelled,
}

/// Request, then retry once after `retry_delay` if the answer was a cold miss.
///
/// Returns None only when the publisher was cancelled before an attempt.
async fn run_fetch<P: MetricsProvider>(
    provider: &P,
    handle: &str,
    owner_id: &str,
    retry_delay: Duration,
    request_timeout: Duration,
    publisher: Option<&Publisher>,
) -> Option<FeedResult> {
    let strategy = FixedInterval::new(retry_delay).take(MAX_RETRIES);
    let mut attempt = 0usize;

    let outcome = RetryIf::spawn(
        strategy,
        move || {
            attempt += 1;
            let current = attempt;
            async move {
                if publisher.is_some_and(Publisher::is_cancelled) {
                    return Err(AttemptError::Cancelled);
                }

                tracing::debug!(handle, attempt = current, "requesting posts");
                let response = match tokio::time::timeout(
                    request_timeout,
                    provider.get_posts(handle, owner_id),
                )
                .await
                {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => return Err(AttemptError::Failed(e.to_string())),
                    Err(_) => {
                        let e = ProviderError::Timeout(request_timeout);
                        return Err(AttemptError::Failed(e.to_string()));
                    }
                };

                match response.outcome() {
                    ProviderOutcome::Hit(posts) => Ok(posts),
                    ProviderOutcome::Error(message) => Err(AttemptError::Failed(message)),
                    ProviderOutcome::Miss => {
                        if current <= MAX_RETRIES {
                            tracing::info!(
                                handle,
                                delay = %humantime::format_duration(retry_delay),
                                "provider cache is cold, retrying"
                            );
                            if let Some(publisher) = publisher {
                                publisher.publish(FeedState::Refreshing);
                            }
                        }
                        Err(AttemptError::Cold)
                    }
                }
            }
        },
        |e: &AttemptError| matches!(e, AttemptError::Cold),
    )
    .await;

    let result = match outcome {
        Ok(posts) => ready(handle, posts),
        Err(AttemptError::Cold) => {
            tracing::info!(handle, "still no posts after retry");
            FeedResult::Ready(Vec::new())
        }
        Err(AttemptError::Failed(message)) => {
            tracing::warn!(handle, error = %message, "feed fetch failed");
            FeedResult::Failed(message)
        }
        Err(AttemptError::Cancelled) => return None,
    };
    Some(result)
}

fn ready(handle: &str, posts: Vec<PostSummary>) -> FeedResult {
    tracing::debug!(handle, posts = posts.len(), "feed ready");
    FeedResult::Ready(posts)
}
