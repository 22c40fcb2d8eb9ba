use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use super::types::ProviderResponse;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited by metrics provider (429)")]
    RateLimited,

    #[error("metrics provider returned HTTP {0}")]
    Status(u16),

    #[error("request to metrics provider failed: {0}")]
    Transport(String),

    #[error("could not decode metrics provider response: {0}")]
    Decode(String),

    #[error("metrics provider did not answer within {}", humantime::format_duration(*.0))]
    Timeout(Duration),
}

/// Source of social posts for a profile handle.
pub trait MetricsProvider: Send + Sync {
    /// Fetch the posts for `handle` on behalf of the profile `owner_id`.
    fn get_posts(
        &self,
        handle: &str,
        owner_id: &str,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;
}

/// Provider backed by the marketplace's posts endpoint:
/// `GET {base_url}/posts?username={handle}&user_id={owner_id}`
#[derive(Debug, Clone)]
pub struct HttpMetricsProvider {
    client: reqwest::Client,
    posts_url: Url,
    token: Option<String>,
}

impl HttpMetricsProvider {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let posts_url = Url::parse(&format!("{}/posts", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid metrics provider URL '{}'", base_url))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("kol-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            posts_url,
            token,
        })
    }

    fn request_url(&self, handle: &str, owner_id: &str) -> Url {
        let mut url = self.posts_url.clone();
        url.query_pairs_mut()
            .append_pair("username", handle.trim_start_matches('@'))
            .append_pair("user_id", owner_id);
        url
    }
}

impl MetricsProvider for HttpMetricsProvider {
    async fn get_posts(
        &self,
        handle: &str,
        owner_id: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut request = self.client.get(self.request_url(handle, owner_id));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            // Error bodies in the provider's own shape carry a better message than the status
            return match serde_json::from_slice::<ProviderResponse>(&body) {
                Ok(parsed) if parsed.error.is_some() => Ok(parsed),
                _ => Err(ProviderError::Status(status.as_u16())),
            };
        }

        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::{FeedSource, ProviderOutcome};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn new_provider(base: &str, token: Option<String>) -> Result<HttpMetricsProvider> {
        let _ = rustls::crypto::ring::default_provider().install_default();
        HttpMetricsProvider::new(base, token)
    }

    /// Serve exactly one canned HTTP response and hand back the request line.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{}/api/twitter", addr), handle)
    }

    #[test]
    fn test_request_url() {
        let provider = new_provider("https://example.com/api/twitter/", None).unwrap();
        let url = provider.request_url("@alpha calls", "kol-1");
        assert_eq!(
            url.as_str(),
            "https://example.com/api/twitter/posts?username=alpha+calls&user_id=kol-1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = new_provider("not a url", None).unwrap_err();
        assert!(err.to_string().contains("Invalid metrics provider URL"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(10)).to_string(),
            "metrics provider did not answer within 10s"
        );
        assert_eq!(ProviderError::Status(502).to_string(), "metrics provider returned HTTP 502");
    }

    #[tokio::test]
    async fn test_decodes_posts() {
        let body = r#"{"posts":[{"id":"1","text":"gm","created_at":"2024-05-01T12:00:00Z","author_handle":"alpha"}],"cached":true,"source":"cache"}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let provider = new_provider(&base, Some("secret".to_string())).unwrap();
        let response = provider.get_posts("alpha", "kol-1").await.unwrap();

        assert_eq!(response.source, FeedSource::Cache);
        assert_eq!(response.posts.len(), 1);
        let request_line = server.await.unwrap();
        assert_eq!(
            request_line,
            "GET /api/twitter/posts?username=alpha&user_id=kol-1 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_rate_limited_status() {
        let (base, server) = serve_once("429 Too Many Requests", "{}").await;
        let provider = new_provider(&base, None).unwrap();

        let err = provider.get_posts("alpha", "kol-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_body_on_failure_status() {
        let (base, server) =
            serve_once("500 Internal Server Error", r#"{"source":"error","error":"upstream down"}"#).await;
        let provider = new_provider(&base, None).unwrap();

        let response = provider.get_posts("alpha", "kol-1").await.unwrap();
        assert_eq!(
            response.outcome(),
            ProviderOutcome::Error("upstream down".to_string())
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_plain_failure_status() {
        let (base, server) = serve_once("502 Bad Gateway", "oops").await;
        let provider = new_provider(&base, None).unwrap();

        let err = provider.get_posts("alpha", "kol-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status(502)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (base, server) = serve_once("200 OK", "<html></html>").await;
        let provider = new_provider(&base, None).unwrap();

        let err = provider.get_posts("alpha", "kol-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        server.await.unwrap();
    }
}
