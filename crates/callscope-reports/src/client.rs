//! Shared HTTP client utilities

use callscope_core::{Error, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::warn;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Maximum number of fetch attempts (1 initial + retries)
    pub max_attempts: u32,

    /// Base backoff delay before the second attempt; doubles per attempt
    pub retry_base_delay_ms: u64,

    /// Value sent as both `User-Agent` and the upstream's `X-User-Agent`
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 32,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            user_agent: format!("Callscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
///
/// The client is created once per fetcher and reused across all page
/// requests; the upstream portal closes idle connections aggressively, so
/// idle connections are expired before the server does it for us.
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))
}

/// Retry policy for transient upstream errors
///
/// Runs `operation` up to `max_attempts` times. Only retryable errors
/// (upstream network/HTTP failures) trigger another attempt; everything
/// else short-circuits. The delay starts at `base_delay` before the second
/// attempt and doubles per attempt, with a warning logged before each
/// backoff sleep. The final attempt's error is propagated unchanged.
pub async fn with_retry<F, Fut, T>(max_attempts: u32, base_delay: Duration, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt >= max_attempts {
                    return Err(e);
                }
                let delay = base_delay * 2u32.pow(attempt - 1);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Report fetch attempt failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn upstream_err() -> Error {
        Error::UpstreamFetch {
            status: Some(503),
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.pool_max_idle_per_host, 32);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert!(config.user_agent.starts_with("Callscope/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default();
        assert!(create_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(3, Duration::from_millis(10), || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_short_circuits() {
        let attempts = AtomicU32::new(0);
        let result: Result<i32> = with_retry(3, Duration::from_millis(10), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Config("bad config".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_and_honors_backoff_schedule() {
        let attempts = AtomicU32::new(0);
        let start = Instant::now();
        let base = Duration::from_millis(20);

        let result = with_retry(3, base, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(upstream_err())
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // base before attempt 2, 2x base before attempt 3
        assert!(start.elapsed() >= base * 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_returns_final_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<i32> = with_retry(3, Duration::from_millis(5), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(upstream_err()) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        match result {
            Err(Error::UpstreamFetch { status, .. }) => assert_eq!(status, Some(503)),
            other => panic!("expected UpstreamFetch, got {other:?}"),
        }
    }
}
