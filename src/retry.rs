//! Retry policies for publish requests
//!
//! A [`RetryPolicy`] decides whether a failed attempt is repeated and how
//! long to wait first. [`with_retry`] hosts a policy around a single
//! operation and also marks the status-class meters for every response it
//! sees.
//!
//! ## Retryable outcomes
//!
//! - transport failures and timeouts
//! - responses whose status the policy lists (default 429, 500, 502, 503)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use a3s_nakadi::RetryConfig;
//!
//! let config = RetryConfig::default(); // 3 retries, 1s base, 30s max
//! ```

use crate::error::Result;
use crate::metrics::{Meter, MetricCollector};
use crate::transport::Response;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Strategy for retrying a failed publish attempt
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Delay before the attempt following `attempt` (0-indexed), or `None`
    /// to give up and surface the last outcome
    ///
    /// `retry_after` carries the broker's `Retry-After` hint when present.
    fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Option<Duration>;

    /// Whether a response with this status should be retried
    fn is_retryable_status(&self, status: u16) -> bool;

    /// A finished policy is skipped: the operation runs exactly once
    fn is_finished(&self) -> bool {
        false
    }
}

/// Exponential backoff with jitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential growth)
    pub max_delay_ms: u64,
    /// HTTP status codes that trigger a retry
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            retryable_status_codes: vec![429, 500, 502, 503],
        }
    }
}

impl RetryConfig {
    /// Create a retry config with no retries (disabled)
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    ///
    /// Uses exponential backoff: `base_delay * 2^attempt`, capped at `max_delay`.
    /// Adds jitter of ±25% to avoid thundering herd.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp_delay = self.base_delay_ms.saturating_mul(1u64 << attempt.min(10));
        let capped = exp_delay.min(self.max_delay_ms);

        let jitter_range = capped / 4;
        let jittered = if jitter_range > 0 {
            let jitter_offset = (attempt as u64 * 7 + 3) % (jitter_range * 2 + 1);
            capped - jitter_range + jitter_offset
        } else {
            capped
        };

        Duration::from_millis(jittered)
    }

    /// Parse a `Retry-After` header value in seconds.
    ///
    /// Accepts integer or decimal seconds in (0, 300]; anything else is `None`.
    pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
        let value = header_value?.trim();
        if let Ok(seconds) = value.parse::<f64>() {
            if seconds > 0.0 && seconds <= 300.0 {
                return Some(Duration::from_secs_f64(seconds));
            }
        }
        None
    }
}

impl RetryPolicy for RetryConfig {
    fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        Some(retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt)))
    }

    fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }
}

/// Execute a publish operation under an optional retry policy.
///
/// The `operation` closure is called with the attempt number. Without a
/// policy, or with a finished one, it runs exactly once. Otherwise retryable
/// outcomes are repeated until the policy stops, and the last outcome is
/// returned as-is: a response for a retryable status, the error for a
/// transport failure.
pub async fn with_retry<F, Fut>(
    policy: Option<&dyn RetryPolicy>,
    metrics: &dyn MetricCollector,
    operation: F,
) -> Result<Response>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Response>>,
{
    let policy = match policy {
        Some(policy) if policy.is_finished() => {
            metrics.mark(Meter::RetrySkipFinished);
            tracing::warn!(?policy, "Retry policy already finished, sending once");
            None
        }
        other => other,
    };

    let mut attempt = 0u32;
    loop {
        let outcome = operation(attempt).await;

        if let Ok(response) = &outcome {
            for meter in Meter::for_error_status(response.status()) {
                metrics.mark(meter);
            }
        }

        let Some(policy) = policy else {
            return outcome;
        };

        let (retryable, retry_after) = match &outcome {
            Ok(response) => (
                policy.is_retryable_status(response.status()),
                RetryConfig::parse_retry_after(response.header("retry-after")),
            ),
            Err(e) => (e.is_transient(), None),
        };

        if !retryable {
            if attempt > 0 {
                tracing::info!(retries = attempt, "Publish request completed after retries");
            }
            return outcome;
        }

        match policy.backoff(attempt, retry_after) {
            Some(delay) => {
                match &outcome {
                    Ok(response) => tracing::warn!(
                        status = response.status(),
                        attempt = attempt + 1,
                        ?delay,
                        "Publish request failed, retrying"
                    ),
                    Err(e) => tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        ?delay,
                        "Publish request failed, retrying"
                    ),
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::metrics::MemoryMetricCollector;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..Default::default()
        }
    }

    #[derive(Debug)]
    struct Finished;

    impl RetryPolicy for Finished {
        fn backoff(&self, _attempt: u32, _retry_after: Option<Duration>) -> Option<Duration> {
            Some(Duration::from_millis(1))
        }

        fn is_retryable_status(&self, _status: u16) -> bool {
            true
        }

        fn is_finished(&self) -> bool {
            true
        }
    }

    // ========================================================================
    // RetryConfig unit tests
    // ========================================================================

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30_000);
        assert_eq!(config.retryable_status_codes, vec![429, 500, 502, 503]);
    }

    #[test]
    fn test_is_retryable_status() {
        let config = RetryConfig::default();
        assert!(config.is_retryable_status(429));
        assert!(config.is_retryable_status(503));
        assert!(!config.is_retryable_status(207));
        assert!(!config.is_retryable_status(422));
        assert!(!config.is_retryable_status(400));
    }

    #[test]
    fn test_delay_for_attempt_exponential() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            ..Default::default()
        };

        let d0 = config.delay_for_attempt(0);
        assert!(d0.as_millis() >= 750 && d0.as_millis() <= 1250);

        let d1 = config.delay_for_attempt(1);
        assert!(d1.as_millis() >= 1500 && d1.as_millis() <= 2500);

        let d2 = config.delay_for_attempt(2);
        assert!(d2.as_millis() >= 3000 && d2.as_millis() <= 5000);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            ..Default::default()
        };
        assert!(config.delay_for_attempt(10).as_millis() <= 6250);
    }

    #[test]
    fn test_backoff_stops_after_max_retries() {
        let config = fast(2);
        assert!(config.backoff(0, None).is_some());
        assert!(config.backoff(1, None).is_some());
        assert!(config.backoff(2, None).is_none());
        assert!(RetryConfig::disabled().backoff(0, None).is_none());
    }

    #[test]
    fn test_backoff_prefers_retry_after() {
        let config = RetryConfig::default();
        assert_eq!(
            config.backoff(0, Some(Duration::from_secs(2))),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            RetryConfig::parse_retry_after(Some("5")),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            RetryConfig::parse_retry_after(Some(" 1.5 ")),
            Some(Duration::from_secs_f64(1.5))
        );
        assert_eq!(RetryConfig::parse_retry_after(None), None);
        assert_eq!(RetryConfig::parse_retry_after(Some("soon")), None);
        assert_eq!(RetryConfig::parse_retry_after(Some("0")), None);
        assert_eq!(RetryConfig::parse_retry_after(Some("301")), None);
    }

    #[test]
    fn test_retry_config_serde() {
        let json = r#"{"maxRetries":5,"retryableStatusCodes":[429]}"#;
        let config: RetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.retryable_status_codes, vec![429]);

        let out = serde_json::to_string(&config).unwrap();
        assert!(out.contains("\"maxDelayMs\":30000"));
    }

    // ========================================================================
    // with_retry
    // ========================================================================

    #[tokio::test]
    async fn test_no_policy_runs_once() {
        let metrics = MemoryMetricCollector::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(None, &metrics, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::new(503, ""))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 503);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.count(Meter::Http5xx), 1);
        assert_eq!(metrics.count(Meter::Http503), 1);
    }

    #[tokio::test]
    async fn test_retries_status_until_success() {
        let metrics = MemoryMetricCollector::new();
        let policy = fast(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(Some(&policy), &metrics, |attempt| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Ok(Response::new(429, ""))
                } else {
                    Ok(Response::new(200, ""))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 200);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.count(Meter::Http429), 2);
        assert_eq!(metrics.count(Meter::Http4xx), 2);
    }

    #[tokio::test]
    async fn test_exhausted_returns_last_response() {
        let metrics = MemoryMetricCollector::new();
        let policy = fast(2);
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(Some(&policy), &metrics, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::new(500, "down"))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 500);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.count(Meter::Http500), 3);
    }

    #[tokio::test]
    async fn test_transport_error_retried_then_surfaced() {
        let metrics = MemoryMetricCollector::new();
        let policy = fast(1);
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(Some(&policy), &metrics, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PublishError::Transport {
                    url: "u".into(),
                    reason: "reset".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(PublishError::Transport { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_not_repeated() {
        let metrics = MemoryMetricCollector::new();
        let policy = fast(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(Some(&policy), &metrics, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::new(422, "[]"))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 422);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.count(Meter::Http422), 1);
    }

    #[tokio::test]
    async fn test_success_marks_no_status_meters() {
        let metrics = MemoryMetricCollector::new();
        with_retry(None, &metrics, |_| async { Ok(Response::new(207, "[]")) })
            .await
            .unwrap();
        assert!(metrics.meters().is_empty());
    }

    #[tokio::test]
    async fn test_finished_policy_skipped_and_marked() {
        let metrics = MemoryMetricCollector::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(Some(&Finished), &metrics, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::new(503, ""))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 503);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.count(Meter::RetrySkipFinished), 1);
    }

    #[tokio::test]
    async fn test_respects_retry_after_header() {
        let metrics = MemoryMetricCollector::new();
        let policy = fast(1);

        let start = tokio::time::Instant::now();
        let result = with_retry(Some(&policy), &metrics, |attempt| async move {
            if attempt == 0 {
                Ok(Response::new(429, "").with_header("Retry-After", "0.1"))
            } else {
                Ok(Response::new(200, ""))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.status(), 200);
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
