//! Transport-level retry utilities.
//!
//! The sync engine itself never retries; transient failures are
//! absorbed below it by wrapping the HTTP transport in
//! [`RetryingTransport`], which retries connection errors and
//! rate-limit/server statuses with exponential backoff.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use crate::api::is_retryable_status;
use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use crate::sync::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_TRANSPORT_RETRIES, ProgressCallback, SyncProgress,
    emit,
};

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_TRANSPORT_RETRIES as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Build the default exponential backoff strategy for API requests.
///
/// - Initial delay: 1 second
/// - Maximum delay: 60 seconds
/// - Maximum retries: 5
/// - Jitter: enabled
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Per-attempt failure inside the retry loop.
///
/// A retryable HTTP status is demoted to an error here so the backoff
/// machinery sees it; if retries run out, the final response is handed
/// back unchanged for the API layer to report.
#[derive(Debug)]
enum AttemptError {
    Http(HttpError),
    Status(HttpResponse),
}

fn short_attempt_message(err: &AttemptError) -> String {
    match err {
        AttemptError::Http(e) => e.to_string(),
        AttemptError::Status(response) => format!("HTTP {}", response.status),
    }
}

/// An [`HttpTransport`] decorator that retries transient failures.
///
/// Retries connection-level errors and responses whose status is
/// retryable (429 and 5xx) with exponential backoff. Everything above
/// this layer sees at most one success or one final failure per
/// request.
pub struct RetryingTransport {
    inner: Arc<dyn HttpTransport>,
    config: RetryConfig,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            on_progress: None,
        }
    }

    /// Attach a progress callback notified on every retry.
    #[must_use]
    pub fn with_progress(mut self, on_progress: Arc<ProgressCallback>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

#[async_trait]
impl HttpTransport for RetryingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        // Track attempt number for progress reporting
        let attempt = AtomicU32::new(0);

        let operation = || {
            attempt.fetch_add(1, Ordering::SeqCst);
            let request = request.clone();
            async move {
                match self.inner.send(request).await {
                    Ok(response) if is_retryable_status(response.status) => {
                        Err(AttemptError::Status(response))
                    }
                    Ok(response) => Ok(response),
                    Err(e) => Err(AttemptError::Http(e)),
                }
            }
        };

        let result = operation
            .retry(self.config.clone().into_backoff())
            .notify(|err, dur| {
                let current_attempt = attempt.load(Ordering::SeqCst);
                emit(
                    self.on_progress.as_deref(),
                    SyncProgress::TransportRetry {
                        attempt: current_attempt,
                        delay_ms: dur.as_millis() as u64,
                        error: short_attempt_message(err),
                    },
                );
                tracing::debug!(
                    "Transient failure on {}, retrying in {:?} (attempt {}): {}",
                    request.url,
                    dur,
                    current_attempt,
                    short_attempt_message(err)
                );
            })
            .when(|e| {
                matches!(
                    e,
                    AttemptError::Status(_) | AttemptError::Http(HttpError::Transport(_))
                )
            })
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(AttemptError::Status(response)) => Ok(response),
            Err(AttemptError::Http(e)) => Err(e),
        }
    }
}
