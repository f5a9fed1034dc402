//! Retry and backoff policy shared by every stage call and by comparisons.
//!
//! Failures are classified into transient, permanent and rate-limited.
//! Permanent failures are returned immediately; the other two are retried
//! with exponential backoff, rate limits starting from a longer base delay
//! (or the service's own retry hint).

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::clients::ServiceError;
use crate::error::AnalysisError;
use crate::models::ErrorClass;

/// Maps a collaborator error onto a retry class.
pub type Classifier = fn(&ServiceError) -> ErrorClass;

/// Default classification of collaborator errors.
pub fn classify_service_error(error: &ServiceError) -> ErrorClass {
    match error {
        ServiceError::RateLimited { .. } => ErrorClass::RateLimited,
        ServiceError::Http { status, .. } => match status {
            429 => ErrorClass::RateLimited,
            408 | 425 | 500..=599 => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        },
        ServiceError::Connection(_)
        | ServiceError::Timeout(_)
        | ServiceError::Parse(_)
        | ServiceError::Other(_) => ErrorClass::Transient,
        ServiceError::InvalidInput(_) | ServiceError::Unsupported(_) => ErrorClass::Permanent,
    }
}

/// Final failure after the policy gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub kind: ErrorClass,
    pub message: String,
}

/// Result of a policy-wrapped call with the number of calls made.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, StageFailure>,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first.
    pub max_attempts: u32,
    /// First backoff delay for transient failures.
    pub base_delay: Duration,
    pub backoff_factor: f64,
    /// First backoff delay for rate-limited failures without a hint.
    pub rate_limit_delay: Duration,
    /// Ceiling for any single backoff, including service hints.
    pub max_delay: Duration,
    /// Per-call timeout; a timeout counts as a transient failure.
    pub call_timeout: Option<Duration>,
    classifier: Classifier,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("max_delay", &self.max_delay)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            rate_limit_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            call_timeout: Some(Duration::from_secs(120)),
            classifier: classify_service_error,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classify(&self, error: &ServiceError) -> ErrorClass {
        (self.classifier)(error)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_attempts == 0 {
            return Err(AnalysisError::InvalidRetryPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(AnalysisError::InvalidRetryPolicy(format!(
                "backoff factor must be >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        if self.call_timeout == Some(Duration::ZERO) {
            return Err(AnalysisError::InvalidRetryPolicy(
                "call timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Delay before the next call, after `attempt` (1-based) failed.
    pub fn delay_for(
        &self,
        class: ErrorClass,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> Duration {
        let base = match class {
            ErrorClass::RateLimited => {
                if let Some(hint) = retry_after {
                    return hint.min(self.max_delay);
                }
                self.rate_limit_delay
            }
            _ => self.base_delay,
        };
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = base.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("{}: attempt {}/{}", label, attempt, max_attempts);

            let outcome = match self.call_timeout {
                Some(limit) => match tokio::time::timeout(limit, call()).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::Timeout(limit)),
                },
                None => call().await,
            };

            let error = match outcome {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };

            let class = self.classify(&error);
            if !class.is_retryable() || attempt >= max_attempts {
                if class.is_retryable() {
                    warn!("{} failed after {} attempts: {}", label, attempt, error);
                } else {
                    debug!("{} failed permanently: {}", label, error);
                }
                return Attempted {
                    result: Err(StageFailure {
                        kind: class,
                        message: error.to_string(),
                    }),
                    attempts: attempt,
                };
            }

            let wait = self.delay_for(class, attempt, error.retry_after());
            warn!(
                "{} {} failure (attempt {}/{}), retrying in {:?}: {}",
                label, class, attempt, max_attempts, wait, error
            );
            tokio::time::sleep(wait).await;
        }
    }
}
