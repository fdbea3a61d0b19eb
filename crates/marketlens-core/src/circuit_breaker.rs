use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::SourceError;

/// Runtime circuit state for upstream provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Shared breaker that stops hammering a provider once it keeps failing.
///
/// One breaker is shared by every concurrent fetch of an adapter, so a
/// provider outage short-circuits the rest of a collection run quickly.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Admits a call, moving an expired open circuit to half-open.
    ///
    /// # Errors
    /// Returns an `Unavailable` source error while the circuit is open.
    pub fn check(&self, provider: &str) -> Result<(), SourceError> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let expired = inner
            .opened_at
            .is_some_and(|opened_at| opened_at.elapsed() >= self.config.open_timeout);
        if expired {
            inner.state = CircuitState::HalfOpen;
            inner.opened_at = None;
            tracing::debug!(provider, "circuit half-open, probing upstream");
            return Ok(());
        }

        Err(SourceError::unavailable(format!(
            "{provider} circuit breaker is open; skipping upstream call"
        )))
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trips = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if trips && inner.state != CircuitState::Open {
            tracing::warn!(
                failures = inner.consecutive_failures,
                "circuit breaker opened after consecutive upstream failures"
            );
        }
        if trips {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CircuitInner> {
        self.inner
            .lock()
            .expect("circuit breaker lock is not poisoned")
    }
}
