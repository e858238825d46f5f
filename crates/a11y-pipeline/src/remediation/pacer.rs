/// Request pacing for the AI suggestion service.
///
/// The generator calls `pause` after every AI attempt, successful or not. What
/// matters to the provider is the request rate, not the number in flight.
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a fixed delay after each attempt.
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "pacing AI requests");
        tokio::time::sleep(self.delay).await;
    }
}

/// Token bucket that waits for a token instead of rejecting.
#[derive(Clone)]
pub struct TokenBucketPacer {
    per_second: f64,
    burst: f64,
    max_wait: Duration,
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    tokens: f64,
    last: Instant,
}

impl TokenBucketPacer {
    /// `per_second` must be positive and finite, and slow enough rates that one
    /// token's wait does not fit in a `Duration` are refused. `burst` is clamped
    /// to at least one token.
    pub fn new(per_second: f64, burst: u32) -> Option<Self> {
        if !per_second.is_finite() || per_second <= 0.0 {
            return None;
        }
        let max_wait = Duration::try_from_secs_f64(1.0 / per_second).ok()?;
        let burst = f64::from(burst.max(1));
        Some(Self {
            per_second,
            burst,
            max_wait,
            state: Arc::new(Mutex::new(State {
                tokens: burst,
                last: Instant::now(),
            })),
        })
    }

    /// Take a token if one is available, otherwise report how long until one is.
    async fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last);
        state.last = now;

        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.per_second).min(self.burst);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Ok(());
        }
        let wait = (1.0 - state.tokens) / self.per_second;
        Err(Duration::try_from_secs_f64(wait).map_or(self.max_wait, |w| w.min(self.max_wait)))
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn pause(&self) {
        while let Err(wait) = self.try_take().await {
            debug!(wait_ms = wait.as_millis() as u64, "waiting for AI request token");
            tokio::time::sleep(wait).await;
        }
    }
}

/// No pacing at all. For tests and offline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}
