//! Sliding-window rate limiting for embedding providers.
//!
//! One `RateLimiter` per model configuration, owned by the flow that issues
//! the calls. Not a process-wide singleton: callers construct one and thread
//! it through. Per-minute saturation blocks until a slot frees; per-day
//! saturation is fatal for the rest of the day.

use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};
use tracing::warn;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("daily request limit of {limit} reached, no further calls until the window expires")]
    DailyLimitExceeded { limit: usize },
}

/// Request ceilings for one model configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub per_minute: usize,
    pub per_day: usize,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_minute: 60,
            per_day: 10_000,
        }
    }
}

/// Tracks call timestamps against per-minute and per-day ceilings.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    minute_calls: Vec<Instant>,
    day_calls: Vec<Instant>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            minute_calls: Vec::new(),
            day_calls: Vec::new(),
        }
    }

    /// Reserve a slot for one call. Waits while the per-minute window is
    /// full; errors when the per-day window is full.
    pub async fn acquire(&mut self) -> Result<(), RateLimitError> {
        self.prune(Instant::now());

        if self.day_calls.len() >= self.limits.per_day {
            return Err(RateLimitError::DailyLimitExceeded {
                limit: self.limits.per_day,
            });
        }

        while self.minute_calls.len() >= self.limits.per_minute {
            // Oldest entry decides when the next slot frees.
            let oldest = self.minute_calls[0];
            let wait = (oldest + MINUTE).saturating_duration_since(Instant::now());
            warn!(
                wait_ms = wait.as_millis() as u64,
                per_minute = self.limits.per_minute,
                "per-minute rate limit reached, waiting"
            );
            sleep(wait).await;
            self.prune(Instant::now());
        }

        let now = Instant::now();
        self.minute_calls.push(now);
        self.day_calls.push(now);
        Ok(())
    }

    /// Calls recorded in the current day window.
    pub fn daily_used(&self) -> usize {
        self.day_calls.len()
    }

    fn prune(&mut self, now: Instant) {
        self.minute_calls
            .retain(|t| now.saturating_duration_since(*t) < MINUTE);
        self.day_calls
            .retain(|t| now.saturating_duration_since(*t) < DAY);
    }
}
