use std::time::Duration;

use async_trait::async_trait;

/// Exponential backoff: at most `max_attempts` calls, waiting `base * 2^n` after failed attempt `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Backoff { max_attempts, base }
    }

    /// Delay after the zero-based failed `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether another call is allowed after `attempts_made` calls.
    pub fn can_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Every wait taken when all attempts fail (none after the last).
    #[cfg(test)]
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1)).map(|n| self.delay(n)).collect()
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
