use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::AuraConfig;
use crate::errors::AuraResult;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5000);

/// Exponential backoff applied to rate-limited calls only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl From<&AuraConfig> for RetryPolicy {
    fn from(config: &AuraConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
            base_delay: config
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BASE_DELAY),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed `attempt` (1-based): base, 2x base, 4x base...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-rate-limit error, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> AuraResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AuraResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limit() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        call = what,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit hit, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
