use rand::Rng;
use std::time::Duration;

use crate::config::UxConfig;

/// Random pause before user-facing mutations, for clients that expect a
/// perceptible delay. Disabled when both bounds are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latency {
    min_ms: u64,
    max_ms: u64,
}

impl Latency {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.max_ms > 0
    }

    #[must_use]
    pub fn sample(&self) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        let low = self.min_ms.min(self.max_ms);
        Duration::from_millis(rand::rng().random_range(low..=self.max_ms))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl From<&UxConfig> for Latency {
    fn from(config: &UxConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }
}
