//! Batch calculator configuration.

use std::time::Duration;

/// Pacing, retry and timeout parameters for one batch.
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Delay between consecutive route requests within a pass (milliseconds).
    pub pacing_ms: u64,

    /// Delay before a retry pass (milliseconds).
    pub backoff_ms: u64,

    /// Retry passes allowed after the first pass.
    pub max_retries: u32,

    /// Emit a partial snapshot after this many processed destinations.
    pub snapshot_every: usize,

    /// Deadline for a single route request (milliseconds).
    /// A request that misses it counts as a failure.
    pub request_timeout_ms: u64,
}

impl CalculatorConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        pacing_ms: u64,
        backoff_ms: u64,
        max_retries: u32,
        snapshot_every: usize,
        request_timeout_ms: u64,
    ) -> Self {
        Self {
            pacing_ms,
            backoff_ms,
            max_retries,
            snapshot_every,
            request_timeout_ms,
        }
    }

    /// Returns the pacing delay as a Duration.
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Returns the retry back-off as a Duration.
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Returns the per-request deadline as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Snapshot interval, never zero.
    pub fn snapshot_interval(&self) -> usize {
        self.snapshot_every.max(1)
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 300,
            backoff_ms: 3_000,
            max_retries: 5,
            snapshot_every: 2,
            request_timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CalculatorConfig::default();

        assert_eq!(config.pacing_ms, 300);
        assert_eq!(config.backoff_ms, 3_000);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.snapshot_every, 2);
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn duration_methods() {
        let config = CalculatorConfig::default();

        assert_eq!(config.pacing(), Duration::from_millis(300));
        assert_eq!(config.backoff(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn custom_config() {
        let config = CalculatorConfig::new(10, 20, 2, 0, 30);

        assert_eq!(config.pacing(), Duration::from_millis(10));
        assert_eq!(config.backoff(), Duration::from_millis(20));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.snapshot_interval(), 1);
        assert_eq!(config.request_timeout(), Duration::from_millis(30));
    }
}
