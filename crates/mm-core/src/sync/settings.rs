use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs for the sync engine.
///
/// Defaults match the shipped product behavior; tests shrink them to keep
/// paused-clock runs readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Delay between a trigger and the pipeline run, so bursts of
    /// connectivity callbacks coalesce into one pass.
    pub debounce_delay: Duration,
    /// How long a raw link-lost report must persist before it is believed.
    pub lost_debounce: Duration,
    /// Delay before re-running a pipeline whose connectivity check failed.
    pub retry_delay: Duration,
    /// Consecutive pipeline failures tolerated before giving up until the
    /// next external trigger.
    pub max_retry_attempts: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(3000),
            lost_debounce: Duration::from_millis(300),
            retry_delay: Duration::from_millis(5000),
            max_retry_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_constants() {
        let settings = SyncSettings::default();
        assert_eq!(settings.debounce_delay, Duration::from_millis(3000));
        assert_eq!(settings.lost_debounce, Duration::from_millis(300));
        assert_eq!(settings.retry_delay, Duration::from_millis(5000));
        assert_eq!(settings.max_retry_attempts, 3);
    }
}
