//! Quota pacing
//!
//! Google limits each project to a number of requests per time window. The
//! pacer spreads that budget evenly: every outbound call first waits
//! `window / budget`.

use std::time::Duration;

use core_runtime::config::QuotaConfig;
use tracing::trace;

use crate::error::Result;

/// Fixed delay inserted before every remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPacer {
    delay: Duration,
}

impl QuotaPacer {
    /// Build a pacer from a quota, rejecting a zero or negative budget and a
    /// delay above the maximum.
    pub fn new(quota: QuotaConfig) -> Result<Self> {
        let delay = quota.delay()?;
        Ok(Self { delay })
    }

    /// Pacer that never waits
    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Suspend the caller for the pacing delay. A zero delay returns
    /// immediately without touching the timer.
    pub async fn pace(&self) {
        if self.delay.is_zero() {
            return;
        }
        trace!(delay_ms = self.delay.as_millis() as u64, "Pacing remote call");
        tokio::time::sleep(self.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetsError;
    use tokio::time::Instant;

    #[test]
    fn test_default_quota_delay() {
        let pacer = QuotaPacer::new(QuotaConfig::new(100_000, 500)).unwrap();
        assert_eq!(pacer.delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let result = QuotaPacer::new(QuotaConfig::new(100_000, 0));
        assert!(matches!(result, Err(SheetsError::Runtime(_))));
    }

    #[test]
    fn test_rejects_negative_delay() {
        assert!(QuotaPacer::new(QuotaConfig::new(-100_000, 500)).is_err());
    }

    #[test]
    fn test_rejects_delay_above_maximum() {
        assert!(QuotaPacer::new(QuotaConfig::new(1_140_001, 1)).is_err());
        assert!(QuotaPacer::new(QuotaConfig::new(1_140_000, 1)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_waits_for_delay() {
        let pacer = QuotaPacer::new(QuotaConfig::new(100_000, 500)).unwrap();

        let start = Instant::now();
        pacer.pace().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(210));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_noop() {
        let pacer = QuotaPacer::new(QuotaConfig::new(0, 500)).unwrap();

        let start = Instant::now();
        pacer.pace().await;
        QuotaPacer::disabled().pace().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
