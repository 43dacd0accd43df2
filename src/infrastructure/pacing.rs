//! Randomized pause between repair attempts

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::services::RepairPacer;
use crate::infrastructure::config::RepairConfig;

/// Sleeps a uniformly drawn duration in `[min, max]` milliseconds
#[derive(Debug, Clone)]
pub struct RandomDelayPacer {
    min_ms: u64,
    max_ms: u64,
}

impl RandomDelayPacer {
    /// Bounds are reordered if given backwards.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_repair_config(config: &RepairConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    pub fn draw(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_ms..=self.max_ms))
    }
}

#[async_trait]
impl RepairPacer for RandomDelayPacer {
    async fn pause(&self) {
        let delay = self.draw();
        debug!("⏳ Pausing {:?} before next row", delay);
        tokio::time::sleep(delay).await;
    }
}
