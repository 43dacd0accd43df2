//! 배치 작업이 외부 세계와 만나는 경계 트레이트 정의
//!
//! The audit and repair jobs only ever talk to these traits, so the concrete
//! HTTP prober, discovery backend and pacing policy can be swapped for
//! in-memory doubles in tests.

use async_trait::async_trait;
use anyhow::Result;
use std::time::Duration;

use super::check::CheckStatus;

/// Status code the probe must return for a URL to count as reachable
pub const SUCCESS_STATUS: u16 = 200;

/// Raw result of one existence probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Status(u16),
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Status(SUCCESS_STATUS))
    }
}

impl From<ProbeOutcome> for CheckStatus {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Status(SUCCESS_STATUS) => CheckStatus::Ok,
            ProbeOutcome::Status(code) => CheckStatus::HttpStatus(code),
            ProbeOutcome::Failed(message) => CheckStatus::Error(message),
        }
    }
}

/// URL existence probe (HEAD-style, single attempt)
#[async_trait]
pub trait UrlProber: Send + Sync {
    /// Probe `url`, giving up after `timeout`. Never fails: transport errors
    /// are reported as [`ProbeOutcome::Failed`].
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// Best-effort image lookup returning at most one candidate URL
#[async_trait]
pub trait ImageDiscovery: Send + Sync {
    async fn discover(&self, query: &str) -> Result<Option<String>>;

    /// Backend label for logs
    fn name(&self) -> &'static str;
}

/// Delay inserted after every repair attempt
#[async_trait]
pub trait RepairPacer: Send + Sync {
    async fn pause(&self);
}
