//! URL audit job
//!
//! Walks the selected rows in source order, probes each row's image URL and
//! collects the broken ones until the broken-result cap is reached.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::check::{CheckResult, CheckStatus};
use crate::domain::product::ProductRow;
use crate::domain::selection::RowSelection;
use crate::domain::services::UrlProber;
use crate::infrastructure::config::{AppConfig, defaults};

/// Audit tuning knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOptions {
    /// Stop once this many broken rows were collected; 0 scans nothing
    pub broken_limit: usize,
    pub probe_timeout: Duration,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            broken_limit: defaults::BROKEN_LIMIT,
            probe_timeout: Duration::from_secs(defaults::PROBE_TIMEOUT_SECONDS),
        }
    }
}

impl AuditOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            broken_limit: config.audit.broken_limit,
            probe_timeout: config.probe.timeout(),
        }
    }
}

/// What one audit pass found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Rows actually checked
    pub scanned: usize,
    pub working: usize,
    /// Broken rows in source order, at most `broken_limit` entries
    pub broken: Vec<CheckResult>,
    /// Selected rows remained when the cap stopped the scan
    #[serde(rename = "limitReached")]
    pub limit_reached: bool,
}

pub struct UrlAuditor {
    prober: Arc<dyn UrlProber>,
    options: AuditOptions,
}

impl UrlAuditor {
    pub fn new(prober: Arc<dyn UrlProber>, options: AuditOptions) -> Self {
        Self { prober, options }
    }

    /// Classify one row. Rows without an image URL are never probed.
    pub async fn check_row(&self, row: &ProductRow) -> CheckResult {
        let Some(url) = row.image_url.as_deref() else {
            return CheckResult {
                id_sku: row.id_sku.clone(),
                url: String::new(),
                status: CheckStatus::NoUrl,
            };
        };

        debug!("🌐 HEAD {} (sku {})", url, row.id_sku);
        let outcome = self.prober.probe(url, self.options.probe_timeout).await;
        CheckResult {
            id_sku: row.id_sku.clone(),
            url: url.to_string(),
            status: outcome.into(),
        }
    }

    /// Audit the rows picked by `selection`.
    ///
    /// The cap is checked before each row, so no probe is issued once
    /// `broken_limit` broken rows have been collected.
    pub async fn audit(&self, rows: &[ProductRow], selection: &RowSelection) -> AuditReport {
        info!(
            "🔍 Auditing image URLs (category: {}, limit: {:?}, broken limit: {})",
            selection.category.as_deref().unwrap_or("all"),
            selection.limit,
            self.options.broken_limit
        );

        let mut report = AuditReport::default();
        for row in selection.select(rows) {
            if report.broken.len() >= self.options.broken_limit {
                report.limit_reached = true;
                break;
            }

            let result = self.check_row(row).await;
            report.scanned += 1;

            if result.status.is_ok() {
                report.working += 1;
            } else {
                warn!("⚠️ {}: {}", result.id_sku, result.status);
                report.broken.push(result);
            }
        }

        info!(
            "✅ Audit finished: {} scanned, {} working, {} broken{}",
            report.scanned,
            report.working,
            report.broken.len(),
            if report.limit_reached { " (limit reached)" } else { "" }
        );
        report
    }
}
