//! Image repair batch
//!
//! For each selected row: probe the current image URL, and when it is missing
//! or unreachable ask the discovery backend for a replacement built from the
//! row's brand, name and SKU. Rows are mutated in place; persisting them is
//! the caller's job.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::check::truncate_chars;
use crate::domain::product::{ProductRow, parse_image_ref};
use crate::domain::repair_state::{RepairState, RowOutcome};
use crate::domain::selection::RowSelection;
use crate::domain::services::{ImageDiscovery, RepairPacer, UrlProber};
use crate::infrastructure::config::{AppConfig, defaults};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOptions {
    pub probe_timeout: Duration,
    /// Characters of a broken URL shown in progress lines
    pub url_display_width: usize,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(defaults::PROBE_TIMEOUT_SECONDS),
            url_display_width: defaults::URL_DISPLAY_WIDTH,
        }
    }
}

impl RepairOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            probe_timeout: config.probe.timeout(),
            url_display_width: config.repair.url_display_width,
        }
    }
}

/// Tally of one repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Selected rows that were probed
    pub checked: usize,
    /// Rows sent to discovery
    pub attempted: usize,
    #[serde(rename = "updatedCount")]
    pub updated_count: usize,
    pub outcomes: Vec<RowOutcome>,
}

impl RepairSummary {
    pub fn failed_count(&self) -> usize {
        self.attempted - self.updated_count
    }
}

/// Repair pass result together with where the updated workbook went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub summary: RepairSummary,
    #[serde(rename = "outputPath")]
    pub output_path: PathBuf,
}

pub struct RepairBatch {
    prober: Arc<dyn UrlProber>,
    discovery: Arc<dyn ImageDiscovery>,
    pacer: Arc<dyn RepairPacer>,
    options: RepairOptions,
}

impl RepairBatch {
    pub fn new(
        prober: Arc<dyn UrlProber>,
        discovery: Arc<dyn ImageDiscovery>,
        pacer: Arc<dyn RepairPacer>,
        options: RepairOptions,
    ) -> Self {
        Self {
            prober,
            discovery,
            pacer,
            options,
        }
    }

    /// Repair the rows picked by `selection`, one at a time.
    pub async fn repair_rows(&self, rows: &mut [ProductRow], selection: &RowSelection) -> RepairSummary {
        let indices = selection.indices(rows);
        info!(
            "🛠️ Repairing {} selected rows with '{}' discovery",
            indices.len(),
            self.discovery.name()
        );

        let mut summary = RepairSummary::default();
        for idx in indices {
            let outcome = self.repair_row(&mut rows[idx]).await;

            summary.checked += 1;
            if outcome.state.was_attempted() {
                summary.attempted += 1;
            }
            if matches!(outcome.state, RepairState::Repaired { .. }) {
                summary.updated_count += 1;
            }
            summary.outcomes.push(outcome);
        }

        info!(
            "✅ Repair finished: {} checked, {} attempted, {} updated",
            summary.checked, summary.attempted, summary.updated_count
        );
        summary
    }

    async fn repair_row(&self, row: &mut ProductRow) -> RowOutcome {
        let reachable = match row.image_url.as_deref() {
            Some(url) => self.prober.probe(url, self.options.probe_timeout).await.is_success(),
            None => false,
        };

        let state = RepairState::Unchecked.checked(reachable);
        if state == RepairState::Valid {
            debug!("Image OK for {}", row.id_sku);
            return RowOutcome {
                row_index: row.row_index,
                id_sku: row.id_sku.clone(),
                query: None,
                state,
            };
        }

        let query = row.search_query();
        match row.image_url.as_deref() {
            Some(url) => info!(
                "Searching for: {} (broken URL: {}...)",
                query,
                truncate_chars(url, self.options.url_display_width)
            ),
            None => info!("Searching for: {} (no image URL)", query),
        }

        let candidate = match self.discovery.discover(&query).await {
            Ok(candidate) => candidate,
            Err(e) => {
                // 검색 실패는 행 단위 실패로만 처리
                warn!("Error searching for {}: {:#}", query, e);
                None
            }
        };

        // Only a value the reader would accept as an image URL counts.
        let candidate = candidate.and_then(|raw| {
            let url = parse_image_ref(&raw);
            if url.is_none() {
                warn!("Ignoring unusable candidate {:?} for {}", raw, row.id_sku);
            }
            url
        });

        let state = state.resolved(candidate);
        match &state {
            RepairState::Repaired { url } => {
                row.image_url = Some(url.clone());
                info!("✅ Updated {} with {}", row.id_sku, url);
            }
            _ => warn!("No image found for {}", row.id_sku),
        }

        self.pacer.pause().await;

        RowOutcome {
            row_index: row.row_index,
            id_sku: row.id_sku.clone(),
            query: Some(query),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::ProbeOutcome;
    use crate::test_utils::{CountingPacer, ScriptedDiscovery, ScriptedProber, product};

    struct Harness {
        prober: Arc<ScriptedProber>,
        discovery: Arc<ScriptedDiscovery>,
        pacer: Arc<CountingPacer>,
    }

    impl Harness {
        fn new(prober: ScriptedProber, discovery: ScriptedDiscovery) -> Self {
            Self {
                prober: Arc::new(prober),
                discovery: Arc::new(discovery),
                pacer: Arc::new(CountingPacer::default()),
            }
        }

        fn batch(&self) -> RepairBatch {
            RepairBatch::new(
                self.prober.clone(),
                self.discovery.clone(),
                self.pacer.clone(),
                RepairOptions::default(),
            )
        }
    }

    #[tokio::test]
    async fn test_valid_row_is_left_alone() {
        let harness = Harness::new(ScriptedProber::all_ok(), ScriptedDiscovery::new());
        let mut rows = vec![product(0, "A1", "Accessories", Some("https://cdn.example.com/a1.jpg"))];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.updated_count, 0);
        assert_eq!(summary.outcomes[0].state, RepairState::Valid);
        assert_eq!(summary.outcomes[0].query, None);
        assert_eq!(harness.discovery.call_count(), 0);
        assert_eq!(harness.pacer.pauses(), 0);
        assert_eq!(rows[0].image_url.as_deref(), Some("https://cdn.example.com/a1.jpg"));
    }

    #[tokio::test]
    async fn test_missing_url_is_repaired_from_discovery() {
        let harness = Harness::new(
            ScriptedProber::all_ok(),
            ScriptedDiscovery::new().with("Acme Item B2 B2", "https://example.com/img.png"),
        );
        let mut rows = vec![product(0, "B2", "Accessories", None)];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        assert_eq!(harness.prober.call_count(), 0);
        assert_eq!(harness.discovery.queries(), vec!["Acme Item B2 B2"]);
        assert_eq!(summary.updated_count, 1);
        assert_eq!(
            summary.outcomes[0].state,
            RepairState::Repaired {
                url: "https://example.com/img.png".into()
            }
        );
        assert_eq!(rows[0].image_url.as_deref(), Some("https://example.com/img.png"));
        assert_eq!(harness.pacer.pauses(), 1);
    }

    #[tokio::test]
    async fn test_broken_url_without_candidate_is_kept() {
        let harness = Harness::new(ScriptedProber::all_broken(), ScriptedDiscovery::new());
        let mut rows = vec![product(0, "C3", "Accessories", Some("https://old.example.com/c3.jpg"))];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.updated_count, 0);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.outcomes[0].state, RepairState::RepairFailed);
        assert_eq!(rows[0].image_url.as_deref(), Some("https://old.example.com/c3.jpg"));
        assert_eq!(harness.pacer.pauses(), 1);
    }

    #[tokio::test]
    async fn test_unusable_candidates_are_not_written() {
        let harness = Harness::new(
            ScriptedProber::all_broken(),
            ScriptedDiscovery::new()
                .with("Acme Item G1 G1", "")
                .with("Acme Item G2 G2", "/images/g2.png")
                .with("Acme Item G3 G3", "  https://cdn.example.com/g3.jpg "),
        );
        let mut rows = vec![
            product(0, "G1", "Accessories", Some("https://old.example.com/g1.jpg")),
            product(1, "G2", "Accessories", None),
            product(2, "G3", "Accessories", None),
        ];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.updated_count, 1);
        assert_eq!(summary.outcomes[0].state, RepairState::RepairFailed);
        assert_eq!(summary.outcomes[1].state, RepairState::RepairFailed);
        assert_eq!(rows[0].image_url.as_deref(), Some("https://old.example.com/g1.jpg"));
        assert_eq!(rows[1].image_url, None);
        assert_eq!(rows[2].image_url.as_deref(), Some("https://cdn.example.com/g3.jpg"));
        assert_eq!(harness.pacer.pauses(), 3);
    }

    #[tokio::test]
    async fn test_discovery_error_counts_as_failed_row() {
        let harness = Harness::new(ScriptedProber::all_broken(), ScriptedDiscovery::failing());
        let mut rows = vec![
            product(0, "D4", "Accessories", Some("https://old.example.com/d4.jpg")),
            product(1, "D5", "Accessories", None),
        ];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.updated_count, 0);
        assert!(summary.outcomes.iter().all(|o| o.state == RepairState::RepairFailed));
        assert_eq!(harness.pacer.pauses(), 2);
    }

    #[tokio::test]
    async fn test_only_selected_rows_are_touched() {
        let harness = Harness::new(
            ScriptedProber::all_ok().with("https://old.example.com/e2.jpg", ProbeOutcome::Status(404)),
            ScriptedDiscovery::new().with("Acme Item E2 E2", "https://cdn.example.com/e2-new.jpg"),
        );
        let mut rows = vec![
            product(0, "E1", "Cables", None),
            product(1, "E2", "Accessories", Some("https://old.example.com/e2.jpg")),
            product(2, "E3", "Accessories", Some("https://cdn.example.com/e3.jpg")),
            product(3, "E4", "Accessories", None),
        ];
        let selection = RowSelection::new(Some("Accessories".into()), Some(2));

        let summary = harness.batch().repair_rows(&mut rows, &selection).await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.updated_count, 1);
        assert_eq!(rows[0].image_url, None);
        assert_eq!(rows[1].image_url.as_deref(), Some("https://cdn.example.com/e2-new.jpg"));
        assert_eq!(rows[3].image_url, None);
        assert_eq!(harness.discovery.call_count(), 1);
    }

    #[tokio::test]
    async fn test_outcomes_keep_source_positions() {
        let harness = Harness::new(ScriptedProber::all_broken(), ScriptedDiscovery::new());
        let mut rows = vec![
            product(7, "F1", "Accessories", None),
            product(9, "F2", "Accessories", None),
        ];

        let summary = harness.batch().repair_rows(&mut rows, &RowSelection::all()).await;

        let positions: Vec<_> = summary.outcomes.iter().map(|o| o.row_index).collect();
        assert_eq!(positions, vec![7, 9]);
        assert!(summary.outcomes.iter().all(|o| o.state.is_terminal()));
    }
}
