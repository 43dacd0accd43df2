//! Workbook-level use cases
//!
//! Each use case loads the input workbook, runs one job over its rows and,
//! for repair, writes the updated copy next to the input.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::audit::{AuditOptions, AuditReport, UrlAuditor};
use super::repair::{RepairBatch, RepairOptions, RepairReport};
use crate::domain::selection::RowSelection;
use crate::domain::services::{ImageDiscovery, RepairPacer, UrlProber};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::spreadsheet::{read_workbook, updated_path, write_workbook};

/// Collaborators the repair job talks to
#[derive(Clone)]
pub struct RepairCollaborators {
    pub prober: Arc<dyn UrlProber>,
    pub discovery: Arc<dyn ImageDiscovery>,
    pub pacer: Arc<dyn RepairPacer>,
}

/// Audit the image URLs in `input`.
pub async fn run_audit(input: &Path, config: &AppConfig, prober: Arc<dyn UrlProber>) -> Result<AuditReport> {
    let sheet = read_workbook(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let rows = sheet.product_rows(&config.sheet.image_column)?;

    let selection = RowSelection::new(config.audit.category.clone(), config.audit.limit);
    let auditor = UrlAuditor::new(prober, AuditOptions::from_config(config));
    Ok(auditor.audit(&rows, &selection).await)
}

/// Repair the selected rows of `input` and save every row to the
/// `_updated` copy, whether or not anything changed.
pub async fn run_repair(input: &Path, config: &AppConfig, collaborators: RepairCollaborators) -> Result<RepairReport> {
    let image_column = config.sheet.image_column.as_str();
    let output_path = updated_path(input, &config.repair.output_suffix);
    if output_path.as_path() == input {
        bail!(
            "Output path {} is the input workbook; set a non-empty repair.output_suffix",
            output_path.display()
        );
    }

    let mut sheet = read_workbook(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let mut rows = sheet.product_rows(image_column)?;

    let selection = RowSelection::new(config.repair.category.clone(), config.repair.limit);
    let batch = RepairBatch::new(
        collaborators.prober,
        collaborators.discovery,
        collaborators.pacer,
        RepairOptions::from_config(config),
    );
    let summary = batch.repair_rows(&mut rows, &selection).await;

    let changed = sheet.apply_image_urls(&rows, image_column)?;
    write_workbook(&sheet, &output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;
    info!("{} image cells changed in {:?}", changed, output_path);

    Ok(RepairReport { summary, output_path })
}
