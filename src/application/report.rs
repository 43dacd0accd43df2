//! Console reports for finished jobs

use std::fmt::Write as _;

use super::audit::AuditReport;
use super::repair::RepairReport;
use crate::domain::repair_state::RepairState;

/// Audit summary: working count, broken count, one line per broken row.
///
/// ```text
/// Working URLs: 12
/// Broken URLs found: 2
/// SKU-1: http_status:404 - https://cdn.example.com/a.jpg...
/// SKU-7: no_url - ...
/// ```
pub fn render_audit(report: &AuditReport, url_width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Working URLs: {}", report.working);
    let _ = writeln!(out, "Broken URLs found: {}", report.broken.len());
    for result in &report.broken {
        let _ = writeln!(
            out,
            "{}: {} - {}...",
            result.id_sku,
            result.status,
            result.url_prefix(url_width)
        );
    }
    if report.limit_reached {
        let _ = writeln!(
            out,
            "(stopped after {} broken URLs; {} rows scanned)",
            report.broken.len(),
            report.scanned
        );
    }
    out
}

/// Repair summary: one `Searching for:` line per attempted row followed by
/// its result, then the updated count and output location.
pub fn render_repair(report: &RepairReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Checked {} rows, attempted {} repairs.",
        summary.checked, summary.attempted
    );
    for outcome in &summary.outcomes {
        if let Some(query) = &outcome.query {
            let _ = writeln!(out, "Searching for: {query}");
        }
        match &outcome.state {
            RepairState::Repaired { url } => {
                let _ = writeln!(out, "Updated {} with {}", outcome.id_sku, url);
            }
            RepairState::RepairFailed => {
                let _ = writeln!(out, "No image found for {}", outcome.id_sku);
            }
            _ => {}
        }
    }
    let _ = writeln!(
        out,
        "Updated {} products. Saved to {}",
        summary.updated_count,
        report.output_path.display()
    );
    out
}
