//! Application layer: the audit and repair jobs and their console reports

pub mod audit;
pub mod repair;
pub mod report;
pub mod use_cases;

pub use audit::{AuditOptions, AuditReport, UrlAuditor};
pub use repair::{RepairBatch, RepairOptions, RepairReport, RepairSummary};
pub use report::{render_audit, render_repair};
pub use use_cases::{RepairCollaborators, run_audit, run_repair};
