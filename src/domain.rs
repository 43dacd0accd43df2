//! Domain module - Core catalog entities and collaborator seams
//!
//! This module contains the product row model, per-row check and repair
//! outcomes, and the traits the batch jobs use to reach the outside world.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod check;
pub mod product;
pub mod repair_state;
pub mod selection;
pub mod services;

// Re-export commonly used items for convenience
pub use check::{CheckResult, CheckStatus};
pub use product::ProductRow;
pub use repair_state::{RepairState, RowOutcome};
pub use selection::RowSelection;
pub use services::{ImageDiscovery, ProbeOutcome, RepairPacer, UrlProber};
