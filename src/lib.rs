//! Catalog Audit - product spreadsheet image URL auditor and repair batch
//!
//! Reads a product workbook, checks that each row's image URL answers, and
//! optionally replaces missing or broken ones with a discovered candidate.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod cli;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the entry points for easier access
pub use cli::{Cli, run};
