//! Spreadsheet error types
//!
//! Every variant is fatal for a run: the jobs cannot do anything useful
//! without a readable input workbook or a writable output workbook.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("Workbook {path} has no worksheet")]
    NoWorksheet { path: PathBuf },

    #[error("Worksheet '{sheet}' has no header row")]
    EmptySheet { sheet: String },

    #[error("Required column '{column}' not found in worksheet '{sheet}'")]
    MissingColumn { column: String, sheet: String },

    #[error("Unsupported workbook format (expected .xlsx): {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Worksheet too large to write: {reason}")]
    TooLarge { reason: String },

    #[error("Failed to write workbook {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

pub type SpreadsheetResult<T> = Result<T, SpreadsheetError>;
