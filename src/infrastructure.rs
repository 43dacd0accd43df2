//! Infrastructure layer for spreadsheets, HTTP probing, image discovery,
//! configuration and logging
//!
//! Concrete implementations of the `domain::services` traits live here,
//! together with the workbook reader/writer the jobs load and save through.

pub mod config;  // Configuration constants and loading
pub mod http_prober;
pub mod image_discovery;
pub mod logging;  // Logging infrastructure
pub mod pacing;
pub mod spreadsheet;
pub mod spreadsheet_error;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, DiscoveryBackend};
pub use http_prober::{HttpProber, HttpProberConfig};
pub use image_discovery::{CatalogDiscovery, DisabledDiscovery, SearchPageDiscovery, build_discovery};
pub use logging::{init_logging_with_config, get_log_directory, log_system_info};
pub use pacing::RandomDelayPacer;
pub use spreadsheet::{Worksheet, read_workbook, updated_path, write_workbook};
pub use spreadsheet_error::SpreadsheetError;
