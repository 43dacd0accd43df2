//! Configuration infrastructure
//!
//! Contains configuration loading and management for the audit and repair jobs.
//!
//! Configuration is resolved in three tiers:
//! 1. Built-in defaults (`defaults` module: Accessories, 5 repairs, 1-3 s pause)
//! 2. JSON config file (explicit `--config` path or the user config directory)
//! 3. Command-line overrides (applied by the CLI after loading)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file {path} is not valid JSON for this version: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("Failed to determine the user config directory")]
    NoConfigDir,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workbook layout
    pub sheet: SheetConfig,

    /// URL existence probe
    pub probe: ProbeConfig,

    /// Audit job
    pub audit: AuditConfig,

    /// Repair job
    pub repair: RepairConfig,

    /// Image discovery backend
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Workbook layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Column holding the image reference. Legacy sheets keep it in `Description`.
    pub image_column: String,
}

/// URL existence probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe timeout in seconds
    pub timeout_seconds: u64,

    /// User agent string
    pub user_agent: String,

    /// Whether HEAD probes follow redirects (a redirect is otherwise a non-200 answer)
    pub follow_redirects: bool,
}

/// Audit job settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Category to audit; `None` audits every row
    pub category: Option<String>,

    /// Maximum rows to audit after the category filter
    pub limit: Option<usize>,

    /// Stop scanning once this many rows are broken or missing
    pub broken_limit: usize,

    /// Characters of each broken URL shown in the report
    pub url_display_width: usize,
}

/// Repair job settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Category to repair; `None` repairs every row
    pub category: Option<String>,

    /// Maximum rows to process after the category filter
    pub limit: Option<usize>,

    /// Lower bound of the pause after each repair attempt, in milliseconds
    pub min_delay_ms: u64,

    /// Upper bound of the pause after each repair attempt, in milliseconds
    pub max_delay_ms: u64,

    /// Suffix inserted before the extension of the output workbook
    pub output_suffix: String,

    /// Characters of each broken URL shown in progress lines
    pub url_display_width: usize,
}

/// Image discovery backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryBackend {
    /// Scrape an image-search results page
    #[value(name = "search_page")]
    SearchPage,
    /// Look queries up in a static JSON catalog
    Catalog,
    /// Never find anything (dry repair)
    #[serde(rename = "none")]
    #[value(name = "none")]
    Disabled,
}

/// Image discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub backend: DiscoveryBackend,

    /// Results page URL; `{query}` is replaced by the percent-encoded query
    pub search_url_template: String,

    /// CSS selector for candidate images on the results page
    pub image_selector: String,

    /// Candidates whose URL contains this fragment (case-insensitive) are skipped
    pub excluded_host_fragment: String,

    /// Browser-like user agent sent with search requests
    pub user_agent: String,

    /// Search request timeout in seconds
    pub timeout_seconds: u64,

    /// JSON catalog path for the `catalog` backend
    pub catalog_path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console (stderr) output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to the user data directory
    pub log_dir: Option<PathBuf>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            image_column: defaults::IMAGE_COLUMN.to_string(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::PROBE_TIMEOUT_SECONDS,
            user_agent: defaults::PROBE_USER_AGENT.to_string(),
            follow_redirects: defaults::PROBE_FOLLOW_REDIRECTS,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            category: Some(defaults::CATEGORY.to_string()),
            limit: None,
            broken_limit: defaults::BROKEN_LIMIT,
            url_display_width: defaults::URL_DISPLAY_WIDTH,
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            category: Some(defaults::CATEGORY.to_string()),
            limit: Some(defaults::REPAIR_LIMIT),
            min_delay_ms: defaults::REPAIR_MIN_DELAY_MS,
            max_delay_ms: defaults::REPAIR_MAX_DELAY_MS,
            output_suffix: defaults::OUTPUT_SUFFIX.to_string(),
            url_display_width: defaults::URL_DISPLAY_WIDTH,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            backend: DiscoveryBackend::SearchPage,
            search_url_template: defaults::SEARCH_URL_TEMPLATE.to_string(),
            image_selector: defaults::IMAGE_SELECTOR.to_string(),
            excluded_host_fragment: defaults::EXCLUDED_HOST_FRAGMENT.to_string(),
            user_agent: defaults::SEARCH_USER_AGENT.to_string(),
            timeout_seconds: defaults::SEARCH_TIMEOUT_SECONDS,
            catalog_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Reject settings the jobs cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.image_column.trim().is_empty() {
            return Err(invalid("sheet.image_column", "must not be empty"));
        }
        if self.probe.timeout_seconds == 0 {
            return Err(invalid("probe.timeout_seconds", "must be greater than 0"));
        }
        if self.discovery.timeout_seconds == 0 {
            return Err(invalid("discovery.timeout_seconds", "must be greater than 0"));
        }
        if self.repair.output_suffix.trim().is_empty() {
            return Err(invalid(
                "repair.output_suffix",
                "must not be empty (the input workbook would be overwritten)",
            ));
        }
        if self.repair.min_delay_ms > self.repair.max_delay_ms {
            return Err(invalid(
                "repair.min_delay_ms",
                &format!(
                    "{} exceeds repair.max_delay_ms {}",
                    self.repair.min_delay_ms, self.repair.max_delay_ms
                ),
            ));
        }
        if self.discovery.backend == DiscoveryBackend::SearchPage
            && !self.discovery.search_url_template.contains(defaults::QUERY_PLACEHOLDER)
        {
            return Err(invalid(
                "discovery.search_url_template",
                "must contain the {query} placeholder",
            ));
        }
        if self.discovery.backend == DiscoveryBackend::Catalog && self.discovery.catalog_path.is_none() {
            return Err(invalid("discovery.catalog_path", "required by the catalog backend"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the default config location in the user config directory
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_path(config_dir.join(defaults::CONFIG_FILE_NAME)))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Explicit path when given, otherwise the default location
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Ok(Self::with_path(path)),
            None => Self::new(),
        }
    }

    /// Load configuration from file; a missing file yields defaults.
    pub async fn load_config(&self) -> Result<AppConfig, ConfigError> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            debug!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.config_path.clone(),
                source,
            })?;

        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    /// Directory name under the user config/data directories
    pub const APP_DIR_NAME: &str = "catalog-audit";

    /// Config file name inside [`APP_DIR_NAME`]
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Legacy sheets keep image URLs in the description column
    pub const IMAGE_COLUMN: &str = "Description";

    /// Default category for both jobs
    pub const CATEGORY: &str = "Accessories";

    /// Default probe timeout in seconds
    pub const PROBE_TIMEOUT_SECONDS: u64 = 5;

    /// Default probe user agent
    pub const PROBE_USER_AGENT: &str = "catalog-audit/0.2 (link checker)";

    /// HEAD probes report the first response by default
    pub const PROBE_FOLLOW_REDIRECTS: bool = false;

    /// Default broken-row threshold for the audit job
    pub const BROKEN_LIMIT: usize = 10;

    /// Default characters of a URL shown in reports
    pub const URL_DISPLAY_WIDTH: usize = 50;

    /// Default row limit for the repair job
    pub const REPAIR_LIMIT: usize = 5;

    /// Default pause bounds after a repair attempt
    pub const REPAIR_MIN_DELAY_MS: u64 = 1000;
    pub const REPAIR_MAX_DELAY_MS: u64 = 3000;

    /// Default output workbook suffix
    pub const OUTPUT_SUFFIX: &str = "_updated";

    /// Placeholder replaced by the encoded query in search templates
    pub const QUERY_PLACEHOLDER: &str = "{query}";

    /// Default image-search results page
    pub const SEARCH_URL_TEMPLATE: &str = "https://www.google.com/search?q={query}&tbm=isch";

    /// Default candidate selector on the results page
    pub const IMAGE_SELECTOR: &str = "img[data-src]";

    /// Default host fragment excluded from candidates
    pub const EXCLUDED_HOST_FRAGMENT: &str = "google";

    /// Default search user agent
    pub const SEARCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    /// Default search timeout in seconds
    pub const SEARCH_TIMEOUT_SECONDS: u64 = 10;

    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;
}
