//! Image discovery backends
//!
//! Every backend answers one question: given a free-text product query, is
//! there a single image URL worth trying? Results are best-effort.
//!
//! - [`SearchPageDiscovery`]: fetch an image-search results page and pick the
//!   first acceptable `<img>` source
//! - [`CatalogDiscovery`]: look the query up in a static JSON catalog
//! - [`DisabledDiscovery`]: never finds anything (dry repair)

use anyhow::Result;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::product::URL_PREFIX;
use crate::domain::services::ImageDiscovery;
use crate::infrastructure::config::{DiscoveryBackend, DiscoveryConfig, defaults};

/// Bytes left as-is in a search query: unreserved characters plus `/`
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Search request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Search page returned HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Search URL template must contain {placeholder}: {template}")]
    InvalidTemplate {
        template: String,
        placeholder: &'static str,
    },

    #[error("Failed to load image catalog {path}: {reason}")]
    Catalog { path: PathBuf, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Build the backend selected in `config`.
pub async fn build_discovery(config: &DiscoveryConfig) -> Result<Arc<dyn ImageDiscovery>, DiscoveryError> {
    let discovery: Arc<dyn ImageDiscovery> = match config.backend {
        DiscoveryBackend::SearchPage => Arc::new(SearchPageDiscovery::from_config(config)?),
        DiscoveryBackend::Catalog => {
            let path = config.catalog_path.as_deref().ok_or_else(|| DiscoveryError::Catalog {
                path: PathBuf::new(),
                reason: "no catalog path configured".to_string(),
            })?;
            Arc::new(CatalogDiscovery::load(path).await?)
        }
        DiscoveryBackend::Disabled => Arc::new(DisabledDiscovery),
    };
    info!("🔎 Image discovery backend: {}", discovery.name());
    Ok(discovery)
}

/// Scrapes the first acceptable image from a search results page
pub struct SearchPageDiscovery {
    client: Client,
    template: String,
    selector: Selector,
    excluded_host_fragment: String,
}

impl SearchPageDiscovery {
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if !config.search_url_template.contains(defaults::QUERY_PLACEHOLDER) {
            return Err(DiscoveryError::InvalidTemplate {
                template: config.search_url_template.clone(),
                placeholder: defaults::QUERY_PLACEHOLDER,
            });
        }

        let selector =
            Selector::parse(&config.image_selector).map_err(|e| DiscoveryError::InvalidSelector {
                selector: config.image_selector.clone(),
                reason: e.to_string(),
            })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(DiscoveryError::Client)?;

        Ok(Self {
            client,
            template: config.search_url_template.clone(),
            selector,
            excluded_host_fragment: config.excluded_host_fragment.to_lowercase(),
        })
    }

    /// Results page URL for `query`. Spaces become `%20`, so the
    /// placeholder works in a path segment as well as in the query string.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET).to_string();
        self.template.replace(defaults::QUERY_PLACEHOLDER, &encoded)
    }

    /// First `<img>` matched by the selector whose `data-src` (or `src` when
    /// `data-src` is blank) is an acceptable candidate.
    pub fn first_candidate(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.selector)
            .filter_map(|img| {
                let element = img.value();
                element
                    .attr("data-src")
                    .filter(|src| !src.trim().is_empty())
                    .or_else(|| element.attr("src"))
            })
            .map(str::trim)
            .find(|src| self.is_candidate(src))
            .map(str::to_string)
    }

    fn is_candidate(&self, src: &str) -> bool {
        src.starts_with(URL_PREFIX)
            && !src.starts_with("data:")
            && (self.excluded_host_fragment.is_empty()
                || !src.to_lowercase().contains(&self.excluded_host_fragment))
    }
}

#[async_trait]
impl ImageDiscovery for SearchPageDiscovery {
    async fn discover(&self, query: &str) -> Result<Option<String>> {
        let url = self.search_url(query);
        debug!("🌐 HTTP GET (search): {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| DiscoveryError::Http { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status { status: status.as_u16(), url }.into());
        }

        let body = response
            .text()
            .await
            .map_err(|source| DiscoveryError::Http { url: url.clone(), source })?;

        let candidate = self.first_candidate(&body);
        debug!("Search page for '{}' yielded {:?}", query, candidate);
        Ok(candidate)
    }

    fn name(&self) -> &'static str {
        "search_page"
    }
}

/// Static query → image URL catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogDiscovery {
    entries: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl CatalogDiscovery {
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        let folded = entries
            .iter()
            .map(|(query, url)| (query.trim().to_lowercase(), url.clone()))
            .collect();
        Self { entries, folded }
    }

    /// Load a JSON object mapping queries to URLs.
    pub async fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DiscoveryError::Catalog {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| DiscoveryError::Catalog {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!("Loaded {} catalog entries from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    /// Exact match first, then trimmed case-insensitive.
    pub fn lookup(&self, query: &str) -> Option<&str> {
        self.entries
            .get(query)
            .or_else(|| self.folded.get(&query.trim().to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ImageDiscovery for CatalogDiscovery {
    async fn discover(&self, query: &str) -> Result<Option<String>> {
        Ok(self.lookup(query).map(str::to_string))
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// Backend that never finds an image
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDiscovery;

#[async_trait]
impl ImageDiscovery for DisabledDiscovery {
    async fn discover(&self, _query: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn search_page() -> SearchPageDiscovery {
        SearchPageDiscovery::from_config(&DiscoveryConfig::default()).unwrap()
    }

    #[test]
    fn test_search_url_encodes_query() {
        let discovery = search_page();
        assert_eq!(
            discovery.search_url("Acme Phone Case 12/A"),
            "https://www.google.com/search?q=Acme%20Phone%20Case%2012/A&tbm=isch"
        );
        assert_eq!(
            discovery.search_url("Café & Co+"),
            "https://www.google.com/search?q=Caf%C3%A9%20%26%20Co%2B&tbm=isch"
        );
    }

    #[test]
    fn test_query_in_path_segment() {
        let config = DiscoveryConfig {
            search_url_template: "https://images.example.com/search/{query}".into(),
            ..Default::default()
        };
        let discovery = SearchPageDiscovery::from_config(&config).unwrap();
        assert_eq!(
            discovery.search_url("Acme Phone Case"),
            "https://images.example.com/search/Acme%20Phone%20Case"
        );
    }

    #[test]
    fn test_first_candidate_skips_unacceptable_sources() {
        let html = r#"
            <html><body>
              <img data-src="data:image/png;base64,AAAA">
              <img data-src="https://encrypted-tbn0.gstatic.GOOGLE.com/thumb.jpg">
              <img src="https://cdn.example.com/ignored-no-data-src.jpg">
              <img data-src="/relative/path.png">
              <img data-src="https://cdn.example.com/case.jpg">
              <img data-src="https://cdn.example.com/second.jpg">
            </body></html>
        "#;
        assert_eq!(
            search_page().first_candidate(html),
            Some("https://cdn.example.com/case.jpg".to_string())
        );
    }

    #[test]
    fn test_blank_data_src_falls_back_to_src() {
        let html = r#"<img data-src="" src="https://cdn.example.com/fallback.jpg">"#;
        assert_eq!(
            search_page().first_candidate(html),
            Some("https://cdn.example.com/fallback.jpg".to_string())
        );
    }

    #[test]
    fn test_no_candidate() {
        assert_eq!(search_page().first_candidate("<p>No results</p>"), None);
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let config = DiscoveryConfig {
            search_url_template: "https://images.example.com/search".into(),
            ..Default::default()
        };
        assert!(matches!(
            SearchPageDiscovery::from_config(&config),
            Err(DiscoveryError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_selector() {
        let config = DiscoveryConfig {
            image_selector: "img[".into(),
            ..Default::default()
        };
        assert!(matches!(
            SearchPageDiscovery::from_config(&config),
            Err(DiscoveryError::InvalidSelector { .. })
        ));
    }

    #[tokio::test]
    async fn test_catalog_lookup() {
        let catalog = CatalogDiscovery::from_entries(HashMap::from([(
            "Acme Phone Case SKU-1".to_string(),
            "https://cdn.example.com/case.jpg".to_string(),
        )]));

        assert_eq!(
            catalog.discover("Acme Phone Case SKU-1").await.unwrap().as_deref(),
            Some("https://cdn.example.com/case.jpg")
        );
        assert_eq!(
            catalog.lookup("  acme phone case sku-1 "),
            Some("https://cdn.example.com/case.jpg")
        );
        assert_eq!(catalog.discover("Other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_catalog_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{ "Acme Cable 7": "https://cdn.example.com/cable.jpg" }"#).unwrap();

        let catalog = CatalogDiscovery::load(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("Acme Cable 7"), Some("https://cdn.example.com/cable.jpg"));
    }

    #[tokio::test]
    async fn test_catalog_load_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            CatalogDiscovery::load(&path).await,
            Err(DiscoveryError::Catalog { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_discovery_by_backend() {
        let disabled = DiscoveryConfig {
            backend: DiscoveryBackend::Disabled,
            ..Default::default()
        };
        let discovery = build_discovery(&disabled).await.unwrap();
        assert_eq!(discovery.name(), "none");
        assert_eq!(discovery.discover("anything").await.unwrap(), None);

        let catalog_without_path = DiscoveryConfig {
            backend: DiscoveryBackend::Catalog,
            ..Default::default()
        };
        assert!(build_discovery(&catalog_without_path).await.is_err());
    }
}
