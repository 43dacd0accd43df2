//! HTTP existence probe for image URLs
//!
//! Single-attempt HEAD requests with a per-call timeout. Any transport
//! failure is folded into [`ProbeOutcome::Failed`] so callers can keep going.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

use crate::domain::services::{ProbeOutcome, UrlProber};
use crate::infrastructure::config::ProbeConfig;

/// Configuration for the probe client
#[derive(Debug, Clone)]
pub struct HttpProberConfig {
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpProberConfig {
    pub fn from_probe_config(probe_config: &ProbeConfig) -> Self {
        Self {
            user_agent: probe_config.user_agent.clone(),
            follow_redirects: probe_config.follow_redirects,
        }
    }
}

impl Default for HttpProberConfig {
    fn default() -> Self {
        Self::from_probe_config(&ProbeConfig::default())
    }
}

/// reqwest-backed [`UrlProber`]
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn from_probe_config(probe_config: &ProbeConfig) -> Result<Self> {
        Self::with_config(&HttpProberConfig::from_probe_config(probe_config))
    }

    pub fn with_config(config: &HttpProberConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(&config.user_agent)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProber for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        debug!("🌐 HTTP HEAD: {}", url);
        match self.client.head(url).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("HEAD {} -> {}", url, status);
                ProbeOutcome::Status(status.as_u16())
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                ProbeOutcome::Failed(e.to_string())
            }
        }
    }
}
