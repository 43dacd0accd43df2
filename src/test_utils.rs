//! Test doubles for the collaborator traits
//!
//! Scripted implementations that record every call so tests can assert on
//! network and discovery traffic without touching the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::product::ProductRow;
use crate::domain::services::{ImageDiscovery, ProbeOutcome, RepairPacer, UrlProber};

/// Prober answering from a URL → outcome table
pub struct ScriptedProber {
    outcomes: HashMap<String, ProbeOutcome>,
    fallback: ProbeOutcome,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProber {
    /// Every unscripted URL answers `fallback`.
    pub fn new(fallback: ProbeOutcome) -> Self {
        Self {
            outcomes: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn all_ok() -> Self {
        Self::new(ProbeOutcome::Status(200))
    }

    pub fn all_broken() -> Self {
        Self::new(ProbeOutcome::Status(404))
    }

    pub fn with(mut self, url: &str, outcome: ProbeOutcome) -> Self {
        self.outcomes.insert(url.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl UrlProber for ScriptedProber {
    async fn probe(&self, url: &str, _timeout: Duration) -> ProbeOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        self.outcomes.get(url).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Discovery answering from a query → URL table; unknown queries find nothing
#[derive(Default)]
pub struct ScriptedDiscovery {
    answers: HashMap<String, String>,
    failing: bool,
    queries: Mutex<Vec<String>>,
}

impl ScriptedDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call returns an error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, query: &str, url: &str) -> Self {
        self.answers.insert(query.to_string(), url.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageDiscovery for ScriptedDiscovery {
    async fn discover(&self, query: &str) -> anyhow::Result<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.failing {
            anyhow::bail!("search backend unavailable");
        }
        Ok(self.answers.get(query).cloned())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Pacer that only counts pauses
#[derive(Default)]
pub struct CountingPacer {
    pauses: AtomicUsize,
}

impl CountingPacer {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepairPacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Product row in `category` with an optional image URL
pub fn product(row_index: usize, sku: &str, category: &str, image_url: Option<&str>) -> ProductRow {
    ProductRow {
        row_index,
        id_sku: sku.to_string(),
        name: format!("Item {sku}"),
        brand: "Acme".to_string(),
        category: category.to_string(),
        description: image_url.unwrap_or("No image yet").to_string(),
        image_url: image_url.map(str::to_string),
    }
}
