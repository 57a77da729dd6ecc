// src/config.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::graph::ExcludedAssets;
use crate::path_request::RetryPolicy;

/// Top-level configuration loaded from `config/arb_graph.toml`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub path_service: PathServiceConfig,
    pub graph: GraphConfig,
}

/// Endpoints for the two public market-data feeds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub ticker_url: String,
    pub pairs_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ticker_url: "https://api.kraken.com/0/public/Ticker".into(),
            pairs_url: "https://api.kraken.com/0/public/AssetPairs".into(),
        }
    }
}

/// Path-computation service endpoint and its retry policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathServiceConfig {
    pub url: String,
    pub retry: RetryPolicy,
}

impl Default for PathServiceConfig {
    fn default() -> Self {
        Self {
            url: "https://arbitrage-backend-utji.onrender.com/process-graph".into(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Graph-construction policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    pub excluded_assets: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            excluded_assets: vec!["USD".into(), "EUR".into()],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file. A missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed =
            toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(parsed)
    }

    pub fn excluded_assets(&self) -> ExcludedAssets {
        ExcludedAssets::new(self.graph.excluded_assets.iter().cloned())
    }
}
