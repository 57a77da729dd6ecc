// src/feed/mod.rs

pub mod model;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::FeedConfig;

pub use model::{RawPair, RawTicker};

use model::{KrakenEnvelope, PairInfo, TickerInfo};

/// HTTP client for the two public market-data feeds.
///
/// This component only fetches and normalizes; graph construction never
/// touches the network.
pub struct FeedClient {
    client: Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Fetch both feeds concurrently and await them jointly; the first
    /// failure of either source aborts the combined fetch.
    pub async fn fetch_market_data(&self) -> Result<(Vec<RawTicker>, Vec<RawPair>)> {
        let (tickers, pairs) = tokio::try_join!(self.fetch_ticker(), self.fetch_asset_pairs())?;
        Ok((tickers, pairs))
    }

    /// Fetch the ticker feed: symbol → latest trade price.
    pub async fn fetch_ticker(&self) -> Result<Vec<RawTicker>> {
        info!(url = %self.config.ticker_url, "fetching ticker data");

        let envelope: KrakenEnvelope<TickerInfo> = self
            .client
            .get(&self.config.ticker_url)
            .send()
            .await
            .context("ticker feed unreachable")?
            .error_for_status()
            .context("ticker feed refused the request")?
            .json()
            .await
            .context("malformed ticker response")?;

        let tickers = model::normalize_tickers(envelope.into_result()?);
        debug!(count = tickers.len(), "normalized ticker entries");
        Ok(tickers)
    }

    /// Fetch the asset-pairs metadata feed: symbol → `BASE/QUOTE` wsname.
    pub async fn fetch_asset_pairs(&self) -> Result<Vec<RawPair>> {
        info!(url = %self.config.pairs_url, "fetching asset pairs");

        let envelope: KrakenEnvelope<PairInfo> = self
            .client
            .get(&self.config.pairs_url)
            .send()
            .await
            .context("pairs feed unreachable")?
            .error_for_status()
            .context("pairs feed refused the request")?
            .json()
            .await
            .context("malformed pairs response")?;

        let pairs = model::normalize_pairs(envelope.into_result()?);
        debug!(count = pairs.len(), "normalized pair entries");
        Ok(pairs)
    }
}
