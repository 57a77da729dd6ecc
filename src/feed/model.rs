// src/feed/model.rs

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing::debug;

/// Standard Kraken public-API envelope. Errors travel in-band as strings;
/// `result` is a mapping keyed by pair symbol.
#[derive(Debug, Deserialize)]
pub struct KrakenEnvelope<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<BTreeMap<String, T>>,
}

impl<T> KrakenEnvelope<T> {
    /// Unwrap the envelope, surfacing in-band errors.
    pub fn into_result(self) -> Result<BTreeMap<String, T>> {
        if !self.error.is_empty() {
            return Err(anyhow!("feed error: {}", self.error.join("; ")));
        }
        self.result.ok_or_else(|| anyhow!("feed returned no result"))
    }
}

/// Raw ticker entry. `c` is the "last trade closed" array: [price, lot volume].
#[derive(Debug, Deserialize)]
pub struct TickerInfo {
    #[serde(default)]
    pub c: Vec<String>,
}

/// Raw asset-pair entry. `wsname` is the human-readable websocket symbol
/// formatted as `BASE/QUOTE`.
#[derive(Debug, Deserialize)]
pub struct PairInfo {
    pub wsname: Option<String>,
}

/// Latest trade price for one pair symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTicker {
    pub name: String,
    pub last_price: Option<String>,
}

/// One tradable asset pair, base/quote split out of `wsname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub name: String,
    pub base: String,
    pub quote: String,
}

/// Flatten the ticker mapping into `RawTicker`s, keeping the entry even when
/// the price array is empty (such pairs simply never produce an edge).
pub fn normalize_tickers(result: BTreeMap<String, TickerInfo>) -> Vec<RawTicker> {
    result
        .into_iter()
        .map(|(name, info)| RawTicker {
            name,
            last_price: info.c.into_iter().next(),
        })
        .collect()
}

/// Flatten the pairs mapping into `RawPair`s. Entries without a well-formed
/// `wsname` are dropped per entry rather than failing the whole feed.
pub fn normalize_pairs(result: BTreeMap<String, PairInfo>) -> Vec<RawPair> {
    result
        .into_iter()
        .filter_map(|(name, info)| {
            let Some(wsname) = info.wsname else {
                debug!(pair = %name, "skipping pair without wsname");
                return None;
            };
            let Some((base, quote)) = wsname.split_once('/') else {
                debug!(pair = %name, wsname = %wsname, "skipping pair with malformed wsname");
                return None;
            };
            Some(RawPair {
                name,
                base: base.to_string(),
                quote: quote.to_string(),
            })
        })
        .collect()
}
