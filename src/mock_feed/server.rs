// src/mock_feed/server.rs

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::debug;

use super::quotes::seed_prices;

/// One mock tradable pair: Kraken symbol plus its `BASE/QUOTE` wsname.
#[derive(Debug, Clone)]
pub struct PairSpec {
    pub name: String,
    pub wsname: String,
}

impl PairSpec {
    pub fn new(name: &str, wsname: &str) -> Self {
        Self {
            name: name.into(),
            wsname: wsname.into(),
        }
    }
}

/// Canned market state behind the mock endpoints.
///
/// `/process-graph` answers `null` for the first `warm_after` posts, the way
/// the hosted backend does while spinning up, then answers with the endpoints
/// of the first submitted edge.
pub struct MockMarket {
    pairs: Vec<PairSpec>,
    prices: BTreeMap<String, String>,
    warm_after: u32,
    cold_reply_empty: bool,
    posts_seen: AtomicU32,
}

impl MockMarket {
    pub fn new(pairs: Vec<PairSpec>, warm_after: u32) -> Self {
        let symbols: Vec<String> = pairs.iter().map(|p| p.name.clone()).collect();
        Self {
            prices: seed_prices(&symbols),
            pairs,
            warm_after,
            cold_reply_empty: false,
            posts_seen: AtomicU32::new(0),
        }
    }

    /// Answer cold posts with an empty body instead of JSON `null`; the
    /// hosted backend has been seen doing both while spinning up.
    pub fn reply_empty_while_cold(&mut self) {
        self.cold_reply_empty = true;
    }

    /// Pin an exact price for one symbol.
    pub fn set_price(&mut self, symbol: &str, price: &str) {
        self.prices.insert(symbol.into(), price.into());
    }

    /// Remove a symbol's quote so the pair yields no edge.
    pub fn clear_price(&mut self, symbol: &str) {
        self.prices.remove(symbol);
    }

    fn ticker_body(&self) -> String {
        let mut result = serde_json::Map::new();
        for pair in &self.pairs {
            if let Some(price) = self.prices.get(&pair.name) {
                result.insert(pair.name.clone(), json!({ "c": [price, "1.00000000"] }));
            }
        }
        json!({ "error": [], "result": result }).to_string()
    }

    fn pairs_body(&self) -> String {
        let mut result = serde_json::Map::new();
        for pair in &self.pairs {
            result.insert(pair.name.clone(), json!({ "wsname": pair.wsname }));
        }
        json!({ "error": [], "result": result }).to_string()
    }

    fn path_body(&self, payload: &[u8]) -> String {
        let posts = self.posts_seen.fetch_add(1, Ordering::SeqCst);
        if posts < self.warm_after {
            return if self.cold_reply_empty {
                String::new()
            } else {
                "null".to_string()
            };
        }
        let Ok(parsed) = serde_json::from_slice::<Value>(payload) else {
            return "null".to_string();
        };
        // Body is [edges, nodes]; answer with the first edge's endpoints.
        match parsed.get(0).and_then(|edges| edges.get(0)) {
            Some(edge) => {
                let source = edge.pointer("/source/id").cloned().unwrap_or(Value::Null);
                let target = edge.pointer("/target/id").cloned().unwrap_or(Value::Null);
                json!([source, target]).to_string()
            }
            None => "[]".to_string(),
        }
    }
}

async fn handle(
    req: Request<Incoming>,
    market: Arc<MockMarket>,
) -> Result<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let body = if method == Method::GET && path.ends_with("/Ticker") {
        market.ticker_body()
    } else if method == Method::GET && path.ends_with("/AssetPairs") {
        market.pairs_body()
    } else if method == Method::POST && path == "/process-graph" {
        let payload = req.into_body().collect().await?.to_bytes();
        market.path_body(&payload)
    } else {
        return Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from_static(b"not found")))?);
    };

    Ok(Response::builder()
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))?)
}

/// Serve the mock market on an ephemeral local port in the background.
/// Returns the bound address.
pub async fn spawn(market: MockMarket) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let market = Arc::new(market);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let io = TokioIo::new(stream);
            let market = Arc::clone(&market);
            tokio::spawn(async move {
                let service = service_fn(move |req| handle(req, Arc::clone(&market)));
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("mock market connection closed: {e}");
                }
            });
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_market() -> MockMarket {
        MockMarket::new(
            vec![
                PairSpec::new("ETHXBT", "ETH/XBT"),
                PairSpec::new("XBTUSD", "XBT/USD"),
            ],
            0,
        )
    }

    #[test]
    fn ticker_body_is_kraken_shaped() {
        let market = mock_market();
        let body: Value = serde_json::from_str(&market.ticker_body()).unwrap();

        assert_eq!(body["error"], json!([]));
        assert!(body["result"]["ETHXBT"]["c"][0].is_string());
    }

    #[test]
    fn cleared_prices_disappear_from_the_ticker() {
        let mut market = mock_market();
        market.clear_price("ETHXBT");

        let body: Value = serde_json::from_str(&market.ticker_body()).unwrap();
        assert!(body["result"].get("ETHXBT").is_none());
        assert!(body["result"].get("XBTUSD").is_some());
    }

    #[test]
    fn path_body_answers_null_until_warm() {
        let mut market = mock_market();
        market.warm_after = 2;

        let request = br#"[[{"source":{"id":1},"target":{"id":2},"weight":0.05}],[]]"#;
        assert_eq!(market.path_body(request), "null");
        assert_eq!(market.path_body(request), "null");
        assert_eq!(market.path_body(request), "[1,2]");
    }

    #[test]
    fn cold_reply_can_be_an_empty_body() {
        let mut market = mock_market();
        market.warm_after = 1;
        market.reply_empty_while_cold();

        let request = br#"[[{"source":{"id":1},"target":{"id":2},"weight":0.05}],[]]"#;
        assert_eq!(market.path_body(request), "");
        assert_eq!(market.path_body(request), "[1,2]");
    }

    #[test]
    fn path_body_with_no_edges_is_an_empty_path() {
        let market = mock_market();
        assert_eq!(market.path_body(b"[[],[]]"), "[]");
    }
}
