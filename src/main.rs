// src/main.rs

use anyhow::Result;
use tracing::{error, info, warn};

use arb_graph::config::AppConfig;
use arb_graph::feed::FeedClient;
use arb_graph::graph::build_graph;
use arb_graph::path_request::PathClient;
use arb_graph::view::ViewState;

const CONFIG_PATH: &str = "config/arb_graph.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load(CONFIG_PATH)?;
    let mut view = ViewState::new();
    view.begin_loading();

    let feed = FeedClient::new(config.feed.clone());
    let (tickers, pairs) = match feed.fetch_market_data().await {
        Ok(data) => data,
        Err(e) => {
            // Without data the view never leaves loading.
            error!("error fetching market data: {e:#}");
            return Ok(());
        }
    };
    info!(tickers = tickers.len(), pairs = pairs.len(), "market data ready");

    let graph = build_graph(&tickers, &pairs, &config.excluded_assets());
    info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "graph built");
    view.graph_ready(graph);

    let Some(generation) = view.request_path() else {
        return Ok(());
    };

    let client = PathClient::new(
        config.path_service.url.clone(),
        config.path_service.retry.clone(),
    );
    let outcome = {
        let Some(graph) = view.graph() else {
            return Ok(());
        };
        client.request_path(graph).await
    };

    match outcome {
        Ok(Some(path)) => {
            if view.apply_path(generation, path) {
                if let Some(path) = view.path() {
                    println!("Optimal path: {}", path.join(" → "));
                }
            }
        }
        Ok(None) => {
            view.request_failed(generation);
            warn!("path service produced no path");
        }
        Err(e) => {
            view.request_failed(generation);
            error!("error posting to path service: {e:#}");
        }
    }

    Ok(())
}
