// src/path_request.rs

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::graph::{MarketGraph, Node, NodeId, NodeIdMap};

/// Bounded retry for a path backend that answers `null` until it has warmed
/// up. Backoff doubles per attempt up to the cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // The hosted backend cold-starts in roughly 10-30 seconds.
        Self {
            max_attempts: 6,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 16_000,
        }
    }
}

/// Edge endpoint as submitted to the path service. `index` is the layout
/// index assigned by the rendering collaborator, passed through verbatim.
#[derive(Debug, Serialize, PartialEq)]
struct WireEndpoint {
    id: NodeId,
    label: String,
    index: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
struct WireEdge {
    source: WireEndpoint,
    target: WireEndpoint,
    weight: f64,
}

/// Node as submitted to the path service: position/velocity stripped, the
/// layout index kept.
#[derive(Debug, Serialize, PartialEq)]
struct WireNode {
    id: NodeId,
    label: String,
    index: Option<u32>,
}

fn endpoint(node: &Node) -> WireEndpoint {
    WireEndpoint {
        id: node.id,
        label: node.label.clone(),
        index: node.layout.map(|l| l.index),
    }
}

/// Expand the graph into the `[edges, nodes]` request body.
fn graph_payload(graph: &MarketGraph) -> Result<(Vec<WireEdge>, Vec<WireNode>)> {
    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let source = graph
                .node(edge.source)
                .ok_or_else(|| anyhow!("edge references missing node id {}", edge.source))?;
            let target = graph
                .node(edge.target)
                .ok_or_else(|| anyhow!("edge references missing node id {}", edge.target))?;
            Ok(WireEdge {
                source: endpoint(source),
                target: endpoint(target),
                weight: edge.weight,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let nodes = graph
        .nodes
        .iter()
        .map(|node| WireNode {
            id: node.id,
            label: node.label.clone(),
            index: node.layout.map(|l| l.index),
        })
        .collect();

    Ok((edges, nodes))
}

/// Parse the service reply. An empty or whitespace body and JSON `null` both
/// mean "not ready yet"; anything else must be an ordered id array.
fn parse_path_response(body: &[u8]) -> Result<Option<Vec<NodeId>>> {
    let text = std::str::from_utf8(body).context("malformed path response")?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).context("malformed path response")
}

/// Translate a returned id sequence into labels. An unknown id abandons the
/// whole path so a result is never partially applied.
pub fn map_path(ids: &[NodeId], node_ids: &NodeIdMap) -> Result<Vec<String>> {
    ids.iter()
        .map(|&id| {
            node_ids
                .label_of(id)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("path service returned unknown node id {id}"))
        })
        .collect()
}

/// Client for the external path-computation service.
pub struct PathClient {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl PathClient {
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            retry,
        }
    }

    /// Submit the current graph and map the returned ids back to labels.
    ///
    /// A `null` response means the backend is not ready yet; the identical
    /// request is retried under the retry policy. `Ok(None)` means the
    /// budget ran out without a path. Transport errors and non-2xx statuses
    /// abandon the request without retrying.
    pub async fn request_path(&self, graph: &MarketGraph) -> Result<Option<Vec<String>>> {
        let payload = graph_payload(graph)?;
        let mut backoff = self.retry.initial_backoff_ms;

        for attempt in 1..=self.retry.max_attempts {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .context("path service unreachable")?
                .error_for_status()
                .context("path service rejected the request")?;

            let body = response
                .bytes()
                .await
                .context("path service reply unreadable")?;

            match parse_path_response(&body)? {
                Some(ids) => {
                    debug!(len = ids.len(), "path service answered");
                    return map_path(&ids, &graph.node_ids).map(Some);
                }
                None => {
                    if attempt < self.retry.max_attempts {
                        warn!(attempt, backoff_ms = backoff, "path service not ready, retrying");
                        sleep(Duration::from_millis(backoff)).await;
                        backoff = (backoff * 2).min(self.retry.max_backoff_ms);
                    }
                }
            }
        }

        warn!(
            attempts = self.retry.max_attempts,
            "path service produced no path within the retry budget"
        );
        Ok(None)
    }
}
