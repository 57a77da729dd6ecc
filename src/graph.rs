// src/graph.rs

use std::collections::{HashMap, HashSet};

use crate::feed::{RawPair, RawTicker};

/// Node ids start at 1 and are assigned in first-seen order. They are stable
/// for the lifetime of one graph, not across rebuilds.
pub type NodeId = u32;

/// Assets excluded from graph participation.
///
/// The tradable graph is crypto-to-crypto only: a pair contributes no nodes
/// when either side is excluded, so fiat never appears even as a counterpart.
#[derive(Debug, Clone)]
pub struct ExcludedAssets(HashSet<String>);

impl Default for ExcludedAssets {
    fn default() -> Self {
        Self::new(["USD", "EUR"])
    }
}

impl ExcludedAssets {
    pub fn new<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(assets.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.0.contains(asset)
    }
}

/// Transient force-layout data owned by the rendering collaborator.
///
/// Never submitted to the path service; only `index` passes through verbatim
/// when edge endpoints are expanded for the request body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLayout {
    pub index: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// One asset in the tradable graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub layout: Option<NodeLayout>,
}

/// Directed base→quote edge, weighted by the pair's last trade price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

/// Bidirectional label ↔ id association for one graph build.
///
/// The path service speaks ids, everything user-facing speaks labels. Rebuilt
/// on every graph construction; stale on any partial refresh.
#[derive(Debug, Clone, Default)]
pub struct NodeIdMap {
    by_label: HashMap<String, NodeId>,
    by_id: HashMap<NodeId, String>,
}

impl NodeIdMap {
    pub fn id_of(&self, label: &str) -> Option<NodeId> {
        self.by_label.get(label).copied()
    }

    pub fn label_of(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    fn insert(&mut self, label: &str, id: NodeId) {
        self.by_label.insert(label.to_string(), id);
        self.by_id.insert(id, label.to_string());
    }
}

/// A node/edge graph derived from the two raw feeds.
#[derive(Debug, Clone, Default)]
pub struct MarketGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub node_ids: NodeIdMap,
}

impl MarketGraph {
    /// Nodes are stored in id order, so lookup is an index.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.checked_sub(1)? as usize)
    }
}

/// Build the tradable graph from the two raw feeds.
///
/// Two passes over `pairs` in input order:
/// 1. Assign ids and create nodes for every pair whose base *and* quote are
///    outside the exclusion set. A label is only ever assigned one id.
/// 2. Create a directed base→quote edge for every pair whose endpoints both
///    received ids and whose ticker (matched by exact symbol name) carries a
///    parseable last price.
///
/// A missing ticker or undefined price is not an error: arbitrage needs a
/// live price, so such pairs are silently excluded from the tradable graph.
pub fn build_graph(
    tickers: &[RawTicker],
    pairs: &[RawPair],
    excluded: &ExcludedAssets,
) -> MarketGraph {
    let mut nodes = Vec::new();
    let mut node_ids = NodeIdMap::default();
    let mut next_id: NodeId = 1;

    for pair in pairs {
        if excluded.contains(&pair.base) || excluded.contains(&pair.quote) {
            continue;
        }
        for label in [&pair.base, &pair.quote] {
            if node_ids.id_of(label).is_none() {
                node_ids.insert(label, next_id);
                nodes.push(Node {
                    id: next_id,
                    label: label.clone(),
                    layout: None,
                });
                next_id += 1;
            }
        }
    }

    let prices: HashMap<&str, &RawTicker> =
        tickers.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut edges = Vec::new();
    for pair in pairs {
        let (Some(source), Some(target)) = (node_ids.id_of(&pair.base), node_ids.id_of(&pair.quote))
        else {
            continue;
        };
        let Some(weight) = prices
            .get(pair.name.as_str())
            .and_then(|t| t.last_price.as_deref())
            .and_then(|p| p.parse::<f64>().ok())
        else {
            continue;
        };
        edges.push(Edge {
            source,
            target,
            weight,
        });
    }

    MarketGraph {
        nodes,
        edges,
        node_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, base: &str, quote: &str) -> RawPair {
        RawPair {
            name: name.into(),
            base: base.into(),
            quote: quote.into(),
        }
    }

    fn ticker(name: &str, price: &str) -> RawTicker {
        RawTicker {
            name: name.into(),
            last_price: Some(price.into()),
        }
    }

    #[test]
    fn fiat_quoted_pair_contributes_nothing() {
        let pairs = [pair("XBTUSD", "XBT", "USD")];
        let tickers = [ticker("XBTUSD", "50000")];

        let graph = build_graph(&tickers, &pairs, &ExcludedAssets::default());

        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert!(graph.node_ids.is_empty());
    }

    #[test]
    fn crypto_pair_yields_nodes_and_a_directed_edge() {
        let pairs = [pair("ETHXBT", "ETH", "XBT")];
        let tickers = [ticker("ETHXBT", "0.05")];

        let graph = build_graph(&tickers, &pairs, &ExcludedAssets::default());

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, 1);
        assert_eq!(graph.nodes[0].label, "ETH");
        assert_eq!(graph.nodes[1].id, 2);
        assert_eq!(graph.nodes[1].label, "XBT");
        assert_eq!(
            graph.edges,
            [Edge {
                source: 1,
                target: 2,
                weight: 0.05
            }]
        );
    }

    #[test]
    fn missing_ticker_drops_the_edge_but_keeps_the_nodes() {
        let pairs = [pair("ETHXBT", "ETH", "XBT")];

        let graph = build_graph(&[], &pairs, &ExcludedAssets::default());

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn undefined_or_unparseable_price_drops_the_edge() {
        let pairs = [pair("ETHXBT", "ETH", "XBT"), pair("SOLETH", "SOL", "ETH")];
        let tickers = [
            RawTicker {
                name: "ETHXBT".into(),
                last_price: None,
            },
            ticker("SOLETH", "not-a-price"),
        ];

        let graph = build_graph(&tickers, &pairs, &ExcludedAssets::default());

        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn ids_are_assigned_in_first_seen_order_without_gaps() {
        let pairs = [
            pair("ETHXBT", "ETH", "XBT"),
            pair("SOLXBT", "SOL", "XBT"),
            pair("SOLETH", "SOL", "ETH"),
            pair("ADAETH", "ADA", "ETH"),
        ];
        let graph = build_graph(&[], &pairs, &ExcludedAssets::default());

        let seen: Vec<(NodeId, &str)> = graph
            .nodes
            .iter()
            .map(|n| (n.id, n.label.as_str()))
            .collect();
        assert_eq!(seen, [(1, "ETH"), (2, "XBT"), (3, "SOL"), (4, "ADA")]);
    }

    #[test]
    fn asset_seen_only_against_fiat_gets_no_node() {
        // XBT qualifies through ETHXBT, ADA only ever faces USD.
        let pairs = [
            pair("ADAUSD", "ADA", "USD"),
            pair("ETHXBT", "ETH", "XBT"),
            pair("XBTUSD", "XBT", "USD"),
        ];
        let graph = build_graph(&[], &pairs, &ExcludedAssets::default());

        assert!(graph.node_ids.id_of("ADA").is_none());
        assert!(graph.node_ids.id_of("USD").is_none());
        assert!(graph.node_ids.id_of("XBT").is_some());
    }

    #[test]
    fn exclusion_policy_is_configurable() {
        let pairs = [pair("ETHXBT", "ETH", "XBT"), pair("XBTUSD", "XBT", "USD")];
        let tickers = [ticker("ETHXBT", "0.05"), ticker("XBTUSD", "50000")];

        let graph = build_graph(&tickers, &pairs, &ExcludedAssets::new(["ETH"]));

        // With ETH excluded instead, the fiat pair now qualifies.
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.node_ids.id_of("XBT"), Some(1));
        assert_eq!(graph.node_ids.id_of("USD"), Some(2));
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn rebuild_with_identical_input_is_deterministic() {
        let pairs = [
            pair("ETHXBT", "ETH", "XBT"),
            pair("SOLETH", "SOL", "ETH"),
            pair("SOLXBT", "SOL", "XBT"),
        ];
        let tickers = [
            ticker("ETHXBT", "0.05"),
            ticker("SOLETH", "0.07"),
            ticker("SOLXBT", "0.0035"),
        ];

        let first = build_graph(&tickers, &pairs, &ExcludedAssets::default());
        let second = build_graph(&tickers, &pairs, &ExcludedAssets::default());

        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.edges, second.edges);
        for node in &first.nodes {
            assert_eq!(second.node_ids.id_of(&node.label), Some(node.id));
        }
    }

    #[test]
    fn node_lookup_by_id_matches_the_map() {
        let pairs = [pair("ETHXBT", "ETH", "XBT")];
        let graph = build_graph(&[], &pairs, &ExcludedAssets::default());

        assert_eq!(graph.node(1).map(|n| n.label.as_str()), Some("ETH"));
        assert_eq!(graph.node(2).map(|n| n.label.as_str()), Some("XBT"));
        assert_eq!(graph.node(0), None);
        assert_eq!(graph.node(3), None);
        assert_eq!(graph.node_ids.label_of(2), Some("XBT"));
    }
}
