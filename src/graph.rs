// PeerScope: Routing-protocol topology graphs from device snapshots
// Copyright (C) 2024 The PeerScope Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! The topology graph of a single scope.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    Directed, Direction, Graph,
};
use routing_snapshot::{AsId, PeerStatus};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use thiserror::Error;

use crate::color::ClassificationKey;

/// Index type of the underlying graph.
pub(crate) type IndexType = u32;
/// The underlying petgraph of a topology.
pub type AdjacencyGraph = Graph<GraphNode, GraphEdge, Directed, IndexType>;

/// Whether a node is the device that reported the adjacency, or the remote end of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The device owning the instance or process.
    Local,
    /// A peer or neighbor.
    Peer,
}

/// A router or peer in a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Router ID or peer address. Unique within a topology.
    pub id: String,
    /// Local router or remote peer.
    pub kind: NodeKind,
    /// Scope of the topology the node belongs to.
    #[serde(rename = "scope")]
    pub scope_key: String,
    /// Attribute that decides the color of this node.
    #[serde(rename = "classification")]
    pub classification_key: ClassificationKey,
    /// Color of the node.
    pub color: String,
    /// Hostname of the node, or `"na"` if it cannot be resolved.
    #[serde(rename = "label")]
    pub display_label: String,
}

/// Protocol-specific information about an adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum EdgeAttributes {
    /// A BGP session.
    Bgp {
        /// AS number of the local router.
        local_as: AsId,
        /// AS number of the peer.
        peer_as: AsId,
        /// State of the session, as reported by the local router.
        status: PeerStatus,
    },
    /// An OSPF adjacency.
    Ospf {
        /// Process of the local router.
        process_id: String,
        /// Area in which the neighbor was found.
        area_id: String,
        /// Interface address of the neighbor.
        address: String,
        /// State of the adjacency.
        state: String,
        /// Local interface towards the neighbor.
        interface: String,
    },
}

impl EdgeAttributes {
    /// Returns `true` if the adjacency is up (BGP session established, or OSPF adjacency in full
    /// state).
    pub fn is_up(&self) -> bool {
        match self {
            EdgeAttributes::Bgp { status, .. } => status.is_established(),
            EdgeAttributes::Ospf { state, .. } => state
                .trim()
                .get(..4)
                .map_or(false, |s| s.eq_ignore_ascii_case("full")),
        }
    }
}

/// A directed adjacency from the reporting device towards its peer or neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Id of the reporting node.
    pub source: String,
    /// Id of the peer or neighbor node.
    pub target: String,
    /// Scope of the topology the edge belongs to.
    #[serde(rename = "scope")]
    pub scope_key: String,
    /// Protocol-specific attributes.
    #[serde(flatten)]
    pub attributes: EdgeAttributes,
}

/// Error when modifying a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node is not part of the topology.
    #[error("Node {0} does not exist in scope {1}")]
    NodeNotFound(String, String),
}

/// The topology of one scope (a BGP VPN instance or an OSPF process). Nodes are unique by their
/// id; inserting a node whose id already exists keeps the existing node. Edges are kept in the
/// order they were added, and reciprocal edges are not merged.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    scope_key: String,
    graph: AdjacencyGraph,
    ids: HashMap<String, NodeIndex<IndexType>>,
}

impl TopologyGraph {
    /// Create an empty topology for a scope.
    pub fn new(scope_key: impl Into<String>) -> Self {
        Self {
            scope_key: scope_key.into(),
            graph: Graph::default(),
            ids: HashMap::new(),
        }
    }

    /// The scope of this topology.
    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    /// Insert a node, unless a node with the same id already exists. Returns the index of the node
    /// in the graph, and whether it was inserted. The first inserted node always wins; the
    /// metadata of later duplicates is discarded.
    pub fn insert_node(
        &mut self,
        id: impl Into<String>,
        kind: NodeKind,
        classification_key: ClassificationKey,
        color: impl Into<String>,
        display_label: impl Into<String>,
    ) -> (NodeIndex<IndexType>, bool) {
        let id = id.into();
        if let Some(idx) = self.ids.get(&id) {
            log::trace!(
                "[{}] Node {} already exists, dropping the duplicate",
                self.scope_key,
                id
            );
            return (*idx, false);
        }
        let idx = self.graph.add_node(GraphNode {
            id: id.clone(),
            kind,
            scope_key: self.scope_key.clone(),
            classification_key,
            color: color.into(),
            display_label: display_label.into(),
        });
        self.ids.insert(id, idx);
        (idx, true)
    }

    /// Add a directed edge between two existing nodes, given by their id.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        attributes: EdgeAttributes,
    ) -> Result<EdgeIndex<IndexType>, GraphError> {
        let a = self.node_index(source)?;
        let b = self.node_index(target)?;
        Ok(self.connect(a, b, attributes))
    }

    /// Add a directed edge between two nodes of this graph, given by their index.
    pub(crate) fn connect(
        &mut self,
        a: NodeIndex<IndexType>,
        b: NodeIndex<IndexType>,
        attributes: EdgeAttributes,
    ) -> EdgeIndex<IndexType> {
        let edge = GraphEdge {
            source: self.graph[a].id.clone(),
            target: self.graph[b].id.clone(),
            scope_key: self.scope_key.clone(),
            attributes,
        };
        self.graph.add_edge(a, b, edge)
    }

    fn node_index(&self, id: &str) -> Result<NodeIndex<IndexType>, GraphError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string(), self.scope_key.clone()))
    }

    /// Get a node by its id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.ids.get(id).map(|idx| &self.graph[*idx])
    }

    /// Returns `true` if a node with that id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.graph.node_weights()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.graph.edge_weights()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes adjacent to `id`, in either direction, without duplicates. Returns an empty list
    /// if the node does not exist.
    pub fn neighbors(&self, id: &str) -> Vec<&GraphNode> {
        let Some(idx) = self.ids.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_undirected(*idx)
            .unique()
            .sorted()
            .map(|n| &self.graph[n])
            .collect()
    }

    /// Number of edges that start or end at `id`.
    pub fn degree(&self, id: &str) -> usize {
        self.ids.get(id).map_or(0, |idx| {
            self.graph.edges_directed(*idx, Direction::Outgoing).count()
                + self.graph.edges_directed(*idx, Direction::Incoming).count()
        })
    }

    /// The underlying petgraph, e.g. to run graph algorithms on the topology.
    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }
}

impl Serialize for TopologyGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("TopologyGraph", 3)?;
        s.serialize_field("scope", &self.scope_key)?;
        s.serialize_field("nodes", &self.nodes().collect_vec())?;
        s.serialize_field("links", &self.edges().collect_vec())?;
        s.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn insert(g: &mut TopologyGraph, id: &str, kind: NodeKind, label: &str) -> bool {
        g.insert_node(id, kind, AsId(1).into(), "#1f77b4", label).1
    }

    fn bgp() -> EdgeAttributes {
        EdgeAttributes::Bgp {
            local_as: AsId(1),
            peer_as: AsId(1),
            status: PeerStatus::Established,
        }
    }

    #[test]
    fn first_node_wins() {
        let mut g = TopologyGraph::new("Global");
        let (a, inserted) = g.insert_node("1.1.1.1", NodeKind::Peer, AsId(1).into(), "red", "na");
        assert!(inserted);
        let (b, inserted) =
            g.insert_node("1.1.1.1", NodeKind::Local, AsId(2).into(), "blue", "R1");
        assert!(!inserted);
        assert_eq!(a, b);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node("1.1.1.1").unwrap().kind, NodeKind::Peer);
        assert_eq!(g.node("1.1.1.1").unwrap().display_label, "na");
        assert_eq!(g.node("1.1.1.1").unwrap().color, "red");
        assert_eq!(g.node("1.1.1.1").unwrap().scope_key, "Global");
    }

    #[test]
    fn edges_need_endpoints() {
        let mut g = TopologyGraph::new("Global");
        assert!(insert(&mut g, "a", NodeKind::Local, "A"));
        assert_eq!(
            g.add_edge("a", "b", bgp()),
            Err(GraphError::NodeNotFound("b".to_string(), "Global".to_string()))
        );
        assert!(insert(&mut g, "b", NodeKind::Peer, "B"));
        g.add_edge("a", "b", bgp()).unwrap();
        g.add_edge("b", "a", bgp()).unwrap();
        g.add_edge("a", "b", bgp()).unwrap();
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.degree("a"), 3);
        assert_eq!(g.degree("c"), 0);
        assert_eq!(
            g.neighbors("a").into_iter().map(|n| n.id.as_str()).collect_vec(),
            vec!["b"]
        );
        assert!(g.neighbors("c").is_empty());
    }

    #[test]
    fn up_state() {
        assert!(bgp().is_up());
        let ospf = |state: &str| EdgeAttributes::Ospf {
            process_id: "1".to_string(),
            area_id: "0.0.0.0".to_string(),
            address: "10.0.0.1".to_string(),
            state: state.to_string(),
            interface: "GE0/0".to_string(),
        };
        assert!(ospf("Full/DR").is_up());
        assert!(!ospf("ExStart").is_up());
    }

    #[test]
    fn serialize() {
        let mut g = TopologyGraph::new("Global");
        assert!(insert(&mut g, "a", NodeKind::Local, "A"));
        assert!(insert(&mut g, "b", NodeKind::Peer, "na"));
        g.add_edge("a", "b", bgp()).unwrap();
        assert_eq!(
            serde_json::to_value(&g).unwrap(),
            json!({
                "scope": "Global",
                "nodes": [
                    {"id": "a", "kind": "local", "scope": "Global", "classification": 1, "color": "#1f77b4", "label": "A"},
                    {"id": "b", "kind": "peer", "scope": "Global", "classification": 1, "color": "#1f77b4", "label": "na"}
                ],
                "links": [
                    {"source": "a", "target": "b", "scope": "Global", "protocol": "bgp", "local_as": 1, "peer_as": 1, "status": "Established"}
                ]
            })
        );
    }
}
