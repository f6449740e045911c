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

//! # PeerScope: Routing-protocol topology graphs from device snapshots
//!
//! PeerScope reads per-device routing snapshots (the BGP peer table and the OSPF neighbor table of
//! each device) and turns them into one deduplicated topology graph per scope. A scope is a BGP
//! VPN instance or an OSPF process. Peers are matched to the device that owns their address, so
//! the graph shows hostnames wherever the owning device is part of the snapshot, and `"na"`
//! otherwise. Every node is colored by its AS number (BGP) or router ID (OSPF), using a palette
//! that is assigned deterministically in the order the keys are first seen.
//!
//! ```
//! use peerscope::{build_bgp, Config, RecordSet};
//!
//! let records = RecordSet::from_json_str(r#"[
//!     {"hostname": "R1", "BGP": [{"local_router_id": "10.0.0.1", "local_as_number": 100,
//!         "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Established"}]}]},
//!     {"hostname": "R2", "BGP": [{"local_router_id": "10.0.0.2", "local_as_number": 200,
//!         "Peer": [{"peer_IP": "10.0.0.1", "peer_AS": 100, "peer_status": "Established"}]}]}
//! ]"#).unwrap();
//!
//! let topo = build_bgp(&records, &Config::default()).unwrap();
//! let global = topo.check().unwrap().get("Global").unwrap();
//! assert_eq!(global.node_count(), 2);
//! assert_eq!(global.edge_count(), 2);
//! assert_eq!(global.node("10.0.0.2").unwrap().display_label, "R2");
//! ```
//!
//! ## Structure
//! - [`resolver`] maps router identifiers to the hostname of the device owning them.
//! - [`color`] assigns colors to classification keys.
//! - [`graph`] and [`scope`] contain the topology of a single scope, and the index over all
//!   scopes.
//! - [`builder`] turns the records of one protocol into topologies ([`build_bgp`],
//!   [`build_ospf`], and [`build_all`] for both at once).
//! - [`summary`] and [`table`] compute peer statistics and the peer tables.
//! - The boundary data model is defined in a separate crate: [`routing_snapshot`].

#![deny(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod builder;
pub mod color;
pub mod config;
pub mod formatter;
pub mod graph;
pub mod resolver;
pub mod scope;
pub mod summary;
pub mod table;
#[cfg(test)]
mod test;

pub use builder::{
    build_all, build_bgp, build_ospf, GraphBuilder, ProtocolNotConfigured, ProtocolStatus,
    ProtocolTopology, SkipReason, SkippedRecord, Topology,
};
pub use color::{AttributeAssigner, ClassificationKey};
pub use config::{Config, ConfigError};
pub use graph::{EdgeAttributes, GraphEdge, GraphNode, NodeKind, TopologyGraph};
pub use resolver::IdentityResolver;
pub use routing_snapshot::{Protocol, RecordSet, SnapshotError};
pub use scope::ScopeIndex;
pub use summary::Summary;

use thiserror::Error;

/// Summarize the peer statistics and unhealthy adjacencies of a record set.
pub fn summarize(records: &RecordSet, config: &Config) -> Summary {
    Summary::new(
        &records.bgp_instances(),
        &records.ospf_processes(),
        &config.default_scope,
    )
}

/// Main error type
#[derive(Debug, Error)]
pub enum PeerscopeError {
    /// Cannot read the snapshots.
    #[error("{0}")]
    Snapshot(#[from] SnapshotError),
    /// Invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// Cannot serialize the result.
    #[error("Cannot serialize the result: {0}")]
    Json(#[from] serde_json::Error),
    /// Cannot write the result.
    #[error("Cannot write the result: {0}")]
    Io(#[from] std::io::Error),
}
