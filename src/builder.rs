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

//! Construction of the per-scope topologies from the protocol records.
//!
//! Both protocols follow the same scheme: every instance (or process) contributes its own router
//! as a local node, and every peer (or neighbor) as a peer node with a directed edge from the
//! local node towards it. Nodes are deduplicated by their id within each scope, and colors are
//! taken from an [`AttributeAssigner`] in the order the classification keys are first seen.

use std::fmt::Display;

use routing_snapshot::{
    BgpInstanceRecord, OspfProcessRecord, Protocol, ProtocolData, RecordSet, DEFAULT_SCOPE,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    color::{AttributeAssigner, ClassificationKey},
    config::{Config, ConfigError},
    graph::{EdgeAttributes, NodeKind},
    resolver::IdentityResolver,
    scope::ScopeIndex,
};

/// Whether the records of a protocol could be turned into a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolStatus {
    /// At least one device reported records for the protocol.
    Configured,
    /// No device runs the protocol.
    NotConfigured,
    /// The protocol section could not be interpreted.
    Malformed(String),
}

impl ProtocolStatus {
    fn of<T>(data: &ProtocolData<T>) -> Self {
        match data {
            ProtocolData::Configured(_) => Self::Configured,
            ProtocolData::NotConfigured => Self::NotConfigured,
            ProtocolData::Malformed(reason) => Self::Malformed(reason.clone()),
        }
    }

    /// Short human-readable form of the status.
    pub fn describe(&self) -> String {
        match self {
            ProtocolStatus::Configured => "configured".to_string(),
            ProtocolStatus::NotConfigured => "not configured".to_string(),
            ProtocolStatus::Malformed(reason) => format!("malformed: {reason}"),
        }
    }
}

/// A protocol has no topology to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} is not configured{}", .protocol, .reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
pub struct ProtocolNotConfigured {
    /// The protocol in question.
    pub protocol: Protocol,
    /// Why the protocol section was rejected, if it was present but malformed.
    pub reason: Option<String>,
}

/// Why a record did not contribute to the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// A BGP instance without a peer list.
    MissingPeerList,
    /// An OSPF process without an area list.
    MissingAreaList,
    /// An OSPF area without a neighbor list.
    MissingNeighborList {
        /// The area in question.
        area_id: String,
    },
    /// The whole protocol table of a device could not be interpreted.
    MalformedTable {
        /// Why the table was rejected.
        reason: String,
    },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingPeerList => f.write_str("no peer list"),
            SkipReason::MissingAreaList => f.write_str("no area list"),
            SkipReason::MissingNeighborList { area_id } => {
                write!(f, "no neighbor list in area {area_id}")
            }
            SkipReason::MalformedTable { reason } => write!(f, "malformed table: {reason}"),
        }
    }
}

/// A record that was left out of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Protocol of the record.
    pub protocol: Protocol,
    /// Scope the record would have contributed to. `None` for a malformed table.
    #[serde(rename = "scope")]
    pub scope_key: Option<String>,
    /// Router ID of the reporting device. `None` for a malformed table.
    pub router_id: Option<String>,
    /// Hostname of the reporting device.
    pub hostname: Option<String>,
    /// What was wrong with the record.
    pub reason: SkipReason,
}

impl Display for SkippedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.protocol,
            self.hostname.as_deref().unwrap_or("?")
        )?;
        if let Some(router_id) = &self.router_id {
            write!(f, " ({router_id})")?;
        }
        if let Some(scope_key) = &self.scope_key {
            write!(f, " in {scope_key}")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// One entry of the color legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    /// AS number or router ID.
    pub key: ClassificationKey,
    /// The color assigned to the key.
    pub color: String,
}

/// The result of building the topologies of one protocol.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolTopology {
    /// The protocol.
    pub protocol: Protocol,
    /// Whether the protocol was configured.
    pub status: ProtocolStatus,
    /// All topologies, keyed by scope. Empty unless the protocol is configured.
    #[serde(rename = "topology")]
    pub index: ScopeIndex,
    /// Colors of all classification keys, in the order they were assigned.
    pub legend: Vec<LegendEntry>,
    /// Records that were left out.
    pub skipped: Vec<SkippedRecord>,
}

impl ProtocolTopology {
    fn empty(protocol: Protocol, status: ProtocolStatus) -> Self {
        Self {
            protocol,
            status,
            index: ScopeIndex::new(),
            legend: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Returns `true` if the protocol was configured.
    pub fn is_configured(&self) -> bool {
        self.status == ProtocolStatus::Configured
    }

    /// The topologies, or the reason why there are none.
    pub fn check(&self) -> Result<&ScopeIndex, ProtocolNotConfigured> {
        match &self.status {
            ProtocolStatus::Configured => Ok(&self.index),
            ProtocolStatus::NotConfigured => Err(ProtocolNotConfigured {
                protocol: self.protocol,
                reason: None,
            }),
            ProtocolStatus::Malformed(reason) => Err(ProtocolNotConfigured {
                protocol: self.protocol,
                reason: Some(reason.clone()),
            }),
        }
    }
}

/// The topologies of both protocols.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    /// BGP sessions, scoped by VPN instance.
    pub bgp: ProtocolTopology,
    /// OSPF adjacencies, scoped by process.
    pub ospf: ProtocolTopology,
}

/// Builds the topologies of a protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphBuilder {
    default_scope: String,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            default_scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl GraphBuilder {
    /// Create a builder that places BGP instances without VPN instance into `"Global"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_default_scope(&config.default_scope)
    }

    /// Use a different scope for BGP instances without VPN instance.
    pub fn with_default_scope(mut self, default_scope: impl Into<String>) -> Self {
        self.default_scope = default_scope.into();
        self
    }

    /// Build the BGP topologies, one per VPN instance. Nodes are keyed by the router ID of the
    /// local router, and by the peer address of each peer. Both are colored by their AS number,
    /// and peers are labeled with the hostname of the device owning the peer address.
    pub fn build_bgp(
        &self,
        data: &ProtocolData<BgpInstanceRecord>,
        resolver: &IdentityResolver,
        colors: &mut AttributeAssigner,
    ) -> ProtocolTopology {
        let ProtocolData::Configured(records) = data else {
            log::debug!("[BGP] {}", ProtocolStatus::of(data).describe());
            return ProtocolTopology::empty(Protocol::Bgp, ProtocolStatus::of(data));
        };

        let mut index = ScopeIndex::new();
        let mut skipped = Vec::new();

        for instance in records {
            let scope = instance.scope_key_or(&self.default_scope);
            let Some(peers) = instance.peers() else {
                log::warn!(
                    "[BGP] Skipping instance {} of {}: no peer list",
                    scope,
                    instance.local_router_id
                );
                skipped.push(SkippedRecord {
                    protocol: Protocol::Bgp,
                    scope_key: Some(scope.to_string()),
                    router_id: Some(instance.local_router_id.clone()),
                    hostname: instance.hostname.clone(),
                    reason: SkipReason::MissingPeerList,
                });
                continue;
            };

            let graph = index.graph_mut(scope);
            let local_as = instance.local_as_number;
            let color = colors.color_for(local_as).to_string();
            let label = instance
                .hostname()
                .unwrap_or_else(|| resolver.resolve_hostname(&instance.local_router_id));
            let (local, _) = graph.insert_node(
                &instance.local_router_id,
                NodeKind::Local,
                local_as.into(),
                color,
                label,
            );

            for peer in peers {
                let color = colors.color_for(peer.peer_as_number).to_string();
                let (remote, _) = graph.insert_node(
                    &peer.peer_address,
                    NodeKind::Peer,
                    peer.peer_as_number.into(),
                    color,
                    resolver.resolve_hostname(&peer.peer_address),
                );
                graph.connect(
                    local,
                    remote,
                    EdgeAttributes::Bgp {
                        local_as,
                        peer_as: peer.peer_as_number,
                        status: peer.peer_status.clone(),
                    },
                );
            }
        }

        log::debug!(
            "[BGP] Built {} scopes ({} records skipped)",
            index.len(),
            skipped.len()
        );
        ProtocolTopology {
            protocol: Protocol::Bgp,
            status: ProtocolStatus::Configured,
            index,
            legend: legend(colors),
            skipped,
        }
    }

    /// Build the OSPF topologies, one per process. Nodes are keyed and colored by their router
    /// ID, and neighbors are labeled with the hostname of the device owning their router ID.
    pub fn build_ospf(
        &self,
        data: &ProtocolData<OspfProcessRecord>,
        resolver: &IdentityResolver,
        colors: &mut AttributeAssigner,
    ) -> ProtocolTopology {
        let ProtocolData::Configured(records) = data else {
            log::debug!("[OSPF] {}", ProtocolStatus::of(data).describe());
            return ProtocolTopology::empty(Protocol::Ospf, ProtocolStatus::of(data));
        };

        let mut index = ScopeIndex::new();
        let mut skipped = Vec::new();

        for process in records {
            let scope = process.process_id.as_str();
            let skip = |reason: SkipReason| SkippedRecord {
                protocol: Protocol::Ospf,
                scope_key: Some(scope.to_string()),
                router_id: Some(process.process_router_id.clone()),
                hostname: process.hostname.clone(),
                reason,
            };
            let Some(areas) = process.areas() else {
                log::warn!(
                    "[OSPF] Skipping process {} of {}: no area list",
                    scope,
                    process.process_router_id
                );
                skipped.push(skip(SkipReason::MissingAreaList));
                continue;
            };

            let graph = index.graph_mut(scope);
            let router_id = &process.process_router_id;
            let key = ClassificationKey::RouterId(router_id.clone());
            let color = colors.color_for(key.clone()).to_string();
            let label = process
                .hostname()
                .unwrap_or_else(|| resolver.resolve_hostname(router_id));
            let (local, _) = graph.insert_node(router_id, NodeKind::Local, key, color, label);

            for area in areas {
                let Some(neighbors) = area.neighbors() else {
                    log::warn!(
                        "[OSPF] Skipping area {} of process {} of {}: no neighbor list",
                        area.area_id,
                        scope,
                        router_id
                    );
                    skipped.push(skip(SkipReason::MissingNeighborList {
                        area_id: area.area_id.clone(),
                    }));
                    continue;
                };
                for neighbor in neighbors {
                    let id = &neighbor.neighbor_router_id;
                    let key = ClassificationKey::RouterId(id.clone());
                    let color = colors.color_for(key.clone()).to_string();
                    let (remote, _) = graph.insert_node(
                        id,
                        NodeKind::Peer,
                        key,
                        color,
                        resolver.resolve_hostname(id),
                    );
                    graph.connect(
                        local,
                        remote,
                        EdgeAttributes::Ospf {
                            process_id: process.process_id.clone(),
                            area_id: area.area_id.clone(),
                            address: neighbor.address.clone(),
                            state: neighbor.state.clone(),
                            interface: neighbor.interface_name.clone(),
                        },
                    );
                }
            }
        }

        log::debug!(
            "[OSPF] Built {} scopes ({} records skipped)",
            index.len(),
            skipped.len()
        );
        ProtocolTopology {
            protocol: Protocol::Ospf,
            status: ProtocolStatus::Configured,
            index,
            legend: legend(colors),
            skipped,
        }
    }
}

/// Report the devices whose whole table of `protocol` was rejected at ingestion. Their records are
/// missing from the merged protocol data, so the graph builder never sees them.
fn malformed_tables(records: &RecordSet, protocol: Protocol) -> Vec<SkippedRecord> {
    records
        .malformed_tables(protocol)
        .into_iter()
        .map(|t| {
            log::warn!(
                "[{protocol}] Skipping the table of {} ({}): {}",
                t.hostname.as_deref().unwrap_or("?"),
                t.host_ip.as_deref().unwrap_or("?"),
                t.reason
            );
            SkippedRecord {
                protocol,
                scope_key: None,
                router_id: None,
                hostname: t.hostname,
                reason: SkipReason::MalformedTable { reason: t.reason },
            }
        })
        .collect()
}

fn legend(colors: &AttributeAssigner) -> Vec<LegendEntry> {
    colors
        .legend()
        .into_iter()
        .map(|(key, color)| LegendEntry { key, color })
        .collect()
}

/// Build the BGP topologies of a record set, with a fresh color assigner.
pub fn build_bgp(records: &RecordSet, config: &Config) -> Result<ProtocolTopology, ConfigError> {
    let data = records.bgp_instances();
    let resolver = IdentityResolver::for_bgp(&data).with_unresolved(&config.unresolved_hostname);
    let mut colors = config.assigner()?;
    let mut topo = GraphBuilder::from_config(config).build_bgp(&data, &resolver, &mut colors);
    topo.skipped.extend(malformed_tables(records, Protocol::Bgp));
    Ok(topo)
}

/// Build the OSPF topologies of a record set, with a fresh color assigner.
pub fn build_ospf(records: &RecordSet, config: &Config) -> Result<ProtocolTopology, ConfigError> {
    let data = records.ospf_processes();
    let resolver = IdentityResolver::for_ospf(&data).with_unresolved(&config.unresolved_hostname);
    let mut colors = config.assigner()?;
    let mut topo = GraphBuilder::from_config(config).build_ospf(&data, &resolver, &mut colors);
    topo.skipped.extend(malformed_tables(records, Protocol::Ospf));
    Ok(topo)
}

/// Build the topologies of both protocols in parallel. The two builds share nothing but the
/// (read-only) record set and configuration.
pub fn build_all(records: &RecordSet, config: &Config) -> Result<Topology, ConfigError> {
    let (bgp, ospf) = rayon::join(
        || build_bgp(records, config),
        || build_ospf(records, config),
    );
    Ok(Topology {
        bgp: bgp?,
        ospf: ospf?,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use routing_snapshot::{AsId, BgpPeerRecord, OspfAreaRecord, OspfNeighborRecord};
    use test_log::test;

    fn bgp_data() -> ProtocolData<BgpInstanceRecord> {
        ProtocolData::from_records(vec![
            BgpInstanceRecord::new(None::<String>, "10.0.0.1", AsId(100))
                .with_hostname("R1")
                .with_peer(BgpPeerRecord::new("10.0.0.2", AsId(200)))
                .with_peer(BgpPeerRecord::new("10.0.0.9", AsId(300)).with_status("Idle")),
            BgpInstanceRecord::new(None::<String>, "10.0.0.2", AsId(200))
                .with_hostname("R2")
                .with_peer(BgpPeerRecord::new("10.0.0.1", AsId(100))),
        ])
    }

    #[test]
    fn bgp_topology() {
        let data = bgp_data();
        let resolver = IdentityResolver::for_bgp(&data);
        let mut colors = AttributeAssigner::new();
        let topo = GraphBuilder::new().build_bgp(&data, &resolver, &mut colors);

        assert!(topo.is_configured());
        let index = topo.check().unwrap();
        assert_eq!(index.scopes().collect_vec(), vec!["Global"]);
        let g = index.get("Global").unwrap();
        assert_eq!(
            g.nodes()
                .map(|n| (n.id.as_str(), n.kind, n.display_label.as_str()))
                .collect_vec(),
            vec![
                ("10.0.0.1", NodeKind::Local, "R1"),
                ("10.0.0.2", NodeKind::Peer, "R2"),
                ("10.0.0.9", NodeKind::Peer, "na"),
            ]
        );
        assert_eq!(g.edge_count(), 3);
        assert_eq!(
            topo.legend.iter().map(|e| e.color.as_str()).collect_vec(),
            vec!["#1f77b4", "#ff7f0e", "#2ca02c"]
        );
        assert_eq!(g.node("10.0.0.9").unwrap().color, "#2ca02c");
    }

    #[test]
    fn bgp_missing_peer_list() {
        let mut data = bgp_data();
        data.records_mut()[1].peers = None;
        let resolver = IdentityResolver::for_bgp(&data);
        let topo = GraphBuilder::new().build_bgp(&data, &resolver, &mut AttributeAssigner::new());
        assert_eq!(topo.skipped.len(), 1);
        assert_eq!(topo.skipped[0].reason, SkipReason::MissingPeerList);
        assert_eq!(topo.skipped[0].hostname.as_deref(), Some("R2"));
        // R2 still shows up as the peer of R1
        assert_eq!(topo.index.get("Global").unwrap().node_count(), 3);
        assert_eq!(topo.index.get("Global").unwrap().edge_count(), 2);
    }

    #[test]
    fn not_configured() {
        let topo = GraphBuilder::new().build_bgp(
            &ProtocolData::NotConfigured,
            &IdentityResolver::default(),
            &mut AttributeAssigner::new(),
        );
        assert_eq!(topo.status, ProtocolStatus::NotConfigured);
        assert!(topo.index.is_empty());
        assert_eq!(
            topo.check().unwrap_err().to_string(),
            "BGP is not configured"
        );

        let topo = GraphBuilder::new().build_ospf(
            &ProtocolData::Malformed("expected a list".to_string()),
            &IdentityResolver::default(),
            &mut AttributeAssigner::new(),
        );
        assert_eq!(
            topo.check().unwrap_err().to_string(),
            "OSPF is not configured (expected a list)"
        );
    }

    #[test]
    fn ospf_topology() {
        let data = ProtocolData::from_records(vec![
            OspfProcessRecord::new("1", "1.1.1.1")
                .with_hostname("core")
                .with_area(
                    OspfAreaRecord::new("0.0.0.0")
                        .with_neighbor(OspfNeighborRecord::new("2.2.2.2", "10.1.0.2"))
                        .with_neighbor(OspfNeighborRecord::new("3.3.3.3", "10.1.0.3")),
                )
                .with_area(OspfAreaRecord {
                    area_id: "0.0.0.1".to_string(),
                    neighbors: None,
                }),
            OspfProcessRecord::new("2", "2.2.2.2").with_hostname("edge"),
            OspfProcessRecord {
                areas: None,
                ..OspfProcessRecord::new("3", "4.4.4.4").with_hostname("lost")
            },
        ]);
        let resolver = IdentityResolver::for_ospf(&data);
        let topo = GraphBuilder::new().build_ospf(&data, &resolver, &mut AttributeAssigner::new());

        assert_eq!(topo.index.scopes().collect_vec(), vec!["1", "2"]);
        let g = topo.index.get("1").unwrap();
        assert_eq!(g.node("2.2.2.2").unwrap().display_label, "edge");
        assert_eq!(g.node("3.3.3.3").unwrap().display_label, "na");
        assert_eq!(
            g.node("3.3.3.3").unwrap().classification_key,
            ClassificationKey::RouterId("3.3.3.3".to_string())
        );
        assert_eq!(g.edge_count(), 2);
        assert_eq!(topo.index.get("2").unwrap().node_count(), 1);
        assert_eq!(
            topo.skipped.iter().map(|s| s.reason.clone()).collect_vec(),
            vec![
                SkipReason::MissingNeighborList {
                    area_id: "0.0.0.1".to_string()
                },
                SkipReason::MissingAreaList,
            ]
        );
    }
}
