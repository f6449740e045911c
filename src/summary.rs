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

//! Peer statistics and unhealthy adjacencies of a record set.

use std::fmt::Display;

use routing_snapshot::{BgpInstanceRecord, OspfProcessRecord, Protocol, ProtocolData};
use serde::Serialize;

/// Statistics over all BGP instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BgpStatistics {
    /// Number of BGP instances (devices times VPN instances).
    pub instances: usize,
    /// Number of peers over all instances.
    pub peers: usize,
    /// Number of peers in the `Established` state.
    pub established: usize,
    /// Instances whose declared peer counts disagree with their peer list.
    pub mismatches: Vec<DeclaredCountMismatch>,
}

/// An instance declares a different number of peers than it lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredCountMismatch {
    /// Hostname of the device.
    pub hostname: Option<String>,
    /// Scope of the instance.
    #[serde(rename = "scope")]
    pub scope_key: String,
    /// Declared total number of peers, if any.
    pub declared_total: Option<u32>,
    /// Number of peers in the peer list.
    pub listed_total: usize,
    /// Declared number of established peers, if any.
    pub declared_established: Option<u32>,
    /// Number of established peers in the peer list.
    pub listed_established: usize,
}

impl BgpStatistics {
    /// Compute the statistics. Instances without a peer list count as instances without peers.
    pub fn new(data: &ProtocolData<BgpInstanceRecord>, default_scope: &str) -> Self {
        let mut stats = Self::default();
        for instance in data.records() {
            let peers = instance.peers().unwrap_or_default();
            let established = peers.iter().filter(|p| p.is_established()).count();
            stats.instances += 1;
            stats.peers += peers.len();
            stats.established += established;

            let total_differs = instance
                .total_peers
                .map_or(false, |n| n as usize != peers.len());
            let established_differs = instance
                .established_peers
                .map_or(false, |n| n as usize != established);
            if total_differs || established_differs {
                log::debug!(
                    "[BGP] {} declares {:?}/{:?} peers, but lists {}/{}",
                    instance.local_router_id,
                    instance.established_peers,
                    instance.total_peers,
                    established,
                    peers.len()
                );
                stats.mismatches.push(DeclaredCountMismatch {
                    hostname: instance.hostname.clone(),
                    scope_key: instance.scope_key_or(default_scope).to_string(),
                    declared_total: instance.total_peers,
                    listed_total: peers.len(),
                    declared_established: instance.established_peers,
                    listed_established: established,
                });
            }
        }
        stats
    }
}

/// Statistics over all OSPF processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OspfStatistics {
    /// Number of OSPF processes.
    pub processes: usize,
    /// Number of neighbors over all processes and areas.
    pub neighbors: usize,
    /// Number of neighbors in a `Full` state.
    pub full: usize,
}

impl OspfStatistics {
    /// Compute the statistics.
    pub fn new(data: &ProtocolData<OspfProcessRecord>) -> Self {
        data.records()
            .iter()
            .fold(Self::default(), |mut stats, process| {
                stats.processes += 1;
                for (_, neighbor) in process.neighbors() {
                    stats.neighbors += 1;
                    if neighbor.is_full() {
                        stats.full += 1;
                    }
                }
                stats
            })
    }
}

/// A BGP session that is not established, or an OSPF adjacency that is not full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnhealthyAdjacency {
    /// Protocol of the adjacency.
    pub protocol: Protocol,
    /// Hostname of the reporting device.
    pub hostname: Option<String>,
    /// VPN instance or OSPF process.
    #[serde(rename = "scope")]
    pub scope_key: String,
    /// Router ID of the reporting device.
    pub local_id: String,
    /// Peer address or neighbor router ID.
    pub remote_id: String,
    /// The reported state.
    pub state: String,
}

impl Display for UnhealthyAdjacency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}) -> {} in {}: {}",
            self.protocol,
            self.hostname.as_deref().unwrap_or("?"),
            self.local_id,
            self.remote_id,
            self.scope_key,
            if self.state.is_empty() { "-" } else { &self.state }
        )
    }
}

/// All BGP peers that are not in the `Established` state.
pub fn unhealthy_bgp(
    data: &ProtocolData<BgpInstanceRecord>,
    default_scope: &str,
) -> Vec<UnhealthyAdjacency> {
    data.records()
        .iter()
        .flat_map(|instance| {
            instance
                .peers()
                .unwrap_or_default()
                .iter()
                .filter(|p| !p.is_established())
                .map(move |p| UnhealthyAdjacency {
                    protocol: Protocol::Bgp,
                    hostname: instance.hostname.clone(),
                    scope_key: instance.scope_key_or(default_scope).to_string(),
                    local_id: instance.local_router_id.clone(),
                    remote_id: p.peer_address.clone(),
                    state: p.peer_status.to_string(),
                })
        })
        .collect()
}

/// All OSPF neighbors that are not in a `Full` state.
pub fn unhealthy_ospf(data: &ProtocolData<OspfProcessRecord>) -> Vec<UnhealthyAdjacency> {
    data.records()
        .iter()
        .flat_map(|process| {
            process
                .neighbors()
                .filter(|(_, n)| !n.is_full())
                .map(move |(_, n)| UnhealthyAdjacency {
                    protocol: Protocol::Ospf,
                    hostname: process.hostname.clone(),
                    scope_key: process.process_id.clone(),
                    local_id: process.process_router_id.clone(),
                    remote_id: n.neighbor_router_id.clone(),
                    state: n.state.clone(),
                })
        })
        .collect()
}

/// Statistics and unhealthy adjacencies of both protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// BGP statistics.
    pub bgp: BgpStatistics,
    /// OSPF statistics.
    pub ospf: OspfStatistics,
    /// BGP sessions that are not established, followed by OSPF adjacencies that are not full.
    pub unhealthy: Vec<UnhealthyAdjacency>,
}

impl Summary {
    /// Summarize both protocols.
    pub fn new(
        bgp: &ProtocolData<BgpInstanceRecord>,
        ospf: &ProtocolData<OspfProcessRecord>,
        default_scope: &str,
    ) -> Self {
        let mut unhealthy = unhealthy_bgp(bgp, default_scope);
        unhealthy.extend(unhealthy_ospf(ospf));
        Self {
            bgp: BgpStatistics::new(bgp, default_scope),
            ospf: OspfStatistics::new(ospf),
            unhealthy,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use routing_snapshot::{AsId, BgpPeerRecord, OspfAreaRecord, OspfNeighborRecord};
    use test_log::test;

    #[test]
    fn bgp_statistics() {
        let mut counted = BgpInstanceRecord::new(Some("vpn-a"), "10.0.0.1", AsId(100))
            .with_hostname("R1")
            .with_peer(BgpPeerRecord::new("10.0.0.2", AsId(200)))
            .with_peer(BgpPeerRecord::new("10.0.0.3", AsId(300)).with_status("Active"));
        counted.total_peers = Some(2);
        counted.established_peers = Some(2);
        let data = ProtocolData::from_records(vec![
            counted,
            BgpInstanceRecord {
                peers: None,
                ..BgpInstanceRecord::new(None::<String>, "10.0.0.2", AsId(200))
            },
        ]);

        let stats = BgpStatistics::new(&data, "Global");
        assert_eq!(stats.instances, 2);
        assert_eq!(stats.peers, 2);
        assert_eq!(stats.established, 1);
        assert_eq!(
            stats.mismatches,
            vec![DeclaredCountMismatch {
                hostname: Some("R1".to_string()),
                scope_key: "vpn-a".to_string(),
                declared_total: Some(2),
                listed_total: 2,
                declared_established: Some(2),
                listed_established: 1,
            }]
        );

        let unhealthy = unhealthy_bgp(&data, "Global");
        assert_eq!(unhealthy.len(), 1);
        assert_eq!(unhealthy[0].remote_id, "10.0.0.3");
        assert_eq!(
            unhealthy[0].to_string(),
            "[BGP] R1 (10.0.0.1) -> 10.0.0.3 in vpn-a: Active"
        );
    }

    #[test]
    fn ospf_statistics() {
        let data = ProtocolData::from_records(vec![OspfProcessRecord::new("1", "1.1.1.1")
            .with_area(
                OspfAreaRecord::new("0.0.0.0")
                    .with_neighbor(OspfNeighborRecord::new("2.2.2.2", "10.0.0.2"))
                    .with_neighbor(
                        OspfNeighborRecord::new("3.3.3.3", "10.0.0.3").with_state("Init"),
                    ),
            )]);
        assert_eq!(
            OspfStatistics::new(&data),
            OspfStatistics {
                processes: 1,
                neighbors: 2,
                full: 1
            }
        );
        let summary = Summary::new(&ProtocolData::NotConfigured, &data, "Global");
        assert_eq!(summary.bgp, BgpStatistics::default());
        assert_eq!(summary.unhealthy.len(), 1);
        assert_eq!(summary.unhealthy[0].state, "Init");
    }
}
