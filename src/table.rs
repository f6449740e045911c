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

//! Cross-reference rows of the BGP peer table and the OSPF neighbor table.
//!
//! The rows use the same [`IdentityResolver`] as the graph builder, so the remote hostname shown in
//! a table always agrees with the label of the corresponding node.

use routing_snapshot::{AsId, BgpInstanceRecord, OspfProcessRecord, ProtocolData};
use serde::Serialize;

use crate::resolver::IdentityResolver;

/// One row of the BGP peer table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpPeerRow {
    /// Hostname of the reporting device.
    #[serde(rename = "Host Info")]
    pub host: String,
    /// VPN instance of the session.
    #[serde(rename = "VPN Instance")]
    pub scope_key: String,
    /// Router ID of the reporting device.
    #[serde(rename = "Local RouterID")]
    pub local_router_id: String,
    /// AS number of the reporting device.
    #[serde(rename = "Local AS")]
    pub local_as: AsId,
    /// Address of the peer.
    #[serde(rename = "Peer IP")]
    pub peer_address: String,
    /// Hostname of the device owning the peer address.
    #[serde(rename = "Peer Node")]
    pub peer_hostname: String,
    /// AS number of the peer.
    #[serde(rename = "Peer AS")]
    pub peer_as: AsId,
    /// Uptime of the session.
    #[serde(rename = "Peer Uptime")]
    pub peer_uptime: String,
    /// State of the session.
    #[serde(rename = "Peer Status")]
    pub peer_status: String,
}

/// One row of the OSPF neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OspfNeighborRow {
    /// Hostname of the reporting device.
    #[serde(rename = "Host Info")]
    pub host: String,
    /// OSPF process.
    #[serde(rename = "Process")]
    pub process_id: String,
    /// Router ID of the process.
    #[serde(rename = "Process Router ID")]
    pub process_router_id: String,
    /// Area of the neighbor.
    #[serde(rename = "Area")]
    pub area_id: String,
    /// Router ID of the neighbor.
    #[serde(rename = "Neighbor Router ID")]
    pub neighbor_router_id: String,
    /// Hostname of the device owning the neighbor router ID.
    #[serde(rename = "Neighbor Name")]
    pub neighbor_hostname: String,
    /// Interface address of the neighbor.
    #[serde(rename = "Neighbor Address")]
    pub address: String,
    /// State of the adjacency.
    #[serde(rename = "Neighbor State")]
    pub state: String,
    /// Local interface.
    #[serde(rename = "Neighbor Interface")]
    pub interface_name: String,
}

/// Column headers of the BGP peer table.
pub const BGP_COLUMNS: [&str; 9] = [
    "Host Info",
    "VPN Instance",
    "Local RouterID",
    "Local AS",
    "Peer IP",
    "Peer Node",
    "Peer AS",
    "Peer Uptime",
    "Peer Status",
];

/// Column headers of the OSPF neighbor table.
pub const OSPF_COLUMNS: [&str; 9] = [
    "Host Info",
    "Process",
    "Process Router ID",
    "Area",
    "Neighbor Router ID",
    "Neighbor Name",
    "Neighbor Address",
    "Neighbor State",
    "Neighbor Interface",
];

impl BgpPeerRow {
    /// The cells of this row, in the order of [`BGP_COLUMNS`].
    pub fn cells(&self) -> [String; 9] {
        [
            self.host.clone(),
            self.scope_key.clone(),
            self.local_router_id.clone(),
            self.local_as.0.to_string(),
            self.peer_address.clone(),
            self.peer_hostname.clone(),
            self.peer_as.0.to_string(),
            self.peer_uptime.clone(),
            self.peer_status.clone(),
        ]
    }
}

impl OspfNeighborRow {
    /// The cells of this row, in the order of [`OSPF_COLUMNS`].
    pub fn cells(&self) -> [String; 9] {
        [
            self.host.clone(),
            self.process_id.clone(),
            self.process_router_id.clone(),
            self.area_id.clone(),
            self.neighbor_router_id.clone(),
            self.neighbor_hostname.clone(),
            self.address.clone(),
            self.state.clone(),
            self.interface_name.clone(),
        ]
    }
}

/// One row per BGP peer. The peer node is the hostname of the device owning the peer address,
/// exactly as shown in the graph; the node name written by the producer is ignored.
pub fn bgp_rows(
    data: &ProtocolData<BgpInstanceRecord>,
    resolver: &IdentityResolver,
    default_scope: &str,
) -> Vec<BgpPeerRow> {
    let mut rows = Vec::new();
    for instance in data.records() {
        let Some(peers) = instance.peers() else {
            log::debug!("[BGP] No peers for instance of {}", instance.local_router_id);
            continue;
        };
        for peer in peers {
            rows.push(BgpPeerRow {
                host: instance.hostname().unwrap_or_default().to_string(),
                scope_key: instance.scope_key_or(default_scope).to_string(),
                local_router_id: instance.local_router_id.clone(),
                local_as: instance.local_as_number,
                peer_address: peer.peer_address.clone(),
                peer_hostname: resolver.resolve_hostname(&peer.peer_address).to_string(),
                peer_as: peer.peer_as_number,
                peer_uptime: peer.peer_uptime.clone().unwrap_or_default(),
                peer_status: peer.peer_status.to_string(),
            });
        }
    }
    rows
}

/// One row per OSPF neighbor.
pub fn ospf_rows(
    data: &ProtocolData<OspfProcessRecord>,
    resolver: &IdentityResolver,
) -> Vec<OspfNeighborRow> {
    data.records()
        .iter()
        .flat_map(|process| {
            process.neighbors().map(move |(area, neighbor)| OspfNeighborRow {
                host: process.hostname().unwrap_or_default().to_string(),
                process_id: process.process_id.clone(),
                process_router_id: process.process_router_id.clone(),
                area_id: area.area_id.clone(),
                neighbor_router_id: neighbor.neighbor_router_id.clone(),
                neighbor_hostname: resolver
                    .resolve_hostname(&neighbor.neighbor_router_id)
                    .to_string(),
                address: neighbor.address.clone(),
                state: neighbor.state.clone(),
                interface_name: neighbor.interface_name.clone(),
            })
        })
        .collect()
}
