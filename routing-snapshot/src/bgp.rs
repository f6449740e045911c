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

//! BGP instance tables.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{
    types::{AsId, DEFAULT_SCOPE},
    util::{lenient_list, optional_count},
};

/// One BGP instance of a device: its own identity and the peers it reports. A device running
/// several VPN instances reports one record per instance.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpInstanceRecord {
    /// Name of the VPN instance. `None` (or an empty name) refers to the global instance.
    #[serde(rename = "VPN_instance", default, skip_serializing_if = "Option::is_none")]
    pub vpn_instance: Option<String>,
    /// Router ID of the local BGP speaker. This is the node identity of the instance.
    pub local_router_id: String,
    /// AS number of the local BGP speaker.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub local_as_number: AsId,
    /// Number of peers, as declared by the device.
    #[serde(
        rename = "Total number of peers",
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_peers: Option<u32>,
    /// Number of peers in established state, as declared by the device.
    #[serde(
        rename = "Peers in established state",
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub established_peers: Option<u32>,
    /// Hostname of the device owning this instance. Filled in from the device document if the
    /// instance does not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Peers of this instance. `None` if the record has no peer list at all.
    #[serde(
        rename = "Peer",
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub peers: Option<Vec<BgpPeerRecord>>,
}

impl BgpInstanceRecord {
    /// Create a new instance record without any peers (but with an empty peer list).
    pub fn new(
        vpn_instance: Option<impl Into<String>>,
        local_router_id: impl Into<String>,
        local_as_number: impl Into<AsId>,
    ) -> Self {
        Self {
            vpn_instance: vpn_instance.map(Into::into),
            local_router_id: local_router_id.into(),
            local_as_number: local_as_number.into(),
            total_peers: None,
            established_peers: None,
            hostname: None,
            peers: Some(Vec::new()),
        }
    }

    /// Set the hostname of the owning device.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Append a peer to the record.
    pub fn with_peer(mut self, peer: BgpPeerRecord) -> Self {
        self.peers.get_or_insert_with(Vec::new).push(peer);
        self
    }

    /// The scope of this instance: its VPN instance name, or `"Global"` if it has none.
    pub fn scope_key(&self) -> &str {
        self.scope_key_or(DEFAULT_SCOPE)
    }

    /// The scope of this instance, falling back to `default` if the instance has no VPN instance
    /// name.
    pub fn scope_key_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.vpn_instance.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => default,
        }
    }

    /// Hostname of the owning device, if known.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// The peer list, or `None` if the record is missing its peer list.
    pub fn peers(&self) -> Option<&[BgpPeerRecord]> {
        self.peers.as_deref()
    }
}

/// One BGP peer of an instance, as reported by the local device.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpPeerRecord {
    /// Address of the peer. This is the remote end of the session, which is not necessarily the
    /// router ID of the peer.
    #[serde(rename = "peer_IP", alias = "neighbor_ip")]
    pub peer_address: String,
    /// AS number of the peer
    #[serde(rename = "peer_AS", alias = "remote_as")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub peer_as_number: AsId,
    /// How long the session has been in its current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_uptime: Option<String>,
    /// State of the session.
    #[serde(default)]
    pub peer_status: PeerStatus,
    /// Node name of the peer as written by the producer of the document. Kept for reference only;
    /// hostnames shown for peers always come from the router IDs of the devices.
    #[serde(rename = "peer_NodeName", default, skip_serializing_if = "Option::is_none")]
    pub reported_node_name: Option<String>,
    /// Hostname of the peer, resolved by matching the peer address against the router IDs of all
    /// devices. Never read from the document.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub resolved_peer_hostname: Option<String>,
}

impl BgpPeerRecord {
    /// Create a new peer record in established state.
    pub fn new(peer_address: impl Into<String>, peer_as_number: impl Into<AsId>) -> Self {
        Self {
            peer_address: peer_address.into(),
            peer_as_number: peer_as_number.into(),
            peer_uptime: None,
            peer_status: PeerStatus::Established,
            reported_node_name: None,
            resolved_peer_hostname: None,
        }
    }

    /// Set the session state.
    pub fn with_status(mut self, status: impl Into<PeerStatus>) -> Self {
        self.peer_status = status.into();
        self
    }

    /// Returns `true` if the session is established.
    pub fn is_established(&self) -> bool {
        self.peer_status.is_established()
    }
}

/// State of a BGP session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeerStatus {
    /// The session is up.
    Established,
    /// Any other state (`Idle`, `Active`, `Connect`, ...), kept verbatim.
    Other(String),
}

impl PeerStatus {
    /// Returns `true` if the session is established.
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Established)
    }

    /// The state as reported by the device.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Established => "Established",
            Self::Other(s) => s,
        }
    }
}

impl Default for PeerStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for PeerStatus {
    fn from(s: String) -> Self {
        if s.trim() == "Established" {
            Self::Established
        } else {
            Self::Other(s)
        }
    }
}

impl From<&str> for PeerStatus {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl From<PeerStatus> for String {
    fn from(s: PeerStatus) -> Self {
        match s {
            PeerStatus::Established => String::from("Established"),
            PeerStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for PeerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
