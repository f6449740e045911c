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

#![deny(missing_docs, missing_debug_implementations)]

//! # Routing Snapshot
//!
//! This library contains the document model of per-device routing snapshots, as they are produced
//! by the collector: one JSON document per network node, containing its BGP instance table and
//! its OSPF process table. It is used by `peerscope` to build topology graphs, but it can be used
//! by any consumer that needs the same view of the data.
//!
//! The field names of the documents (including the ones with embedded spaces, such as
//! `"Total number of peers"`) are a contract with the producer, and are kept verbatim using serde
//! renames.
//!
//! Each protocol field of a document is decided exactly once into a [`ProtocolData`]: either
//! [`ProtocolData::Configured`] with the parsed records, [`ProtocolData::NotConfigured`] if the
//! device does not run the protocol, or [`ProtocolData::Malformed`] if the field has an unexpected
//! shape. Consumers never need to inspect the raw JSON again.
//!
//! ```
//! use routing_snapshot::{RecordSet, ProtocolData};
//!
//! let set = RecordSet::from_json_str(r#"{
//!     "hostname": "R1",
//!     "host_ip": "192.168.0.1",
//!     "BGP": [{
//!         "VPN_instance": "",
//!         "local_router_id": "10.0.0.1",
//!         "local_as_number": "100",
//!         "Total number of peers": 1,
//!         "Peers in established state": 1,
//!         "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_uptime": "01:02:03", "peer_status": "Established"}]
//!     }],
//!     "OSPF": "OSPF is not configured."
//! }"#).unwrap();
//!
//! let bgp = set.bgp_instances();
//! assert_eq!(bgp.records().len(), 1);
//! assert_eq!(bgp.records()[0].scope_key(), "Global");
//! assert!(set.ospf_processes().is_not_configured());
//! ```

mod bgp;
mod device;
mod ospf;
mod protocol;
mod types;
mod util;

pub use bgp::{BgpInstanceRecord, BgpPeerRecord, PeerStatus};
pub use device::{DeviceSnapshot, MalformedTable, RecordSet, SnapshotError};
pub use ospf::{OspfAreaRecord, OspfNeighborRecord, OspfProcessRecord};
pub use protocol::ProtocolData;
pub use types::{AsId, Protocol, DEFAULT_SCOPE};
