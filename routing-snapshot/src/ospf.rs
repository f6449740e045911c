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

//! OSPF process tables.

use serde::{Deserialize, Serialize};

use crate::util::{lenient_list, string_or_number};

/// One OSPF process of a device, with its areas and the neighbors found in each area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfProcessRecord {
    /// Process identifier. This is the scope of the process.
    #[serde(rename = "process", deserialize_with = "string_or_number")]
    pub process_id: String,
    /// Router ID of the process. This is the node identity of the process.
    #[serde(rename = "process router ID", alias = "process_routerid")]
    pub process_router_id: String,
    /// Hostname of the device running this process. Filled in from the device document if the
    /// process does not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Areas of the process. `None` if the record has no area list at all.
    #[serde(
        rename = "area_info",
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub areas: Option<Vec<OspfAreaRecord>>,
}

impl OspfProcessRecord {
    /// Create a new process record with an empty area list.
    pub fn new(process_id: impl Into<String>, process_router_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            process_router_id: process_router_id.into(),
            hostname: None,
            areas: Some(Vec::new()),
        }
    }

    /// Set the hostname of the owning device.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Append an area to the record.
    pub fn with_area(mut self, area: OspfAreaRecord) -> Self {
        self.areas.get_or_insert_with(Vec::new).push(area);
        self
    }

    /// Hostname of the owning device, if known.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// The area list, or `None` if the record is missing its area list.
    pub fn areas(&self) -> Option<&[OspfAreaRecord]> {
        self.areas.as_deref()
    }

    /// Iterate over all neighbors of all areas that have a neighbor list, together with the area
    /// they were found in.
    pub fn neighbors(&self) -> impl Iterator<Item = (&OspfAreaRecord, &OspfNeighborRecord)> {
        self.areas
            .iter()
            .flatten()
            .flat_map(|a| a.neighbors().into_iter().flatten().map(move |n| (a, n)))
    }
}

/// One area of an OSPF process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfAreaRecord {
    /// Area identifier, usually written as a dotted quad.
    #[serde(rename = "Area", deserialize_with = "string_or_number")]
    pub area_id: String,
    /// Neighbors of this area. `None` if the record has no neighbor list at all.
    #[serde(
        rename = "neighbor_info",
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub neighbors: Option<Vec<OspfNeighborRecord>>,
}

impl OspfAreaRecord {
    /// Create a new area record with an empty neighbor list.
    pub fn new(area_id: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            neighbors: Some(Vec::new()),
        }
    }

    /// Append a neighbor to the area.
    pub fn with_neighbor(mut self, neighbor: OspfNeighborRecord) -> Self {
        self.neighbors.get_or_insert_with(Vec::new).push(neighbor);
        self
    }

    /// The neighbor list, or `None` if the record is missing its neighbor list.
    pub fn neighbors(&self) -> Option<&[OspfNeighborRecord]> {
        self.neighbors.as_deref()
    }
}

/// One OSPF neighbor, as reported by the local process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OspfNeighborRecord {
    /// Router ID of the neighbor. This is the node identity of the neighbor.
    #[serde(rename = "Router ID", alias = "neighbor_routerid")]
    pub neighbor_router_id: String,
    /// Interface address of the neighbor.
    #[serde(rename = "Address", alias = "neighbor_address", default)]
    pub address: String,
    /// Adjacency state, e.g. `Full/DR` or `Full/`.
    #[serde(rename = "State", alias = "state", default)]
    pub state: String,
    /// Local interface towards the neighbor.
    #[serde(rename = "Interface", default)]
    pub interface_name: String,
}

impl OspfNeighborRecord {
    /// Create a new neighbor record in full state.
    pub fn new(neighbor_router_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            neighbor_router_id: neighbor_router_id.into(),
            address: address.into(),
            state: String::from("Full/"),
            interface_name: String::new(),
        }
    }

    /// Set the adjacency state.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Set the local interface.
    pub fn with_interface(mut self, interface_name: impl Into<String>) -> Self {
        self.interface_name = interface_name.into();
        self
    }

    /// Returns `true` if the adjacency is fully established (`Full`, in any capitalization and
    /// with any role suffix).
    pub fn is_full(&self) -> bool {
        self.state
            .trim()
            .get(..4)
            .map_or(false, |s| s.eq_ignore_ascii_case("full"))
    }
}
