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

//! Resolution of router identifiers to the hostname of the device that owns them.
//!
//! Peers and neighbors are only known by an identifier (a BGP peer address, or an OSPF neighbor
//! router ID). If the device owning that identifier is part of the same record set, its hostname
//! is known. The [`IdentityResolver`] indexes all devices of one protocol by their own router ID
//! once, and answers every lookup in constant time.

use std::collections::HashMap;

use routing_snapshot::{BgpInstanceRecord, OspfProcessRecord, ProtocolData};

/// Hostname of identifiers that no device in the record set claims.
pub const UNRESOLVED: &str = "na";

/// A record that carries the router identity of a device within one protocol.
pub trait RouterIdentity {
    /// The router ID the device reports for itself.
    fn router_id(&self) -> &str;

    /// The hostname of the device, if known.
    fn hostname(&self) -> Option<&str>;
}

impl RouterIdentity for BgpInstanceRecord {
    fn router_id(&self) -> &str {
        &self.local_router_id
    }

    fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

impl RouterIdentity for OspfProcessRecord {
    fn router_id(&self) -> &str {
        &self.process_router_id
    }

    fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

/// Reverse index from a router ID to the hostname of the device that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    hostnames: HashMap<String, String>,
    unresolved: String,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            hostnames: HashMap::new(),
            unresolved: UNRESOLVED.to_string(),
        }
    }
}

impl IdentityResolver {
    /// Index all records by their router ID. If two records claim the same router ID with
    /// different hostnames, the last one wins. Records without a hostname are ignored.
    pub fn new<'a, R>(records: impl IntoIterator<Item = &'a R>) -> Self
    where
        R: RouterIdentity + 'a,
    {
        let mut hostnames: HashMap<String, String> = HashMap::new();
        for record in records {
            let Some(hostname) = record.hostname() else {
                log::debug!("Router {} has no hostname", record.router_id());
                continue;
            };
            if let Some(old) = hostnames.insert(record.router_id().to_string(), hostname.to_string())
            {
                if old != hostname {
                    log::debug!(
                        "Router ID {} is claimed by both {} and {}. Using {}.",
                        record.router_id(),
                        old,
                        hostname,
                        hostname
                    );
                }
            }
        }
        Self {
            hostnames,
            ..Default::default()
        }
    }

    /// Build the resolver for BGP. Devices are keyed by their local router ID.
    pub fn for_bgp(data: &ProtocolData<BgpInstanceRecord>) -> Self {
        Self::new(data.records())
    }

    /// Build the resolver for OSPF. Devices are keyed by their process router ID.
    pub fn for_ospf(data: &ProtocolData<OspfProcessRecord>) -> Self {
        Self::new(data.records())
    }

    /// Use a different hostname for identifiers that cannot be resolved (default: `"na"`).
    pub fn with_unresolved(mut self, unresolved: impl Into<String>) -> Self {
        self.unresolved = unresolved.into();
        self
    }

    /// The hostname of the device whose own router ID equals `candidate_id`, or `None` if no
    /// device claims it.
    pub fn get(&self, candidate_id: &str) -> Option<&str> {
        self.hostnames.get(candidate_id).map(String::as_str)
    }

    /// The hostname of the device whose own router ID equals `candidate_id`, or `"na"` (see
    /// [`IdentityResolver::with_unresolved`]) if no device claims it.
    pub fn resolve_hostname(&self, candidate_id: &str) -> &str {
        self.get(candidate_id).unwrap_or(&self.unresolved)
    }

    /// Number of distinct router IDs known to the resolver.
    pub fn len(&self) -> usize {
        self.hostnames.len()
    }

    /// Returns `true` if no router ID is known.
    pub fn is_empty(&self) -> bool {
        self.hostnames.is_empty()
    }

    /// Fill in the resolved peer hostname of every BGP peer.
    pub fn annotate_bgp_peers(&self, data: &mut ProtocolData<BgpInstanceRecord>) {
        for peer in data
            .records_mut()
            .iter_mut()
            .filter_map(|r| r.peers.as_mut())
            .flatten()
        {
            peer.resolved_peer_hostname = Some(self.resolve_hostname(&peer.peer_address).to_string());
        }
    }
}
