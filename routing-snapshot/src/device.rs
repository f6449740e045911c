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

//! Device documents and record sets.

use std::{fs::File, io::BufReader, path::Path};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    bgp::BgpInstanceRecord, ospf::OspfProcessRecord, protocol::ProtocolData, types::Protocol,
    util::json_kind,
};

/// The routing snapshot of a single network node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Hostname of the device, as extracted from its prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Management address of the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    /// BGP instance table.
    #[serde(rename = "BGP", default)]
    pub bgp: ProtocolData<BgpInstanceRecord>,
    /// OSPF process table.
    #[serde(rename = "OSPF", default)]
    pub ospf: ProtocolData<OspfProcessRecord>,
}

impl DeviceSnapshot {
    /// Create an empty snapshot of a device that runs neither protocol.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            ..Default::default()
        }
    }

    /// Set the management address.
    pub fn with_host_ip(mut self, host_ip: impl Into<String>) -> Self {
        self.host_ip = Some(host_ip.into());
        self
    }

    /// Set the BGP table.
    pub fn with_bgp(mut self, bgp: ProtocolData<BgpInstanceRecord>) -> Self {
        self.bgp = bgp;
        self
    }

    /// Set the OSPF table.
    pub fn with_ospf(mut self, ospf: ProtocolData<OspfProcessRecord>) -> Self {
        self.ospf = ospf;
        self
    }

    /// The BGP table, where every instance carries the hostname of this device (unless the
    /// instance names its own).
    pub fn bgp_instances(&self) -> ProtocolData<BgpInstanceRecord> {
        self.bgp.clone().map(|mut r| {
            if r.hostname.is_none() {
                r.hostname = self.hostname.clone();
            }
            r
        })
    }

    /// The OSPF table, where every process carries the hostname of this device (unless the
    /// process names its own).
    pub fn ospf_processes(&self) -> ProtocolData<OspfProcessRecord> {
        self.ospf.clone().map(|mut r| {
            if r.hostname.is_none() {
                r.hostname = self.hostname.clone();
            }
            r
        })
    }
}

/// A protocol table of one device that could not be interpreted. The device contributes no
/// records to that protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedTable {
    /// Protocol of the table.
    pub protocol: Protocol,
    /// Hostname of the device.
    pub hostname: Option<String>,
    /// Management address of the device.
    pub host_ip: Option<String>,
    /// Why the table was rejected.
    pub reason: String,
}

/// The snapshots of all devices of a network, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    devices: Vec<DeviceSnapshot>,
}

impl RecordSet {
    /// Create a record set from a list of device snapshots.
    pub fn new(devices: Vec<DeviceSnapshot>) -> Self {
        Self { devices }
    }

    /// Parse a record set from a JSON value, which is either a single device document or a list
    /// of device documents.
    pub fn from_json_value(value: Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Object(_) => Ok(Self::new(vec![serde_json::from_value(value)?])),
            Value::Array(_) => Ok(Self::new(serde_json::from_value(value)?)),
            other => Err(SnapshotError::NotADocument(json_kind(&other))),
        }
    }

    /// Parse a record set from a JSON string (see [`RecordSet::from_json_value`]).
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        Self::from_json_value(serde_json::from_str(s)?)
    }

    /// Read a record set from a JSON file (see [`RecordSet::from_json_value`]).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        log::debug!("Reading snapshot {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        Self::from_json_value(serde_json::from_reader(reader)?)
    }

    /// Read all files and concatenate their record sets, in the given order.
    pub fn from_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, SnapshotError> {
        paths
            .into_iter()
            .map(Self::from_file)
            .fold_ok(Self::default(), |mut acc, set| {
                acc.extend(set);
                acc
            })
    }

    /// All device snapshots.
    pub fn devices(&self) -> &[DeviceSnapshot] {
        &self.devices
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if the record set contains no device.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The BGP instances of all devices, in device order. Each instance carries the hostname of
    /// its device.
    pub fn bgp_instances(&self) -> ProtocolData<BgpInstanceRecord> {
        self.devices.iter().map(|d| d.bgp_instances()).collect()
    }

    /// The OSPF processes of all devices, in device order. Each process carries the hostname of
    /// its device.
    pub fn ospf_processes(&self) -> ProtocolData<OspfProcessRecord> {
        self.devices.iter().map(|d| d.ospf_processes()).collect()
    }

    /// The malformed tables of `protocol`, in device order. These devices are missing from
    /// [`RecordSet::bgp_instances`] or [`RecordSet::ospf_processes`].
    pub fn malformed_tables(&self, protocol: Protocol) -> Vec<MalformedTable> {
        self.devices
            .iter()
            .filter_map(|d| {
                let reason = match protocol {
                    Protocol::Bgp => d.bgp.malformed_reason(),
                    Protocol::Ospf => d.ospf.malformed_reason(),
                }?;
                Some(MalformedTable {
                    protocol,
                    hostname: d.hostname.clone(),
                    host_ip: d.host_ip.clone(),
                    reason: reason.to_string(),
                })
            })
            .collect()
    }
}

impl FromIterator<DeviceSnapshot> for RecordSet {
    fn from_iter<I: IntoIterator<Item = DeviceSnapshot>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<DeviceSnapshot> for RecordSet {
    fn extend<I: IntoIterator<Item = DeviceSnapshot>>(&mut self, iter: I) {
        self.devices.extend(iter)
    }
}

impl IntoIterator for RecordSet {
    type Item = DeviceSnapshot;
    type IntoIter = std::vec::IntoIter<DeviceSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}

/// Error thrown while reading a snapshot document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O Error
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document is neither a device document nor a list of them.
    #[error("Expected a device document or a list of device documents, but found {0}")]
    NotADocument(&'static str),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AsId, BgpPeerRecord};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_log::test;

    fn documents() -> Value {
        json!([
            {
                "hostname": "R1",
                "host_ip": "192.168.0.1",
                "BGP": [{
                    "local_router_id": "10.0.0.1",
                    "local_as_number": 100,
                    "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Established"}]
                }],
                "OSPF": "OSPF is not configured."
            },
            {
                "hostname": "R2",
                "BGP": "BGP is not configured.",
                "OSPF": [{
                    "process": "1",
                    "process router ID": "10.0.0.2",
                    "area_info": [{"Area": "0.0.0.0", "neighbor_info": []}]
                }]
            },
            {
                "hostname": "R3",
                "BGP": {"broken": true}
            }
        ])
    }

    #[test]
    fn parse_list_of_documents() {
        let set = RecordSet::from_json_value(documents()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.devices()[0].host_ip.as_deref(), Some("192.168.0.1"));
        assert!(set.devices()[1].bgp.is_not_configured());
        assert!(set.devices()[2].bgp.malformed_reason().is_some());
        assert!(set.devices()[2].ospf.is_not_configured());
    }

    #[test]
    fn hostnames_are_propagated() {
        let set = RecordSet::from_json_value(documents()).unwrap();

        let bgp = set.bgp_instances();
        assert_eq!(bgp.records().len(), 1);
        assert_eq!(bgp.records()[0].hostname(), Some("R1"));
        assert_eq!(
            bgp.records()[0].peers().unwrap(),
            &[BgpPeerRecord::new("10.0.0.2", AsId(200))][..]
        );

        let ospf = set.ospf_processes();
        assert_eq!(ospf.records().len(), 1);
        assert_eq!(ospf.records()[0].hostname(), Some("R2"));
    }

    #[test]
    fn own_hostname_wins() {
        let set = RecordSet::from_json_value(json!({
            "hostname": "device",
            "OSPF": [{"process": 1, "process router ID": "1.1.1.1", "hostname": "process-host"}]
        }))
        .unwrap();
        assert_eq!(set.ospf_processes().records()[0].hostname(), Some("process-host"));
    }

    #[test]
    fn not_a_document() {
        assert!(matches!(
            RecordSet::from_json_str("\"BGP is not configured.\""),
            Err(SnapshotError::NotADocument("a string"))
        ));
        assert!(matches!(
            RecordSet::from_json_str("{"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn protocol_status_of_set() {
        let set: RecordSet = vec![
            DeviceSnapshot::new("a"),
            DeviceSnapshot::new("b").with_bgp(ProtocolData::Malformed("oops".to_string())),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.bgp_instances(), ProtocolData::Malformed("oops".to_string()));
        assert_eq!(set.ospf_processes(), ProtocolData::NotConfigured);
        assert!(RecordSet::default().bgp_instances().is_not_configured());
    }

    #[test]
    fn malformed_tables_survive_the_merge() {
        let set: RecordSet = vec![
            DeviceSnapshot::new("R1").with_bgp(ProtocolData::from_records(vec![
                BgpInstanceRecord::new(None::<String>, "10.0.0.1", AsId(100)),
            ])),
            DeviceSnapshot::new("R2")
                .with_host_ip("192.168.0.2")
                .with_bgp(ProtocolData::Malformed("expected a list".to_string())),
        ]
        .into_iter()
        .collect();
        assert!(set.bgp_instances().is_configured());
        assert_eq!(
            set.malformed_tables(Protocol::Bgp),
            vec![MalformedTable {
                protocol: Protocol::Bgp,
                hostname: Some("R2".to_string()),
                host_ip: Some("192.168.0.2".to_string()),
                reason: "expected a list".to_string(),
            }]
        );
        assert!(set.malformed_tables(Protocol::Ospf).is_empty());

        let set = RecordSet::from_json_value(documents()).unwrap();
        let tables = set.malformed_tables(Protocol::Bgp);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].hostname.as_deref(), Some("R3"));
        assert_eq!(tables[0].reason, "expected a list, but found an object");
    }
}
