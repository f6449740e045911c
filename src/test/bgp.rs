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

//! BGP topologies of small networks.

use itertools::Itertools;
use maplit::hashset;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::records;
use crate::{
    build_all, build_bgp, builder::SkipReason, ClassificationKey, Config, NodeKind, ProtocolStatus,
};
use routing_snapshot::AsId;

#[test]
fn two_devices_one_peering() {
    let records = records(json!([
        {
            "hostname": "R1",
            "BGP": [{
                "VPN_instance": "Global",
                "local_router_id": "10.0.0.1",
                "local_as_number": 100,
                "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Established"}]
            }]
        },
        {
            "hostname": "R2",
            "BGP": [{"VPN_instance": "Global", "local_router_id": "10.0.0.2", "local_as_number": 200}]
        }
    ]));
    let topo = build_bgp(&records, &Config::default()).unwrap();
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
        ]
    );
    assert_eq!(
        g.edges()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect_vec(),
        vec![("10.0.0.1", "10.0.0.2")]
    );
    // R2 has no peer list and is reported as skipped
    assert_eq!(topo.skipped.len(), 1);
    assert_eq!(topo.skipped[0].hostname.as_deref(), Some("R2"));
}

#[test]
fn empty_peer_list_is_not_skipped() {
    let records = records(json!([
        {
            "hostname": "R1",
            "BGP": [{
                "local_router_id": "10.0.0.1",
                "local_as_number": 100,
                "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Established"}]
            }]
        },
        {
            "hostname": "R2",
            "BGP": [{"local_router_id": "10.0.0.2", "local_as_number": 200, "Peer": []}]
        }
    ]));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    assert!(topo.skipped.is_empty());
    let g = topo.index.get("Global").unwrap();
    // the node is first seen as a peer of R1, so it stays a peer node
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.node("10.0.0.2").unwrap().kind, NodeKind::Peer);
}

#[test]
fn reciprocal_sessions_are_kept() {
    let records = records(json!([
        {
            "hostname": "R1",
            "BGP": [{
                "local_router_id": "10.0.0.1",
                "local_as_number": 100,
                "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 100, "peer_status": "Established"}]
            }]
        },
        {
            "hostname": "R2",
            "BGP": [{
                "local_router_id": "10.0.0.2",
                "local_as_number": 100,
                "Peer": [{"peer_IP": "10.0.0.1", "peer_AS": 100, "peer_status": "Idle"}]
            }]
        }
    ]));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    let g = topo.index.get("Global").unwrap();
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(
        g.edges().map(|e| e.attributes.is_up()).collect_vec(),
        vec![true, false]
    );
    // both routers are in the same AS, and get the same color
    assert_eq!(topo.legend.len(), 1);
    assert_eq!(
        g.nodes().map(|n| n.color.as_str()).unique().collect_vec(),
        vec!["#1f77b4"]
    );
}

#[test]
fn vpn_instances_are_separate_scopes() {
    let records = records(json!({
        "hostname": "PE1",
        "BGP": [
            {
                "VPN_instance": "cust-b",
                "local_router_id": "10.0.0.1",
                "local_as_number": "65000",
                "Peer": [{"peer_IP": "172.16.0.2", "peer_AS": 65002, "peer_status": "Established"}]
            },
            {
                "VPN_instance": "",
                "local_router_id": "10.0.0.1",
                "local_as_number": 65000,
                "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 65000, "peer_status": "Established"}]
            },
            {
                "VPN_instance": "cust-a",
                "local_router_id": "10.0.0.1",
                "local_as_number": 65000,
                "Peer": [{"peer_IP": "172.16.0.2", "peer_AS": 65001, "peer_status": "Established"}]
            }
        ]
    }));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    assert_eq!(
        topo.index.scopes().collect_vec(),
        vec!["cust-b", "Global", "cust-a"]
    );
    // the same address in two VPN instances is two different nodes
    assert_eq!(
        topo.index
            .get("cust-a")
            .unwrap()
            .node("172.16.0.2")
            .unwrap()
            .classification_key,
        ClassificationKey::As(AsId(65001))
    );
    assert_eq!(
        topo.index
            .get("cust-b")
            .unwrap()
            .node("172.16.0.2")
            .unwrap()
            .classification_key,
        ClassificationKey::As(AsId(65002))
    );
    assert_eq!(
        topo.legend.iter().map(|e| e.key.to_string()).collect::<std::collections::HashSet<_>>(),
        hashset! {"AS65000".to_string(), "AS65001".to_string(), "AS65002".to_string()}
    );
}

#[test]
fn custom_default_scope() {
    let records = records(json!({
        "hostname": "R1",
        "BGP": [{
            "local_router_id": "10.0.0.1",
            "local_as_number": 100,
            "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Established"}]
        }]
    }));
    let config = Config {
        default_scope: "default".to_string(),
        unresolved_hostname: "unknown".to_string(),
        ..Default::default()
    };
    let topo = build_bgp(&records, &config).unwrap();
    let g = topo.index.get("default").unwrap();
    assert_eq!(g.node("10.0.0.2").unwrap().display_label, "unknown");
}

#[test]
fn not_configured_bgp_with_ospf() {
    let records = records(json!({
        "hostname": "R1",
        "BGP": "BGP is not configured.",
        "OSPF": [{
            "process": 1,
            "process router ID": "1.1.1.1",
            "area_info": [{
                "Area": "0.0.0.0",
                "neighbor_info": [
                    {"Router ID": "2.2.2.2", "Address": "10.0.0.2", "State": "Full/DR", "Interface": "GE0/0/0"}
                ]
            }]
        }]
    }));
    let topo = build_all(&records, &Config::default()).unwrap();
    assert_eq!(topo.bgp.status, ProtocolStatus::NotConfigured);
    assert!(topo.bgp.index.is_empty());
    assert!(topo.bgp.check().is_err());

    assert_eq!(topo.ospf.status, ProtocolStatus::Configured);
    let g = topo.ospf.check().unwrap().get("1").unwrap();
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn malformed_bgp() {
    let records = records(json!({"hostname": "R1", "BGP": {"local_router_id": "10.0.0.1"}}));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    assert!(matches!(topo.status, ProtocolStatus::Malformed(_)));
    assert!(topo.index.is_empty());
    assert_eq!(topo.skipped.len(), 1);
    assert_eq!(topo.skipped[0].hostname.as_deref(), Some("R1"));
}

#[test]
fn malformed_tables_next_to_a_valid_one_are_reported() {
    let records = records(json!([
        {
            "hostname": "R1",
            "BGP": [{"local_router_id": "10.0.0.1", "local_as_number": 100, "Peer": []}]
        },
        {
            "hostname": "R2",
            "BGP": {"local_router_id": "10.0.0.2", "local_as_number": 200}
        },
        {
            "hostname": "R3",
            "BGP": [{"local_router_id": "10.0.0.3"}]
        }
    ]));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    assert_eq!(topo.status, ProtocolStatus::Configured);
    assert_eq!(topo.index.get("Global").unwrap().node_count(), 1);
    assert_eq!(
        topo.skipped
            .iter()
            .map(|s| s.hostname.as_deref())
            .collect_vec(),
        vec![Some("R2"), Some("R3")]
    );
    assert!(topo
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::MalformedTable { .. })
            && s.router_id.is_none()
            && s.scope_key.is_none()));
    assert_eq!(
        topo.skipped[0].to_string(),
        "[BGP] R2: malformed table: expected a list, but found an object"
    );
    assert!(topo.skipped[1].to_string().contains("no well-formed record"));
}

#[test]
fn serialized_result() {
    let records = records(json!({
        "hostname": "R1",
        "BGP": [{
            "local_router_id": "10.0.0.1",
            "local_as_number": 100,
            "Peer": [{"peer_IP": "10.0.0.2", "peer_AS": 200, "peer_status": "Active"}]
        }]
    }));
    let topo = build_bgp(&records, &Config::default()).unwrap();
    let value = serde_json::to_value(&topo).unwrap();
    assert_eq!(value["protocol"], json!("bgp"));
    assert_eq!(value["status"], json!("configured"));
    assert_eq!(value["topology"]["scopes"], json!(["Global"]));
    assert_eq!(
        value["topology"]["graphs"]["Global"]["links"][0],
        json!({
            "source": "10.0.0.1",
            "target": "10.0.0.2",
            "scope": "Global",
            "protocol": "bgp",
            "local_as": 100,
            "peer_as": 200,
            "status": "Active"
        })
    );
    assert_eq!(
        value["legend"],
        json!([{"key": 100, "color": "#1f77b4"}, {"key": 200, "color": "#ff7f0e"}])
    );
}
