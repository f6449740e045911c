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

//! Formatting topologies and summaries as text.

use itertools::Itertools;

use crate::{
    builder::{ProtocolStatus, ProtocolTopology, Topology},
    graph::{EdgeAttributes, GraphEdge, GraphNode, NodeKind, TopologyGraph},
    scope::ScopeIndex,
    summary::{BgpStatistics, OspfStatistics, Summary},
    table::{BgpPeerRow, OspfNeighborRow, BGP_COLUMNS, OSPF_COLUMNS},
};

/// Trait to format things as text using appropriate indentation.
pub trait IndentedFormatter {
    /// Format something with some specific indent.
    fn fmt_text(&self, indent: usize) -> String;
}

impl IndentedFormatter for GraphNode {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        let kind = match self.kind {
            NodeKind::Local => "local",
            NodeKind::Peer => "peer ",
        };
        format!(
            "{tab}{kind} {} [{}] ({}, {})",
            self.id, self.display_label, self.classification_key, self.color
        )
    }
}

impl IndentedFormatter for GraphEdge {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        let detail = match &self.attributes {
            EdgeAttributes::Bgp {
                local_as,
                peer_as,
                status,
            } => format!("{local_as} -> {peer_as}, {status}"),
            EdgeAttributes::Ospf {
                area_id,
                address,
                state,
                interface,
                ..
            } => format!("area {area_id}, {address} via {interface}, {state}"),
        };
        let mark = if self.attributes.is_up() { "" } else { " (down)" };
        format!("{tab}{} -> {} ({detail}){mark}", self.source, self.target)
    }
}

impl IndentedFormatter for TopologyGraph {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        format!(
            "{tab}{} {{\n{tab}  nodes:\n{}\n{tab}  links:\n{}\n{tab}}}",
            self.scope_key(),
            self.nodes().map(|n| n.fmt_text(indent + 4)).join("\n"),
            self.edges().map(|e| e.fmt_text(indent + 4)).join("\n"),
        )
    }
}

impl IndentedFormatter for ScopeIndex {
    fn fmt_text(&self, indent: usize) -> String {
        self.iter().map(|g| g.fmt_text(indent)).join("\n")
    }
}

impl IndentedFormatter for ProtocolTopology {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        match &self.status {
            ProtocolStatus::Configured => {}
            ProtocolStatus::NotConfigured => {
                return format!("{tab}{} is not configured.", self.protocol)
            }
            ProtocolStatus::Malformed(reason) => {
                return format!("{tab}{} is not configured ({reason}).", self.protocol)
            }
        }
        let mut out = format!(
            "{tab}{} topology, scopes: {}\n{}",
            self.protocol,
            self.index.scopes().join(", "),
            self.index.fmt_text(indent + 2)
        );
        if !self.legend.is_empty() {
            out.push_str(&format!(
                "\n{tab}  legend:\n{}",
                self.legend
                    .iter()
                    .map(|e| format!("{tab}    {}: {}", e.key, e.color))
                    .join("\n")
            ));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!(
                "\n{tab}  skipped:\n{}",
                self.skipped
                    .iter()
                    .map(|s| format!("{tab}    {s}"))
                    .join("\n")
            ));
        }
        out
    }
}

impl IndentedFormatter for Topology {
    fn fmt_text(&self, indent: usize) -> String {
        format!(
            "{}\n\n{}",
            self.bgp.fmt_text(indent),
            self.ospf.fmt_text(indent)
        )
    }
}

impl IndentedFormatter for BgpStatistics {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        let mut out = format!(
            "{tab}BGP: {} instances, {} peers, {} established",
            self.instances, self.peers, self.established
        );
        for m in &self.mismatches {
            out.push_str(&format!(
                "\n{tab}  {} in {}: declares {}/{} established, lists {}/{}",
                m.hostname.as_deref().unwrap_or("?"),
                m.scope_key,
                m.declared_established
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                m.declared_total
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                m.listed_established,
                m.listed_total,
            ));
        }
        out
    }
}

impl IndentedFormatter for OspfStatistics {
    fn fmt_text(&self, indent: usize) -> String {
        format!(
            "{}OSPF: {} processes, {} neighbors, {} full",
            " ".repeat(indent),
            self.processes,
            self.neighbors,
            self.full
        )
    }
}

impl IndentedFormatter for Summary {
    fn fmt_text(&self, indent: usize) -> String {
        let tab = " ".repeat(indent);
        let unhealthy = if self.unhealthy.is_empty() {
            format!("{tab}  none")
        } else {
            self.unhealthy
                .iter()
                .map(|u| format!("{tab}  {u}"))
                .join("\n")
        };
        format!(
            "{}\n{}\n{tab}Unhealthy adjacencies:\n{unhealthy}",
            self.bgp.fmt_text(indent),
            self.ospf.fmt_text(indent),
        )
    }
}

/// Format rows as a plain text table with aligned columns.
pub fn fmt_table<const N: usize>(columns: [&str; N], rows: &[[String; N]]) -> String {
    let widths: Vec<usize> = (0..N)
        .map(|i| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(columns[i].chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();
    let line = |cells: Vec<&str>| {
        cells
            .into_iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .join(" | ")
            .trim_end()
            .to_string()
    };
    std::iter::once(line(columns.to_vec()))
        .chain(std::iter::once(
            widths.iter().map(|w| "-".repeat(*w)).join("-+-"),
        ))
        .chain(rows.iter().map(|r| line(r.iter().map(String::as_str).collect())))
        .join("\n")
}

/// Format the BGP peer table.
pub fn fmt_bgp_table(rows: &[BgpPeerRow]) -> String {
    fmt_table(BGP_COLUMNS, &rows.iter().map(BgpPeerRow::cells).collect_vec())
}

/// Format the OSPF neighbor table.
pub fn fmt_ospf_table(rows: &[OspfNeighborRow]) -> String {
    fmt_table(
        OSPF_COLUMNS,
        &rows.iter().map(OspfNeighborRow::cells).collect_vec(),
    )
}
