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

//! Deterministic color assignment for classification keys.

use std::fmt::Display;

use indexmap::IndexMap;
use routing_snapshot::AsId;
use serde::Serialize;

use crate::config::ConfigError;

/// The categorical palette used when no other palette is configured.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// The attribute that decides the color of a node: the AS number for BGP, and the router ID for
/// OSPF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ClassificationKey {
    /// BGP nodes are classified by their AS number.
    As(AsId),
    /// OSPF nodes are classified by their router ID.
    RouterId(String),
}

impl Display for ClassificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationKey::As(id) => id.fmt(f),
            ClassificationKey::RouterId(id) => f.write_str(id),
        }
    }
}

impl From<AsId> for ClassificationKey {
    fn from(x: AsId) -> Self {
        Self::As(x)
    }
}

/// Assigns colors from a cyclic palette to classification keys, in the order in which the keys
/// are first seen. The same key always gets the same color from the same assigner. Once the
/// palette is exhausted, colors are reused.
///
/// Each build uses its own assigner, so two builds never influence each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeAssigner {
    palette: Vec<String>,
    assigned: IndexMap<ClassificationKey, usize>,
}

impl Default for AttributeAssigner {
    fn default() -> Self {
        Self {
            palette: CATEGORY10.iter().map(|c| c.to_string()).collect(),
            assigned: IndexMap::new(),
        }
    }
}

impl AttributeAssigner {
    /// Create an assigner with the default palette ([`CATEGORY10`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assigner with a custom palette. The palette must not be empty.
    pub fn with_palette<S: Into<String>>(
        palette: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        let palette: Vec<String> = palette.into_iter().map(Into::into).collect();
        if palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(Self {
            palette,
            assigned: IndexMap::new(),
        })
    }

    /// The color of `key`. If the key was not seen before, it gets the next color of the palette.
    pub fn color_for(&mut self, key: impl Into<ClassificationKey>) -> &str {
        let next = self.assigned.len() % self.palette.len();
        let idx = *self.assigned.entry(key.into()).or_insert(next);
        &self.palette[idx]
    }

    /// The color of `key`, if it was already assigned one.
    pub fn get(&self, key: &ClassificationKey) -> Option<&str> {
        self.assigned.get(key).map(|idx| self.palette[*idx].as_str())
    }

    /// The palette of this assigner.
    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    /// Number of keys that were assigned a color.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Returns `true` if no key was assigned a color yet.
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// All assignments in the order in which the keys were first seen. This is the legend of the
    /// rendered graph.
    pub fn legend(&self) -> Vec<(ClassificationKey, String)> {
        self.assigned
            .iter()
            .map(|(k, idx)| (k.clone(), self.palette[*idx].clone()))
            .collect()
    }
}
