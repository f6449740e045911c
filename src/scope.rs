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

//! Lookup structure from a scope to its topology.

use indexmap::{map::Entry, IndexMap};
use itertools::Itertools;
use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::graph::TopologyGraph;

/// All topologies of one protocol, keyed by scope. The scopes are kept in the order in which they
/// were first seen, which is the order a selection control should present them in.
#[derive(Debug, Clone, Default)]
pub struct ScopeIndex {
    graphs: IndexMap<String, TopologyGraph>,
}

impl ScopeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The topology of `scope_key`, creating an empty one if the scope was not seen before.
    pub(crate) fn graph_mut(&mut self, scope_key: &str) -> &mut TopologyGraph {
        match self.graphs.entry(scope_key.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                log::trace!("New scope: {scope_key}");
                e.insert(TopologyGraph::new(scope_key))
            }
        }
    }

    /// The topology of a scope, or `None` if the scope does not exist.
    pub fn get(&self, scope_key: &str) -> Option<&TopologyGraph> {
        self.graphs.get(scope_key)
    }

    /// The topology of a scope. If the scope does not exist, fall back to the first scope.
    pub fn get_or_first(&self, scope_key: &str) -> Option<&TopologyGraph> {
        self.get(scope_key).or_else(|| self.first())
    }

    /// The topology of the first scope.
    pub fn first(&self) -> Option<&TopologyGraph> {
        self.graphs.values().next()
    }

    /// All scope keys, in the order they were first seen.
    pub fn scopes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graphs.keys().map(String::as_str)
    }

    /// Iterate over all topologies, in scope order.
    pub fn iter(&self) -> impl Iterator<Item = &TopologyGraph> + '_ {
        self.graphs.values()
    }

    /// Returns `true` if the scope exists.
    pub fn contains(&self, scope_key: &str) -> bool {
        self.graphs.contains_key(scope_key)
    }

    /// Number of scopes.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Returns `true` if there are no scopes.
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl FromIterator<TopologyGraph> for ScopeIndex {
    /// Collect topologies into an index. If two topologies have the same scope, the later one
    /// replaces the earlier one, but keeps its position.
    fn from_iter<I: IntoIterator<Item = TopologyGraph>>(iter: I) -> Self {
        Self {
            graphs: iter
                .into_iter()
                .map(|g| (g.scope_key().to_string(), g))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ScopeIndex {
    type Item = &'a TopologyGraph;
    type IntoIter = indexmap::map::Values<'a, String, TopologyGraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.graphs.values()
    }
}

impl Serialize for ScopeIndex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("ScopeIndex", 2)?;
        s.serialize_field("scopes", &self.scopes().collect_vec())?;
        s.serialize_field("graphs", &self.graphs)?;
        s.end()
    }
}
