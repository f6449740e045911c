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

//! Helpers for the lenient parts of document deserialization.

use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

/// Parse each element of a JSON array on its own. Elements that cannot be parsed are dropped, and
/// a description of each rejected element is returned alongside the parsed records.
pub(crate) fn parse_each<T: DeserializeOwned>(values: Vec<Value>) -> (Vec<T>, Vec<String>) {
    let mut records = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(r) => records.push(r),
            Err(e) => rejected.push(format!("entry {i}: {e}")),
        }
    }
    (records, rejected)
}

/// Name of the JSON type of a value, used in diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Deserialize a nested list (peers, areas or neighbors). A missing or `null` list, or a value
/// that is not a list at all, yields `None`. Entries of the list that cannot be parsed are dropped
/// with a warning.
pub(crate) fn lenient_list<'de, D, T>(de: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(de)? {
        Value::Null => Ok(None),
        Value::Array(values) => {
            let (records, rejected) = parse_each(values);
            for e in rejected {
                log::warn!("Dropping a malformed list entry: {e}");
            }
            Ok(Some(records))
        }
        other => {
            log::warn!("Expected a list, but found {}", json_kind(&other));
            Ok(None)
        }
    }
}

/// Deserialize an identifier that the producer sometimes writes as a number (e.g., an OSPF process
/// id).
pub(crate) fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::String(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Deserialize an optional counter that is either a number or a numeric string.
pub(crate) fn optional_count<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        String(String),
    }
    match Option::<Raw>::deserialize(de)? {
        None => Ok(None),
        Some(Raw::Number(x)) => Ok(Some(x)),
        Some(Raw::String(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
    }
}
