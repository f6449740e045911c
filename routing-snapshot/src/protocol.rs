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

//! Tagged representation of a protocol table.

use serde::{
    de::DeserializeOwned, ser::SerializeSeq, Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

use crate::util::{json_kind, parse_each};

/// The protocol table of a device, decided once while reading the document.
///
/// The producer writes a list of records if the protocol is running, and either a sentence like
/// `"BGP is not configured."` or an empty list if it is not. Anything else is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolData<T> {
    /// The protocol is running, and these are its records (never empty).
    Configured(Vec<T>),
    /// The protocol is not running, or the table is missing.
    NotConfigured,
    /// The table has an unexpected shape.
    Malformed(String),
}

impl<T> Default for ProtocolData<T> {
    fn default() -> Self {
        Self::NotConfigured
    }
}

impl<T> ProtocolData<T> {
    /// Create a protocol table from a list of records. An empty list is `NotConfigured`.
    pub fn from_records(records: Vec<T>) -> Self {
        if records.is_empty() {
            Self::NotConfigured
        } else {
            Self::Configured(records)
        }
    }

    /// The records of the table. This is empty unless the table is `Configured`.
    pub fn records(&self) -> &[T] {
        match self {
            Self::Configured(r) => r,
            Self::NotConfigured | Self::Malformed(_) => &[],
        }
    }

    /// Mutable access to the records of the table.
    pub fn records_mut(&mut self) -> &mut [T] {
        match self {
            Self::Configured(r) => r,
            Self::NotConfigured | Self::Malformed(_) => &mut [],
        }
    }

    /// Returns `true` if the table contains records.
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Returns `true` if the protocol is not configured.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }

    /// The reason why the table is malformed, if it is.
    pub fn malformed_reason(&self) -> Option<&str> {
        match self {
            Self::Malformed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Apply `f` to every record.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ProtocolData<U> {
        match self {
            Self::Configured(r) => ProtocolData::Configured(r.into_iter().map(f).collect()),
            Self::NotConfigured => ProtocolData::NotConfigured,
            Self::Malformed(reason) => ProtocolData::Malformed(reason),
        }
    }
}

impl<T: DeserializeOwned> ProtocolData<T> {
    /// Decide the protocol table from its raw JSON value. Records that cannot be parsed are
    /// dropped with a warning. If no record can be parsed, the table is malformed.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::NotConfigured,
            Value::String(s) => {
                log::debug!("Protocol table is a sentinel: {s:?}");
                Self::NotConfigured
            }
            Value::Array(values) if values.is_empty() => Self::NotConfigured,
            Value::Array(values) => {
                let (records, rejected) = parse_each(values);
                if records.is_empty() {
                    let reason = format!("no well-formed record ({})", rejected.join("; "));
                    log::warn!("Rejecting a protocol table: {reason}");
                    Self::Malformed(reason)
                } else {
                    for e in rejected {
                        log::warn!("Dropping a malformed record: {e}");
                    }
                    Self::Configured(records)
                }
            }
            other => {
                let reason = format!("expected a list, but found {}", json_kind(&other));
                log::warn!("Rejecting a protocol table: {reason}");
                Self::Malformed(reason)
            }
        }
    }
}

/// Merge the tables of several devices. The result is `Configured` with all records (in order) if
/// at least one table is configured. Otherwise, it is the first `Malformed` table, or
/// `NotConfigured`.
impl<T> FromIterator<ProtocolData<T>> for ProtocolData<T> {
    fn from_iter<I: IntoIterator<Item = ProtocolData<T>>>(iter: I) -> Self {
        let mut records = Vec::new();
        let mut malformed = None;
        for data in iter {
            match data {
                Self::Configured(r) => records.extend(r),
                Self::Malformed(reason) => {
                    malformed.get_or_insert(reason);
                }
                Self::NotConfigured => {}
            }
        }
        match (records.is_empty(), malformed) {
            (false, _) => Self::Configured(records),
            (true, Some(reason)) => Self::Malformed(reason),
            (true, None) => Self::NotConfigured,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ProtocolData<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

impl<T: Serialize> Serialize for ProtocolData<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Configured(records) => records.serialize(serializer),
            Self::NotConfigured => serializer.serialize_seq(Some(0))?.end(),
            Self::Malformed(reason) => serializer.serialize_str(reason),
        }
    }
}
