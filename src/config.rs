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

//! This module contains the code for reading the configuration.

use std::path::{Path, PathBuf};

use routing_snapshot::DEFAULT_SCOPE;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{
    color::{AttributeAssigner, CATEGORY10},
    resolver::UNRESOLVED,
};

/// Environment variable pointing to the configuration file.
pub const CONFIG_ENV: &str = "PEERSCOPE_CONFIG";

/// Configuration of the topology builders. Every field is optional in the configuration file.
///
/// ```toml
/// palette = ["#1f77b4", "#ff7f0e", "#2ca02c"]
/// default_scope = "Global"
/// unresolved_hostname = "na"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colors assigned to classification keys, in order.
    #[serde(deserialize_with = "deserialize_palette")]
    pub palette: Vec<String>,
    /// Scope of BGP instances without a VPN instance name.
    pub default_scope: String,
    /// Hostname shown for peers that do not belong to any known device.
    pub unresolved_hostname: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: CATEGORY10.iter().map(|c| c.to_string()).collect(),
            default_scope: DEFAULT_SCOPE.to_string(),
            unresolved_hostname: UNRESOLVED.to_string(),
        }
    }
}

impl Config {
    /// Parse the configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read the configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml_str(&s)
    }

    /// Load the configuration from `path` if given, from the file named by the environment
    /// variable `PEERSCOPE_CONFIG` otherwise, and fall back to the defaults if neither is set.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Create a fresh color assigner with the configured palette.
    pub fn assigner(&self) -> Result<AttributeAssigner, ConfigError> {
        AttributeAssigner::with_palette(self.palette.iter().cloned())
    }
}

fn deserialize_palette<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let palette = Vec::<String>::deserialize(de)?;
    if palette.is_empty() {
        Err(serde::de::Error::custom(ConfigError::EmptyPalette))
    } else {
        Ok(palette)
    }
}

/// Error while reading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Cannot read the configuration file.
    #[error("Cannot read {0:?}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    /// Cannot parse the configuration file.
    #[error("Cannot parse the configuration: {0}")]
    Toml(#[from] toml::de::Error),
    /// The color palette is empty.
    #[error("The color palette must contain at least one color")]
    EmptyPalette,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.palette.len(), 10);
        assert_eq!(config.default_scope, "Global");
        assert_eq!(config.unresolved_hostname, "na");
    }

    #[test]
    fn partial_file() {
        let config = Config::from_toml_str(
            r##"
            palette = ["red", "green"]
            unresolved_hostname = "?"
            "##,
        )
        .unwrap();
        assert_eq!(config.palette, vec!["red", "green"]);
        assert_eq!(config.default_scope, "Global");
        assert_eq!(config.unresolved_hostname, "?");
        assert_eq!(config.assigner().unwrap().palette().len(), 2);
    }

    #[test]
    fn empty_palette() {
        assert!(matches!(
            Config::from_toml_str("palette = []"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_scope = \"public\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.default_scope, "public");
        assert!(matches!(
            Config::from_file("/nonexistent/peerscope.toml"),
            Err(ConfigError::Read(..))
        ));
    }
}
