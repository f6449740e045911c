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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use itertools::Itertools;
use serde_json::json;

use peerscope::{
    build_all, build_bgp, build_ospf,
    formatter::{fmt_bgp_table, fmt_ospf_table, IndentedFormatter},
    resolver::IdentityResolver,
    summarize,
    table::{bgp_rows, ospf_rows},
    Config, PeerscopeError, ProtocolTopology, RecordSet,
};

/// Which protocols to show.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum ProtocolChoice {
    /// BGP sessions only.
    Bgp,
    /// OSPF adjacencies only.
    Ospf,
    /// Both protocols.
    All,
}

/// How to print the result.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    /// Machine-readable JSON, the way a graph renderer consumes it.
    Json,
    /// Human-readable text.
    Text,
}

/// Build the BGP and OSPF topology graphs of a set of device snapshots.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    /// Snapshot files. Each file contains a device document, or a list of them.
    #[clap(required = true)]
    snapshots: Vec<PathBuf>,
    /// Protocols to show.
    #[clap(long, short, value_enum, default_value = "all")]
    protocol: ProtocolChoice,
    /// Output format.
    #[clap(long, short, value_enum, default_value = "json")]
    format: OutputFormat,
    /// Print the peer statistics and all unhealthy adjacencies instead of the graphs.
    #[clap(long, short, conflicts_with = "table")]
    summary: bool,
    /// Print the peer tables instead of the graphs.
    #[clap(long, short)]
    table: bool,
    /// Configuration file. Defaults to the file named by `PEERSCOPE_CONFIG`.
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Write the result to this file instead of stdout.
    #[clap(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let config = Config::load(args.config.as_deref())?;
    let records = RecordSet::from_files(&args.snapshots)?;
    log::info!(
        "Read {} device snapshots from {} files",
        records.len(),
        args.snapshots.len()
    );

    let result = if args.summary {
        summary(&args, &records, &config)?
    } else if args.table {
        tables(&args, &records, &config)?
    } else {
        topologies(&args, &records, &config)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, result).map_err(PeerscopeError::from)?;
            log::info!("Result written to {}", path.display());
        }
        None => println!("{result}"),
    }

    Ok(())
}

/// Build and print the topologies of the selected protocols.
fn topologies(args: &Cli, records: &RecordSet, config: &Config) -> Result<String, PeerscopeError> {
    let topos: Vec<ProtocolTopology> = match args.protocol {
        ProtocolChoice::Bgp => vec![build_bgp(records, config)?],
        ProtocolChoice::Ospf => vec![build_ospf(records, config)?],
        ProtocolChoice::All => {
            let topo = build_all(records, config)?;
            vec![topo.bgp, topo.ospf]
        }
    };

    for topo in topos.iter().filter(|t| !t.is_configured()) {
        log::warn!("{}", topo.status.describe());
    }

    Ok(match args.format {
        OutputFormat::Text => topos.iter().map(|t| t.fmt_text(0)).join("\n\n"),
        OutputFormat::Json => {
            let value = topos
                .iter()
                .map(|t| {
                    serde_json::to_value(t).map(|v| (t.protocol.to_string().to_lowercase(), v))
                })
                .collect::<Result<serde_json::Map<String, serde_json::Value>, _>>()?;
            serde_json::to_string_pretty(&value)?
        }
    })
}

/// Print the peer statistics and unhealthy adjacencies.
fn summary(args: &Cli, records: &RecordSet, config: &Config) -> Result<String, PeerscopeError> {
    let summary = summarize(records, config);
    Ok(match args.format {
        OutputFormat::Text => summary.fmt_text(0),
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
    })
}

/// Print the peer tables of the selected protocols.
fn tables(args: &Cli, records: &RecordSet, config: &Config) -> Result<String, PeerscopeError> {
    let show_bgp = args.protocol != ProtocolChoice::Ospf;
    let show_ospf = args.protocol != ProtocolChoice::Bgp;

    let bgp_data = records.bgp_instances();
    let bgp = bgp_rows(
        &bgp_data,
        &IdentityResolver::for_bgp(&bgp_data).with_unresolved(&config.unresolved_hostname),
        &config.default_scope,
    );
    let ospf_data = records.ospf_processes();
    let ospf = ospf_rows(
        &ospf_data,
        &IdentityResolver::for_ospf(&ospf_data).with_unresolved(&config.unresolved_hostname),
    );

    Ok(match args.format {
        OutputFormat::Text => [
            show_bgp.then(|| fmt_bgp_table(&bgp)),
            show_ospf.then(|| fmt_ospf_table(&ospf)),
        ]
        .into_iter()
        .flatten()
        .join("\n\n"),
        OutputFormat::Json => {
            let mut value = json!({});
            if show_bgp {
                value["bgp"] = serde_json::to_value(&bgp)?;
            }
            if show_ospf {
                value["ospf"] = serde_json::to_value(&ospf)?;
            }
            serde_json::to_string_pretty(&value)?
        }
    })
}
