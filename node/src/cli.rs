//! # CLI Interface
//!
//! Command-line arguments for `tessera-node`, via `clap` derive. Every
//! `run` flag can also come from a `TESSERA_*` environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tessera_protocol::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

use crate::logging::LogFormat;

/// Tessera peer node.
///
/// Hosts the asset-transfer contract over a local ledger and exposes it
/// through an HTTP submit/evaluate gateway plus a Prometheus endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "tessera-node",
    about = "Tessera peer node",
    version,
    propagate_version = true
)]
pub struct TesseraNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the peer.
    Run(RunArgs),
    /// Print the committed transaction history of a data directory.
    History(HistoryArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the sled ledger. Created on first run.
    #[arg(long, short = 'd', env = "TESSERA_DATA_DIR", default_value = "./tessera-data")]
    pub data_dir: PathBuf,

    /// Keep the ledger in memory only. Nothing survives a restart.
    #[arg(long)]
    pub in_memory: bool,

    /// Port for the submit/evaluate API.
    #[arg(long, env = "TESSERA_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "TESSERA_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "TESSERA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Level for the Tessera crates. `RUST_LOG` overrides it when set.
    #[arg(long, env = "TESSERA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Comma-separated MSP IDs allowed to submit, e.g. `Org1MSP,Org2MSP`.
    /// When empty, any organization header is accepted.
    #[arg(long, env = "TESSERA_ORGS", value_delimiter = ',')]
    pub orgs: Vec<String>,
}

/// Arguments for the `history` subcommand.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[arg(long, short = 'd', env = "TESSERA_DATA_DIR", default_value = "./tessera-data")]
    pub data_dir: PathBuf,
}
