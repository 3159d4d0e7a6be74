// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera Peer Node
//!
//! Entry point for the `tessera-node` binary. Parses CLI arguments, sets up
//! logging and metrics, opens the ledger and serves the gateway API.
//!
//! Subcommands:
//!
//! - `run`     — start the peer
//! - `history` — dump committed history from a data directory
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use tessera_contracts::AssetLedger;
use tessera_protocol::identity::OrgId;
use tessera_protocol::storage::{CollectionStore, MemoryStore, SledStore};

use cli::{Commands, TesseraNodeCli};
use logging::LogSettings;
use metrics::NodeMetrics;

/// Subdirectory of the data dir that holds the sled database.
const LEDGER_DIR: &str = "ledger";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TesseraNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::History(args) => print_history(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the peer: ledger, API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&LogSettings::new(args.log_format, &args.log_level))?;

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        in_memory = args.in_memory,
        "starting tessera-node"
    );

    // --- Ledger storage ---
    let (store, sled): (Arc<dyn CollectionStore>, Option<Arc<SledStore>>) = if args.in_memory {
        tracing::warn!("running with an in-memory ledger; state is lost on exit");
        let memory: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
        (memory, None)
    } else {
        let db_path = args.data_dir.join(LEDGER_DIR);
        std::fs::create_dir_all(&db_path).with_context(|| {
            format!("failed to create ledger directory: {}", db_path.display())
        })?;
        let sled = Arc::new(
            SledStore::open(&db_path)
                .with_context(|| format!("failed to open ledger at {}", db_path.display()))?,
        );
        tracing::info!(
            path = %db_path.display(),
            history = sled.history_len(),
            "ledger opened"
        );
        let shared: Arc<dyn CollectionStore> = sled.clone();
        (shared, Some(sled))
    };

    let members: Vec<OrgId> = args
        .orgs
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(OrgId::new)
        .collect();
    if members.is_empty() {
        tracing::warn!("no TESSERA_ORGS configured; accepting any organization header");
    } else {
        tracing::info!(orgs = ?members, "membership configured");
    }

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            tessera_protocol::config::PROTOCOL_VERSION,
        ),
        ledger: Arc::new(AssetLedger::new(store)),
        metrics: Arc::clone(&node_metrics),
        members: Arc::new(members),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("gateway API listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    if let Some(sled) = sled {
        sled.flush().context("failed to flush ledger")?;
    }
    tracing::info!("tessera-node stopped");
    Ok(())
}

/// Prints committed history as JSON lines.
fn print_history(args: cli::HistoryArgs) -> Result<()> {
    let db_path = args.data_dir.join(LEDGER_DIR);
    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open ledger at {}", db_path.display()))?;
    for record in store.history().context("failed to read history")? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

fn print_version() {
    println!("tessera-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", tessera_protocol::config::PROTOCOL_VERSION);
    println!("contract     {}", tessera_protocol::config::CONTRACT_NAME);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
