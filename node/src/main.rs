// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Wallet Node
//!
//! Entry point for the `wallet-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the ledger store, starts the
//! connectivity monitor and serves the game-processor API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the wallet node
//! - `seed`    — load bootstrap records and exit
//! - `sign`    — print the `Sign` header for a request body
//! - `version` — print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

use wallet_ledger::store::SledLedger;
use wallet_ledger::{
    seed, BootstrapStore, ConnectivityMonitor, ErrorCode, StoreError, WalletError, WalletService,
};

use cli::{Commands, WalletNodeCli};
use config::{NodeConfig, StoreConfig};
use metrics::WalletMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WalletNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Seed(args) => seed_store(args).await,
        Commands::Sign(args) => print_sign(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full node: store, connectivity monitor, API server and
/// metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let config = NodeConfig::from_args(&args);
    start_logging(config.as_ref().ok().map(|c| &c.store), &args.common);
    let config = config.map_err(log_fatal)?;

    tracing::info!(
        env = config.store.env.as_str(),
        http_addr = %config.http_addr,
        metrics_addr = %config.metrics_addr,
        data_dir = %config.store.data_dir.display(),
        "starting wallet-node"
    );

    // --- Persistent storage ---
    let store = Arc::new(open_store(&config.store.data_dir).map_err(log_fatal)?);

    if config.seed {
        seed::load(store.as_ref()).await.map_err(log_fatal)?;
    }

    // --- Metrics ---
    let wallet_metrics = Arc::new(WalletMetrics::new());
    wallet_metrics.store_up.set(1);

    // --- Connectivity monitor ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = ConnectivityMonitor::new(store.clone())
        .with_observer(wallet_metrics.clone())
        .spawn(shutdown_rx);

    // --- Application state ---
    let app_state = api::AppState {
        wallet: WalletService::new(store.clone()),
        metrics: Arc::clone(&wallet_metrics),
        api_key: Arc::from(config.api_key.as_str()),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", config.http_addr))?;
    tracing::info!("API server listening on {}", config.http_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&wallet_metrics));
    let metrics_listener = tokio::net::TcpListener::bind(config.metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", config.metrics_addr))?;
    tracing::info!("Metrics server listening on {}", config.metrics_addr);

    // --- Serve ---
    let mut api_shutdown = shutdown_tx.subscribe();
    let mut metrics_shutdown = shutdown_tx.subscribe();
    let api_server = axum::serve(api_listener, api_router).with_graceful_shutdown(async move {
        let _ = api_shutdown.changed().await;
    });
    let metrics_server =
        axum::serve(metrics_listener, metrics_router).with_graceful_shutdown(async move {
            let _ = metrics_shutdown.changed().await;
        });

    let api_task = tokio::spawn(async move { api_server.await });
    let metrics_task = tokio::spawn(async move { metrics_server.await });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);

    match api_task.await {
        Ok(Err(e)) => tracing::error!("API server error: {}", e),
        Err(e) => tracing::error!("API server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    match metrics_task.await {
        Ok(Err(e)) => tracing::error!("Metrics server error: {}", e),
        Err(e) => tracing::error!("Metrics server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    if let Err(e) = monitor.await {
        tracing::error!("connectivity monitor task failed: {}", e);
    }

    store.flush().context("failed to flush store")?;
    tracing::info!("wallet-node stopped");
    Ok(())
}

/// Loads bootstrap records into the data directory, optionally wiping it
/// first.
async fn seed_store(args: cli::SeedArgs) -> Result<()> {
    let config = StoreConfig::from_args(&args.common);
    start_logging(config.as_ref().ok(), &args.common);
    let config = config.map_err(log_fatal)?;
    let store = open_store(&config.data_dir).map_err(log_fatal)?;

    if args.reset {
        if !config.env.allows_reset() {
            let err = WalletError::new("node.seed", ErrorCode::Config)
                .caused_by(format!("reset refused in {} environment", config.env.as_str()));
            return Err(log_fatal(err).into());
        }
        store
            .reset()
            .await
            .map_err(|e| log_fatal(WalletError::new("node.seed", ErrorCode::Internal).caused_by(e)))?;
    }

    let report = seed::load(&store).await.map_err(log_fatal)?;
    store.flush().context("failed to flush store")?;

    println!("Seed complete.");
    println!("  Data directory : {}", config.data_dir.display());
    println!("  Created        : {}", report.created);
    println!("  Skipped        : {}", report.skipped);
    Ok(())
}

/// Prints the `Sign` header value for a body read from a file or stdin.
fn print_sign(args: cli::SignArgs) -> Result<()> {
    let body = match &args.body {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read body from {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read body from stdin")?;
            buf
        }
    };

    println!("{}", api::sign::compute_sign(&body, &args.api_key));
    Ok(())
}

/// Opens the sled store. A database that cannot be opened at all is a
/// connection failure; one whose trees cannot be set up is a repo init
/// failure.
fn open_store(data_dir: &Path) -> Result<SledLedger, WalletError> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
        WalletError::new("node.store", ErrorCode::Connect)
            .caused_by(format!("failed to create {}: {e}", data_dir.display()))
    })?;

    let store = SledLedger::open(data_dir).map_err(|e| {
        let code = match &e {
            StoreError::Unavailable(_) => ErrorCode::Connect,
            _ => ErrorCode::RepoInit,
        };
        WalletError::new("node.store", code).caused_by(e)
    })?;

    tracing::info!(path = %data_dir.display(), "store opened");
    Ok(store)
}

/// Initializes logging from validated settings. When validation failed,
/// logs at the fallback level so the config error is still reported.
fn start_logging(config: Option<&StoreConfig>, common: &cli::CommonArgs) {
    match config {
        Some(store) => logging::init_logging(&store.log_directive(), store.log_format),
        None => logging::init_logging(
            &logging::default_directive(logging::FALLBACK_LEVEL),
            logging::LogFormat::from_str_lossy(&common.log_format),
        ),
    }
}

/// Logs a startup failure with its full chain before it aborts the process.
fn log_fatal(err: WalletError) -> WalletError {
    tracing::error!(code = %err.code(), error = %err.chain(), "startup failed");
    err
}

/// Prints version information to stdout.
fn print_version() {
    println!("wallet-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
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
