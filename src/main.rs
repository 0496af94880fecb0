//! aufloes — local DNS forwarder
//!
//! Main entry point that wires all crates together and starts the listener.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use aufloes_cache::CacheManager;
use aufloes_core::config::AppConfig;
use aufloes_core::error::AppError;
use aufloes_server::{DnsServer, Resolver, ResolverOptions};
use aufloes_upstream::UpstreamManager;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if cli.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to render configuration: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Resolver error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment, then apply CLI overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        "pretty" => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().compact().with_env_filter(filter).init();
        }
    }
    tracing::debug!("verbose logging enabled");
}

/// Build the pipeline and serve until a shutdown signal arrives
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting aufloes v{}", env!("CARGO_PKG_VERSION"));

    let upstream = Arc::new(UpstreamManager::new(&config.upstream).await?);
    let cache = Arc::new(CacheManager::new(&config.cache)?);
    let resolver = Arc::new(Resolver::new(
        upstream,
        cache,
        ResolverOptions::from_config(&config),
    ));

    let server =
        DnsServer::bind(&config.server.socket_addrs(), resolver.clone(), &config.server).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server.run(shutdown_rx));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping listener...");
    let _ = shutdown_tx.send(true);

    server_task
        .await
        .map_err(|e| AppError::internal(format!("Listener task failed: {}", e)))??;

    let snapshot = resolver.metrics().snapshot();
    tracing::info!(metrics = %serde_json::to_string(&snapshot)?, "aufloes stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
