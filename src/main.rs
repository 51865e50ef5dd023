//! Linkpage server
//!
//! Serves userpages, post ingestion and the public feed over HTTP.

use clap::{Arg, Command};
use linkpage::core::config::StorageType;
use linkpage::core::logging::init_logging;
use linkpage::core::{create_app_state, load_config_or_default, Config};
use linkpage::system::metrics;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let matches = Command::new("linkpage")
        .version(linkpage::VERSION)
        .about("Personal link pages built from ordered components.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address")
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory for file storage")
        )
        .arg(
            Arg::new("storage-type")
                .long("storage-type")
                .value_name("TYPE")
                .help("Storage backend type (memory, file)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("scraper-endpoint")
                .long("scraper-endpoint")
                .value_name("URL")
                .help("Link preview service endpoint")
        )
        .get_matches();

    // Load configuration: file, then environment, then command line
    let mut config = load_config_or_default(matches.get_one::<String>("config").map(String::as_str))?;
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    init_logging(&config.logging)?;
    info!("Starting {} v{}", linkpage::NAME, linkpage::VERSION);

    if config.metrics.enable_prometheus {
        metrics::init_registry()?;
        info!("Prometheus metrics enabled at /metrics");
    }

    let app_state = create_app_state(config)?;
    linkpage::api::start_api_server(app_state, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> linkpage::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| linkpage::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = data_dir.into();
    }

    if let Some(storage_type) = matches.get_one::<String>("storage-type") {
        config.storage.storage_type = storage_type.parse::<StorageType>()?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if let Some(endpoint) = matches.get_one::<String>("scraper-endpoint") {
        config.scraper.endpoint = Some(endpoint.clone());
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C signal, shutting down");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down");
        },
    }
}
