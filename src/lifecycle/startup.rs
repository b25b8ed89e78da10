//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the route table (reads every response body file)
//! - Start the optional metrics exporter
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served
//! - The listener binds last (traffic only when ready)

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{config_dir, load_config, ConfigError, RuntimeConfig, StubConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;
use crate::routing::{BuildError, RouteTable};

/// Error type for process startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Configuration and route table ready to serve.
#[derive(Debug)]
pub struct Bootstrap {
    pub config: StubConfig,
    pub table: RouteTable,
}

/// Load the configuration file and build the route table.
pub fn bootstrap(config_path: &Path) -> Result<Bootstrap, StartupError> {
    let config = load_config(config_path)?;
    let base_dir = config_dir(config_path);
    let table = RouteTable::from_config(&config, &base_dir)?;

    tracing::info!(
        path = %config_path.display(),
        endpoints = config.endpoints.len(),
        routes = table.len(),
        "Configuration loaded"
    );

    Ok(Bootstrap { config, table })
}

/// Bind the configured host and port.
pub async fn bind(config: &StubConfig) -> Result<TcpListener, StartupError> {
    let address = format!("{}:{}", config.bind_host(), config.port);
    TcpListener::bind((config.bind_host(), config.port))
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Run the stub server described by the file at `config_path`.
pub async fn run(config_path: PathBuf, runtime: RuntimeConfig) -> Result<(), StartupError> {
    let Bootstrap { config, table } = bootstrap(&config_path)?;

    if let Some(addr) = runtime.observability.metrics_address {
        metrics::init_metrics(addr)?;
    }
    metrics::record_routes(table.len());

    if !table.title().is_empty() {
        tracing::info!(title = %table.title(), "Stub loaded");
    }
    for (path, methods) in table.listing() {
        tracing::info!(path = %path, methods = %methods.join(" "), "Route");
    }

    let listener = bind(&config).await?;
    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(address = %local_addr, "ezstub listening");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(table, &runtime);
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
