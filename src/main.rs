//! ezstub
//!
//! A mock HTTP server driven by a YAML file.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                    EZSTUB                     │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│  http   │──▶│  router  │──▶│ predicate  │  │
//!                     │  │ server  │   │path+meth │   │   chain    │  │
//!                     │  └─────────┘   └──────────┘   └─────┬──────┘  │
//!                     │                                     │         │
//!   Client Response   │  ┌─────────────┐   ┌──────────────┐ │         │
//!   ◀─────────────────┼──│instrumented │◀──│  canned resp │◀┘         │
//!                     │  │   writer    │   │  / 403 / 404 │           │
//!                     │  └─────────────┘   └──────────────┘           │
//!                     │                                               │
//!                     │   config · lifecycle · observability          │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ezstub::config::{LimitsConfig, ObservabilityConfig, RuntimeConfig, TimeoutConfig};
use ezstub::lifecycle;
use ezstub::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "ezstub")]
#[command(about = "Mock HTTP server answering requests with canned responses", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "ezstub.yaml")]
    config: PathBuf,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, env = "EZSTUB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = LimitsConfig::default().max_body_bytes)]
    max_body_bytes: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = TimeoutConfig::default().request_secs)]
    request_timeout_secs: u64,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

impl Cli {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            timeouts: TimeoutConfig {
                request_secs: self.request_timeout_secs,
            },
            limits: LimitsConfig {
                max_body_bytes: self.max_body_bytes,
            },
            observability: ObservabilityConfig {
                log_level: self.log_level.clone(),
                metrics_address: self.metrics_address,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = cli.runtime_config();

    logging::init_logging(&runtime.observability.log_level);
    tracing::info!("ezstub v{} starting", env!("CARGO_PKG_VERSION"));

    match lifecycle::run(cli.config, runtime).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
