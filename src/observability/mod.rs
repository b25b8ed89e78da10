//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (per-request span with request ID)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every event of a request
//! - Metrics are cheap (no-op without an exporter)

pub mod logging;
pub mod metrics;
pub mod tracing;
