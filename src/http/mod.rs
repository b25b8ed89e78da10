//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (StubRequest; body buffered only if a predicate reads it)
//!     → [routing::dispatch resolves and validates]
//!     → response.rs (canned response or rejection)
//!     → sink.rs (instrumented writer → axum Response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod sink;

pub use request::{StubRequest, X_REQUEST_ID};
pub use response::ResponseDescriptor;
pub use server::HttpServer;
pub use sink::{BufferedResponse, InstrumentedWriter, ResponseWriter};
