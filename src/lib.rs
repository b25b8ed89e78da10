//! ezstub: a configurable mock HTTP server.
//!
//! Requests are answered with canned responses selected by exact URL path,
//! HTTP method and an optional chain of request predicates (headers, query
//! or form parameters, values inside a JSON body).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::StubConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
