//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, method, headers, body)
//!     → router.rs (route lookup by exact path, then method)
//!     → matcher.rs (evaluate the endpoint's predicate chain)
//!     → dispatcher.rs (write canned response, 404 or 403)
//!
//! Route compilation (at startup):
//!     EndpointConfig[]
//!     → resolve response bodies, compile predicates
//!     → insert in file order (later entries override)
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact path matching only; no wildcards or prefix trees
//! - Deterministic: same input always resolves the same endpoint
//! - Predicate failures are ordinary outcomes, never errors

pub mod dispatcher;
pub mod matcher;
pub mod router;

pub use dispatcher::{dispatch, Outcome};
pub use matcher::{compare, Predicate, PredicateChain};
pub use router::{BuildError, Endpoint, NotFound, Route, RouteTable};
