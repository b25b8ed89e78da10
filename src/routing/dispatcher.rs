//! Request dispatch.
//!
//! Resolves the endpoint, runs its predicate chain and writes either the
//! canned response or a rejection.

use std::io;

use axum::http::StatusCode;

use crate::http::request::StubRequest;
use crate::http::response::write_error;
use crate::http::sink::ResponseWriter;
use crate::routing::router::{NotFound, RouteTable};

/// What happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The endpoint's canned response was written.
    Served,
    /// No endpoint for the path or method (404).
    NotFound(NotFound),
    /// The predicate chain failed (403).
    Rejected,
}

impl Outcome {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Served => "served",
            Outcome::NotFound(NotFound::Route) => "route_not_found",
            Outcome::NotFound(NotFound::Method) => "method_not_found",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Dispatch one request. Write errors are returned to the caller untouched.
pub fn dispatch<W: ResponseWriter>(
    table: &RouteTable,
    req: &StubRequest,
    writer: &mut W,
) -> io::Result<Outcome> {
    let endpoint = match table.resolve(req.path(), req.method()) {
        Ok(endpoint) => endpoint,
        Err(reason) => {
            tracing::debug!(
                request_id = %req.request_id(),
                method = %req.method(),
                path = %req.path(),
                reason = %reason,
                "No endpoint matched"
            );
            write_error(writer, StatusCode::NOT_FOUND)?;
            return Ok(Outcome::NotFound(reason));
        }
    };

    if let Some(failed) = endpoint.predicates().first_failure(req) {
        tracing::debug!(
            request_id = %req.request_id(),
            path = %req.path(),
            predicate = %failed,
            "Request rejected"
        );
        write_error(writer, StatusCode::FORBIDDEN)?;
        return Ok(Outcome::Rejected);
    }

    endpoint.write_response(writer)?;
    Ok(Outcome::Served)
}
