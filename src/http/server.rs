//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer request bodies that a predicate reads and hand them to the dispatcher
//! - Log and record metrics for every request
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - The body is only read when the resolved endpoint has a predicate that
//!   inspects it; unknown routes and body-blind endpoints never see 413
//! - A body over the limit is 413, any other read failure is 400

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::State,
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Router,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RuntimeConfig;
use crate::http::request::{StubRequest, UuidRequestId};
use crate::http::sink::{BufferedResponse, InstrumentedWriter};
use crate::observability::metrics;
use crate::observability::tracing::RequestSpan;
use crate::routing::{dispatch, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub max_body_bytes: usize,
}

/// HTTP server for the stub.
pub struct HttpServer {
    router: Router,
    table: Arc<RouteTable>,
}

impl HttpServer {
    /// Create a new HTTP server serving the given route table.
    pub fn new(table: RouteTable, config: &RuntimeConfig) -> Self {
        let table = Arc::new(table);
        let state = AppState {
            table: table.clone(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(config, state);
        Self { router, table }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RuntimeConfig, state: AppState) -> Router {
        Router::new()
            .fallback(stub_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving through something other than [`HttpServer::run`].
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.table.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffers the body if needed and dispatches against
/// the route table.
async fn stub_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let body = if needs_body(&state.table, &parts) {
        match read_body(body, state.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let status = body_error_status(&e);
                tracing::warn!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    error = %e,
                    "Failed to read request body"
                );
                let outcome = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "body_too_large"
                } else {
                    "body_unreadable"
                };
                metrics::record_request(&method, status.as_u16(), outcome, start_time);
                return status.into_response();
            }
        }
    } else {
        Bytes::new()
    };

    let request = StubRequest::new(parts, body);
    let mut writer = InstrumentedWriter::new(BufferedResponse::new());

    let outcome = match dispatch(&state.table, &request, &mut writer) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                request_id = %request.request_id(),
                method = %method,
                path = %path,
                error = %e,
                "Failed to write response"
            );
            metrics::record_request(&method, 500, "write_failed", start_time);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let status = writer.status();
    tracing::info!(
        request_id = %request.request_id(),
        method = %method,
        path = %path,
        status = status.as_u16(),
        bytes = writer.bytes_written(),
        outcome = outcome.as_str(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request handled"
    );
    metrics::record_request(&method, status.as_u16(), outcome.as_str(), start_time);

    writer.into_inner().into_response()
}

/// Whether the endpoint this request resolves to has a predicate that reads
/// the body. Unresolved requests are answered without it.
fn needs_body(table: &RouteTable, parts: &Parts) -> bool {
    table
        .resolve(parts.uri.path(), &parts.method)
        .map(|endpoint| endpoint.predicates().reads_body(&parts.method, &parts.headers))
        .unwrap_or(false)
}

/// Collect at most `limit` bytes of body.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, BoxError>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    let collected = Limited::new(body, limit).collect().await?;
    Ok(collected.to_bytes())
}

fn body_error_status(error: &BoxError) -> StatusCode {
    if error.is::<LengthLimitError>() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use axum::http::header;
    use std::path::Path;
    use tower::ServiceExt;

    const CONFIG: &str = r#"
endpoints:
  - url: /echo
    method: POST
    description: echo check
    cors: "*"
    validation:
      json:
        - { key: ok, value: true }
    response:
      status: 202
      data: ZG9uZQ==
  - url: /upload
    method: POST
    description: accepts anything
    response:
      status: 201
  - url: /login
    method: POST
    validation:
      params:
        - { key: user, value: alice }
    response:
      status: 204
"#;

    fn server(max_body_bytes: usize) -> HttpServer {
        let config = parse_config(CONFIG).unwrap();
        let table = RouteTable::from_config(&config, Path::new("")).unwrap();
        let mut runtime = RuntimeConfig::default();
        runtime.limits.max_body_bytes = max_body_bytes;
        HttpServer::new(table, &runtime)
    }

    async fn send(server: &HttpServer, request: Request<Body>) -> (StatusCode, Response) {
        let response = server.router().oneshot(request).await.unwrap();
        (response.status(), response)
    }

    #[tokio::test]
    async fn test_served_with_cors_and_request_id() {
        let server = server(1024);
        let request = Request::post("/echo").body(Body::from(r#"{"ok":true}"#)).unwrap();

        let (status, response) = send(&server, request).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-allow-method"], "POST");
        assert!(response.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"done");
    }

    #[tokio::test]
    async fn test_client_request_id_is_kept() {
        let server = server(1024);
        let request = Request::get("/nowhere")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let (status, response) = send(&server, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_rejected() {
        let server = server(1024);
        let request = Request::post("/echo").body(Body::from("nope")).unwrap();

        let (status, response) = send(&server, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"Forbidden\n");
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let server = server(4);
        let request = Request::post("/echo").body(Body::from(r#"{"ok":true}"#)).unwrap();

        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_body_to_unknown_route_is_not_found() {
        let server = server(4);
        let request = Request::post("/nowhere").body(Body::from("x".repeat(64))).unwrap();

        let (status, response) = send(&server, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"Not Found\n");

        let request = Request::put("/echo").body(Body::from("x".repeat(64))).unwrap();
        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_ignored_when_no_predicate_reads_it() {
        let server = server(4);
        let request = Request::post("/upload").body(Body::from("x".repeat(64))).unwrap();

        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_form_body_read_only_for_form_requests() {
        let small = server(4);
        let roomy = server(1024);

        let request = Request::post("/login?user=alice")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("x".repeat(64)))
            .unwrap();
        let (status, _) = send(&small, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("user=alice&padding=xxxxxxxx"))
            .unwrap();
        let (status, _) = send(&small, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("user=alice"))
            .unwrap();
        let (status, _) = send(&roomy, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_body_read_errors() {
        let err = read_body(Body::from("too long"), 3).await.unwrap_err();
        assert_eq!(body_error_status(&err), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = read_body(Body::from("fits"), 4).await.unwrap();
        assert_eq!(bytes.as_ref(), b"fits");

        let reset: BoxError = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert_eq!(body_error_status(&reset), StatusCode::BAD_REQUEST);
    }
}
