//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Buffer the request body so predicates can read it repeatedly
//! - Expose the attributes predicates inspect (headers, form values, JSON)
//!
//! # Design Decisions
//! - The body is an immutable `Bytes` buffer; reading it never consumes it
//! - Form values and the decoded JSON body are parsed lazily, at most once
//! - Request ID added as early as possible for tracing

use std::cell::OnceCell;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::form_urlencoded;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// An incoming request with its body buffered (or empty when unread).
#[derive(Debug)]
pub struct StubRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    form: OnceCell<Vec<(String, String)>>,
    json: OnceCell<Option<Value>>,
}

impl StubRequest {
    /// Build from request parts and an already collected body.
    ///
    /// An empty body is passed when no predicate of the resolved endpoint
    /// reads it.
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            form: OnceCell::new(),
            json: OnceCell::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The buffered body. Every call returns the same bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Request ID assigned by the request-id layer, if any.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    /// First value of the named header, or the empty string.
    ///
    /// Names are case-insensitive; names that are not valid header names
    /// behave as absent.
    pub fn header_value(&self, name: &str) -> String {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    /// First form value for `key`, or the empty string.
    ///
    /// Urlencoded bodies of POST, PUT and PATCH requests take precedence over
    /// the query string.
    pub fn form_value(&self, key: &str) -> String {
        self.form()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    /// The body decoded as JSON, or None if it is not valid JSON.
    pub fn json_body(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| serde_json::from_slice(&self.body).ok())
            .as_ref()
    }

    fn form(&self) -> &[(String, String)] {
        self.form.get_or_init(|| {
            let mut pairs = Vec::new();
            if is_form_body(&self.method, &self.headers) {
                pairs.extend(form_urlencoded::parse(&self.body).into_owned());
            }
            if let Some(query) = self.uri.query() {
                pairs.extend(form_urlencoded::parse(query.as_bytes()).into_owned());
            }
            pairs
        })
    }
}

/// True for a urlencoded POST, PUT or PATCH, whose body carries form values.
pub(crate) fn is_form_body(method: &Method, headers: &HeaderMap) -> bool {
    if *method != Method::POST && *method != Method::PUT && *method != Method::PATCH {
        return false;
    }

    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}
