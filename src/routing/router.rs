//! Route lookup.
//!
//! # Responsibilities
//! - Compile endpoint configuration into routes
//! - Look up the endpoint for a (path, method) pair
//! - Return the endpoint or an explicit, reasoned not-found
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) path lookup via HashMap, exact match, no normalization
//! - A later entry for the same (path, method) replaces the earlier one

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use axum::http::Method;
use thiserror::Error;

use crate::config::{EndpointConfig, StubConfig};
use crate::http::response::ResponseDescriptor;
use crate::http::sink::ResponseWriter;
use crate::routing::matcher::PredicateChain;

/// Error type for route table construction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read response file {path}: {source}")]
    BodyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid base64 response data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    #[error("endpoint {url}: {source}")]
    Endpoint {
        url: String,
        #[source]
        source: Box<BuildError>,
    },
}

/// Why a request did not resolve to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// No route for the path.
    Route,
    /// The route exists but has no endpoint for the method.
    Method,
}

impl NotFound {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFound::Route => "route",
            NotFound::Method => "method",
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One method-specific response and predicate chain.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    description: String,
    response: ResponseDescriptor,
    predicates: PredicateChain,
}

impl Endpoint {
    /// Build from configuration, resolving body files against `base_dir`.
    pub fn from_config(config: &EndpointConfig, base_dir: &Path) -> Result<Self, BuildError> {
        let method_name = config.normalized_method();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| BuildError::InvalidMethod(method_name.clone()))?;

        let mut response = ResponseDescriptor::from_config(&config.response, base_dir)?;
        if !config.cors.is_empty() {
            response.push_header("Access-Control-Allow-Origin", &config.cors)?;
            response.push_header("Access-Control-Allow-Method", method.as_str())?;
        }

        Ok(Self {
            method,
            description: config.description.clone(),
            response,
            predicates: PredicateChain::from_config(&config.validation),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn response(&self) -> &ResponseDescriptor {
        &self.response
    }

    pub fn predicates(&self) -> &PredicateChain {
        &self.predicates
    }

    /// Render the canned response and log the description.
    pub fn write_response<W: ResponseWriter>(&self, writer: &mut W) -> io::Result<()> {
        self.response.render(writer)?;
        tracing::info!(description = %self.description, "Endpoint matched");
        Ok(())
    }
}

/// All endpoints registered under one path.
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    endpoints: HashMap<Method, Endpoint>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            endpoints: HashMap::new(),
        }
    }

    /// Add an endpoint, replacing any existing one for the same method.
    pub fn add_endpoint(&mut self, endpoint: Endpoint) {
        if let Some(previous) = self.endpoints.insert(endpoint.method.clone(), endpoint) {
            tracing::warn!(
                path = %self.path,
                method = %previous.method,
                "Duplicate endpoint overrides earlier definition"
            );
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint(&self, method: &Method) -> Option<&Endpoint> {
        self.endpoints.get(method)
    }

    /// Methods served by this route, sorted.
    pub fn methods(&self) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self.endpoints.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

/// Path → route mapping, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    title: String,
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            routes: HashMap::new(),
        }
    }

    /// Build from configuration, in endpoint order.
    pub fn from_config(config: &StubConfig, base_dir: &Path) -> Result<Self, BuildError> {
        let mut table = Self::new(config.title.clone());
        for entry in &config.endpoints {
            let endpoint = Endpoint::from_config(entry, base_dir).map_err(|e| BuildError::Endpoint {
                url: entry.url.clone(),
                source: Box::new(e),
            })?;
            table.insert(entry.url.clone(), endpoint);
        }
        Ok(table)
    }

    pub fn insert(&mut self, path: String, endpoint: Endpoint) {
        self.routes
            .entry(path)
            .or_insert_with_key(|path| Route::new(path.clone()))
            .add_endpoint(endpoint);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of routes (distinct paths).
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Look up the endpoint for an exact path and method.
    pub fn resolve(&self, path: &str, method: &Method) -> Result<&Endpoint, NotFound> {
        let route = self.routes.get(path).ok_or(NotFound::Route)?;
        route.endpoint(method).ok_or(NotFound::Method)
    }

    /// Every path with its methods, sorted for stable output.
    pub fn listing(&self) -> Vec<(&str, Vec<&str>)> {
        let mut listing: Vec<(&str, Vec<&str>)> = self
            .routes
            .values()
            .map(|route| {
                let methods = route.methods().into_iter().map(Method::as_str).collect();
                (route.path(), methods)
            })
            .collect();
        listing.sort_by(|a, b| a.0.cmp(b.0));
        listing
    }
}
