//! Configuration schema definitions.
//!
//! Two kinds of configuration live here:
//! - [`StubConfig`], the YAML document describing endpoints (read from disk).
//! - [`RuntimeConfig`], server tuning supplied on the command line.
//!
//! All file types derive Serde traits and default every field so that
//! minimal documents are accepted.

use serde::Deserialize;
use serde_json::Value;

/// Root of the stub configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StubConfig {
    /// Port to listen on. 0 lets the OS pick one.
    pub port: u16,

    /// Host to bind. Empty means all interfaces.
    pub host: String,

    /// Display title, logged at startup.
    pub title: String,

    /// Endpoint definitions, in file order.
    pub endpoints: Vec<EndpointConfig>,
}

impl StubConfig {
    /// Host to bind, substituting the wildcard address for an empty host.
    pub fn bind_host(&self) -> &str {
        if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        }
    }
}

/// One endpoint: a (url, method) pair with its validation and response.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EndpointConfig {
    /// Exact request path.
    pub url: String,

    /// Free text used in logs.
    pub description: String,

    /// HTTP method. Empty means GET.
    pub method: String,

    /// Request predicates.
    pub validation: ValidationConfig,

    /// Canned response.
    pub response: ResponseConfig,

    /// Allowed CORS origin. Empty disables CORS headers.
    pub cors: String,
}

impl EndpointConfig {
    /// Method name normalized to uppercase, defaulting to GET.
    pub fn normalized_method(&self) -> String {
        let method = self.method.trim();
        if method.is_empty() {
            "GET".to_string()
        } else {
            method.to_ascii_uppercase()
        }
    }
}

/// Predicates grouped by the request attribute they inspect.
///
/// Evaluation order is headers, then params, then JSON.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    pub headers: Vec<KeyValue>,
    pub params: Vec<KeyValue>,
    pub json: Vec<KeyValue>,
}

impl ValidationConfig {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.params.is_empty() && self.json.is_empty()
    }
}

/// Response configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ResponseConfig {
    /// Base64 encoded inline body.
    pub data: String,

    /// Body file, relative to the configuration file's directory unless absolute.
    pub file: String,

    /// Status code. 0 means 200.
    pub status: u16,

    /// Response headers, replayed in order.
    pub headers: Vec<KeyValue>,
}

/// A key with a scalar (or structured) value.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// String form of the value, used for header and param comparisons.
    ///
    /// Strings are taken verbatim, null becomes the empty string, and
    /// everything else uses its JSON rendering. Floats drop a zero
    /// fraction, so `1.0` reads as `1`.
    pub fn value_str(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

/// Server tuning that does not belong in the stub file.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub timeouts: TimeoutConfig,
    pub limits: LimitsConfig,
    pub observability: ObservabilityConfig,
}

/// Timeout configuration.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum buffered request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive).
    pub log_level: String,

    /// Prometheus endpoint bind address. None disables the exporter.
    pub metrics_address: Option<std::net::SocketAddr>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
