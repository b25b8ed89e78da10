//! Request predicates.
//!
//! # Responsibilities
//! - Match a request header against an expected value
//! - Match a query/form parameter against an expected value
//! - Match a value inside a JSON body, addressed by a dot-separated path
//! - Combine predicates with short-circuiting AND semantics
//!
//! # Design Decisions
//! - Closed set of predicate kinds, dispatched through one `evaluate`
//! - Evaluation is total: anything that cannot be evaluated is a non-match
//! - Expected values prefixed with `/r/` are regular expressions, compiled
//!   once; a pattern that fails to compile never matches
//! - Empty chain = always matches

use std::fmt;

use axum::http::{HeaderMap, Method};
use regex::Regex;
use serde_json::Value;

use crate::config::{KeyValue, ValidationConfig};
use crate::http::request::{is_form_body, StubRequest};

/// Prefix marking an expected value as a regular expression.
pub const REGEX_PREFIX: &str = "/r/";

/// Compares `actual` against an expected value.
///
/// Without the `/r/` prefix this is exact string equality. With it, the rest
/// of `expected` is a regular expression that must match somewhere in
/// `actual`; malformed patterns never match.
pub fn compare(actual: &str, expected: &str) -> bool {
    ValueMatcher::new(expected).matches(actual)
}

/// Precompiled form of an expected string value.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    Exact(String),
    /// `None` when the pattern failed to compile.
    Pattern { source: String, regex: Option<Regex> },
}

impl ValueMatcher {
    pub fn new(expected: &str) -> Self {
        match expected.strip_prefix(REGEX_PREFIX) {
            Some(pattern) => {
                let regex = match Regex::new(pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::warn!(pattern = %pattern, error = %e, "Invalid pattern will never match");
                        None
                    }
                };
                ValueMatcher::Pattern {
                    source: expected.to_string(),
                    regex,
                }
            }
            None => ValueMatcher::Exact(expected.to_string()),
        }
    }

    pub fn matches(&self, actual: &str) -> bool {
        match self {
            ValueMatcher::Exact(expected) => actual == expected,
            ValueMatcher::Pattern { regex, .. } => regex.as_ref().is_some_and(|r| r.is_match(actual)),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            ValueMatcher::Exact(s) => s,
            ValueMatcher::Pattern { source, .. } => source,
        }
    }
}

/// One segment of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Index(usize),
    Field(String),
}

/// Dot-separated path into a JSON document, e.g. `user.titles.1`.
///
/// All-digit segments index arrays; anything else names an object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('.')
            .map(|segment| {
                if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                    // Indexes too large for usize are simply out of range.
                    Segment::Index(segment.parse().unwrap_or(usize::MAX))
                } else {
                    Segment::Field(segment.to_string())
                }
            })
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk the path, returning None when a segment cannot be followed.
    pub fn locate<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |current, segment| match segment {
            Segment::Index(i) => current.as_array()?.get(*i),
            Segment::Field(name) => current.as_object()?.get(name),
        })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Deep equality where every number compares as `f64`.
pub fn json_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equals(x, y)))
        }
        _ => false,
    }
}

/// A single pass/fail test against a request.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// First value of a request header.
    Header { name: String, expected: ValueMatcher },
    /// First query or form value.
    Param { name: String, expected: ValueMatcher },
    /// Value inside the JSON body.
    JsonPath { path: JsonPath, expected: Value },
}

impl Predicate {
    pub fn header(kv: &KeyValue) -> Self {
        Predicate::Header {
            name: kv.key.clone(),
            expected: ValueMatcher::new(&kv.value_str()),
        }
    }

    pub fn param(kv: &KeyValue) -> Self {
        Predicate::Param {
            name: kv.key.clone(),
            expected: ValueMatcher::new(&kv.value_str()),
        }
    }

    pub fn json(kv: &KeyValue) -> Self {
        Predicate::JsonPath {
            path: JsonPath::parse(&kv.key),
            expected: kv.value.clone(),
        }
    }

    /// Returns true if the request satisfies this predicate.
    pub fn evaluate(&self, req: &StubRequest) -> bool {
        match self {
            Predicate::Header { name, expected } => expected.matches(&req.header_value(name)),
            Predicate::Param { name, expected } => expected.matches(&req.form_value(name)),
            Predicate::JsonPath { path, expected } => req
                .json_body()
                .and_then(|body| path.locate(body))
                .is_some_and(|actual| json_equals(actual, expected)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Header { name, expected } => write!(f, "header {name} == {:?}", expected.as_str()),
            Predicate::Param { name, expected } => write!(f, "param {name} == {:?}", expected.as_str()),
            Predicate::JsonPath { path, expected } => write!(f, "json {path} == {expected}"),
        }
    }
}

/// Ordered AND of predicates.
#[derive(Debug, Clone, Default)]
pub struct PredicateChain {
    predicates: Vec<Predicate>,
}

impl PredicateChain {
    /// Headers first, then params, then JSON paths.
    pub fn from_config(config: &ValidationConfig) -> Self {
        let predicates = config
            .headers
            .iter()
            .map(Predicate::header)
            .chain(config.params.iter().map(Predicate::param))
            .chain(config.json.iter().map(Predicate::json))
            .collect();
        Self { predicates }
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns true if evaluating the chain needs the request body.
    ///
    /// JSON predicates always read it. Param predicates read it only for a
    /// urlencoded POST, PUT or PATCH.
    pub fn reads_body(&self, method: &Method, headers: &HeaderMap) -> bool {
        self.predicates.iter().any(|predicate| match predicate {
            Predicate::Header { .. } => false,
            Predicate::Param { .. } => is_form_body(method, headers),
            Predicate::JsonPath { .. } => true,
        })
    }

    /// The first predicate the request fails, if any.
    pub fn first_failure(&self, req: &StubRequest) -> Option<&Predicate> {
        self.predicates.iter().find(|p| !p.evaluate(req))
    }

    /// Returns true if every predicate passes.
    pub fn evaluate(&self, req: &StubRequest) -> bool {
        self.first_failure(req).is_none()
    }
}
