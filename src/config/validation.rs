//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every endpoint has a usable path and method
//! - Validate value ranges (status codes) and header syntax
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StubConfig → Result<(), Vec<ValidationError>>
//! - Runs before the route table is built
//! - Predicate values are not checked: a malformed `/r/` pattern fails
//!   closed at request time instead of aborting startup

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::config::schema::{EndpointConfig, StubConfig};

/// A semantic problem with one endpoint entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint #{index}: url is required")]
    MissingUrl { index: usize },

    #[error("endpoint #{index}: url {url:?} must start with '/'")]
    RelativeUrl { index: usize, url: String },

    #[error("endpoint #{index} ({url}): invalid method {method:?}")]
    InvalidMethod {
        index: usize,
        url: String,
        method: String,
    },

    #[error("endpoint #{index} ({url}): invalid status code {status}")]
    InvalidStatus { index: usize, url: String, status: u16 },

    #[error("endpoint #{index} ({url}): invalid response header {name:?}")]
    InvalidHeader {
        index: usize,
        url: String,
        name: String,
    },

    #[error("endpoint #{index} ({url}): invalid cors origin {origin:?}")]
    InvalidCors {
        index: usize,
        url: String,
        origin: String,
    },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &StubConfig) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = config
        .endpoints
        .iter()
        .enumerate()
        .flat_map(|(index, endpoint)| validate_endpoint(index, endpoint))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(index: usize, endpoint: &EndpointConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let url = endpoint.url.clone();

    if url.is_empty() {
        errors.push(ValidationError::MissingUrl { index });
    } else if !url.starts_with('/') {
        errors.push(ValidationError::RelativeUrl {
            index,
            url: url.clone(),
        });
    }

    let method = endpoint.normalized_method();
    if Method::from_bytes(method.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidMethod {
            index,
            url: url.clone(),
            method,
        });
    }

    let status = endpoint.response.status;
    if status != 0 && StatusCode::from_u16(status).is_err() {
        errors.push(ValidationError::InvalidStatus {
            index,
            url: url.clone(),
            status,
        });
    }

    for header in &endpoint.response.headers {
        let name_ok = HeaderName::from_bytes(header.key.as_bytes()).is_ok();
        let value_ok = HeaderValue::from_str(&header.value_str()).is_ok();
        if !name_ok || !value_ok {
            errors.push(ValidationError::InvalidHeader {
                index,
                url: url.clone(),
                name: header.key.clone(),
            });
        }
    }

    if !endpoint.cors.is_empty() && HeaderValue::from_str(&endpoint.cors).is_err() {
        errors.push(ValidationError::InvalidCors {
            index,
            url,
            origin: endpoint.cors.clone(),
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{KeyValue, ResponseConfig};

    fn endpoint(url: &str) -> EndpointConfig {
        EndpointConfig {
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = StubConfig {
            endpoints: vec![endpoint("/a"), endpoint("/b")],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&StubConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad_method = endpoint("/m");
        bad_method.method = "GE T".into();

        let mut bad_status = endpoint("/s");
        bad_status.response = ResponseConfig {
            status: 42,
            ..Default::default()
        };

        let mut bad_header = endpoint("/h");
        bad_header.response.headers = vec![KeyValue::new("bad header", "x")];

        let config = StubConfig {
            endpoints: vec![endpoint(""), endpoint("relative"), bad_method, bad_status, bad_header],
            ..Default::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], ValidationError::MissingUrl { index: 0 });
        assert!(matches!(errors[1], ValidationError::RelativeUrl { index: 1, .. }));
        assert!(matches!(errors[2], ValidationError::InvalidMethod { index: 2, .. }));
        assert!(matches!(errors[3], ValidationError::InvalidStatus { status: 42, .. }));
        assert!(matches!(errors[4], ValidationError::InvalidHeader { index: 4, .. }));
    }

    #[test]
    fn test_custom_method_allowed() {
        let mut e = endpoint("/purge");
        e.method = "purge".into();
        let config = StubConfig {
            endpoints: vec![e],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
