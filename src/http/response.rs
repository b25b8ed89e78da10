//! Canned responses and rejections.
//!
//! # Responsibilities
//! - Resolve response bodies once at startup (inline base64 or file)
//! - Replay status, headers and body through a [`ResponseWriter`]
//! - Write the standard 403/404 rejections
//!
//! # Design Decisions
//! - Descriptors are immutable after construction and shared across requests
//! - Headers replay in configured order; duplicates are appended
//! - Relative body files resolve against an explicit base directory

use std::io;
use std::path::Path;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::ResponseConfig;
use crate::http::sink::ResponseWriter;
use crate::routing::BuildError;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl ResponseDescriptor {
    /// Build from configuration, reading the body file if one is set.
    pub fn from_config(config: &ResponseConfig, base_dir: &Path) -> Result<Self, BuildError> {
        let status = match config.status {
            0 => StatusCode::OK,
            code => StatusCode::from_u16(code).map_err(|_| BuildError::InvalidStatus(code))?,
        };

        let headers = config
            .headers
            .iter()
            .map(|kv| header_pair(&kv.key, &kv.value_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let body = if !config.file.is_empty() {
            if !config.data.is_empty() {
                tracing::warn!(file = %config.file, "Both data and file set; using file");
            }
            let path = base_dir.join(&config.file);
            let bytes = std::fs::read(&path).map_err(|source| BuildError::BodyFile { path, source })?;
            Bytes::from(bytes)
        } else if !config.data.is_empty() {
            let bytes = STANDARD
                .decode(config.data.trim())
                .map_err(BuildError::InvalidBase64)?;
            Bytes::from(bytes)
        } else {
            Bytes::new()
        };

        Ok(Self { status, headers, body })
    }

    /// Append a header after the configured ones.
    pub fn push_header(&mut self, name: &str, value: &str) -> Result<(), BuildError> {
        self.headers.push(header_pair(name, value)?);
        Ok(())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Write headers, status and body, each exactly once.
    pub fn render<W: ResponseWriter>(&self, writer: &mut W) -> io::Result<()> {
        for (name, value) in &self.headers {
            writer.append_header(name.clone(), value.clone());
        }
        writer.write_status(self.status);
        writer.write_all(&self.body)
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), BuildError> {
    let invalid = || BuildError::InvalidHeader {
        name: name.to_string(),
    };
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((name, value))
}

/// Write a plain-text error whose body is the status reason phrase.
pub fn write_error<W: ResponseWriter>(writer: &mut W, status: StatusCode) -> io::Result<()> {
    let reason = status.canonical_reason().unwrap_or("");
    writer.append_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    writer.append_header(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    writer.write_status(status);
    writer.write_all(format!("{reason}\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyValue;
    use crate::http::sink::BufferedResponse;

    #[test]
    fn test_default_status_and_empty_body() {
        let descriptor = ResponseDescriptor::from_config(&ResponseConfig::default(), Path::new("")).unwrap();
        assert_eq!(descriptor.status(), StatusCode::OK);
        assert!(descriptor.body().is_empty());
        assert!(descriptor.headers().is_empty());
    }

    #[test]
    fn test_inline_data() {
        let config = ResponseConfig {
            data: "eyJvayI6dHJ1ZX0=".into(),
            status: 201,
            ..Default::default()
        };
        let descriptor = ResponseDescriptor::from_config(&config, Path::new("")).unwrap();
        assert_eq!(descriptor.status(), StatusCode::CREATED);
        assert_eq!(descriptor.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_invalid_base64() {
        let config = ResponseConfig {
            data: "%%%".into(),
            ..Default::default()
        };
        let err = ResponseDescriptor::from_config(&config, Path::new("")).unwrap_err();
        assert!(matches!(err, BuildError::InvalidBase64(_)));
    }

    #[test]
    fn test_file_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.txt"), "from file").unwrap();

        let config = ResponseConfig {
            file: "body.txt".into(),
            data: "aWdub3JlZA==".into(),
            ..Default::default()
        };
        let descriptor = ResponseDescriptor::from_config(&config, dir.path()).unwrap();
        assert_eq!(descriptor.body().as_ref(), b"from file");
    }

    #[test]
    fn test_absolute_file_ignores_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abs.txt");
        std::fs::write(&path, "absolute").unwrap();

        let config = ResponseConfig {
            file: path.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let descriptor = ResponseDescriptor::from_config(&config, Path::new("/nonexistent")).unwrap();
        assert_eq!(descriptor.body().as_ref(), b"absolute");
    }

    #[test]
    fn test_missing_file() {
        let config = ResponseConfig {
            file: "missing.json".into(),
            ..Default::default()
        };
        let err = ResponseDescriptor::from_config(&config, Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, BuildError::BodyFile { .. }));
    }

    #[test]
    fn test_render_preserves_header_order() {
        let config = ResponseConfig {
            data: "aGk=".into(),
            status: 202,
            headers: vec![
                KeyValue::new("X-First", "1"),
                KeyValue::new("Set-Cookie", "a=1"),
                KeyValue::new("Set-Cookie", "b=2"),
            ],
            ..Default::default()
        };
        let descriptor = ResponseDescriptor::from_config(&config, Path::new("")).unwrap();

        let mut writer = BufferedResponse::new();
        descriptor.render(&mut writer).unwrap();

        assert_eq!(writer.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.body(), b"hi");
        assert_eq!(writer.headers()["x-first"], "1");
        let cookies: Vec<_> = writer.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_write_error() {
        let mut writer = BufferedResponse::new();
        write_error(&mut writer, StatusCode::FORBIDDEN).unwrap();

        assert_eq!(writer.status(), StatusCode::FORBIDDEN);
        assert_eq!(writer.body(), b"Forbidden\n");
        assert_eq!(writer.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
