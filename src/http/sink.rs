//! Response writers.
//!
//! [`ResponseWriter`] is the seam between the dispatcher and the transport.
//! [`BufferedResponse`] is the axum-side implementation: it collects the
//! writes and turns them into an `axum::response::Response`.
//! [`InstrumentedWriter`] wraps any writer to observe the status and byte
//! count for request logging.

use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Destination for a response: headers, then status, then body.
///
/// Mirrors the usual HTTP writer contract: headers added after the status
/// is written are ignored by the transport, and a body write without a
/// prior status implies 200.
pub trait ResponseWriter {
    /// Append a header. Existing values with the same name are kept.
    fn append_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Write the status line.
    fn write_status(&mut self, status: StatusCode);

    /// Write body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole body")),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}

/// In-memory response assembled from writer calls.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseWriter for BufferedResponse {
    fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.status.is_none() {
            self.headers.append(name, value);
        }
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_some() {
            tracing::warn!(status = %status, "Superfluous status write ignored");
            return;
        }
        self.status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Wraps a writer and records the first status and the bytes written.
///
/// Every call is forwarded unmodified.
#[derive(Debug)]
pub struct InstrumentedWriter<W> {
    inner: W,
    status: Option<StatusCode>,
    written: usize,
}

impl<W: ResponseWriter> InstrumentedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: None,
            written: 0,
        }
    }

    /// Effective status: the first one written, or 200.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Cumulative body bytes accepted by the inner writer.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for InstrumentedWriter<W> {
    fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.inner.append_header(name, value);
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.write_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_status(StatusCode::OK);
        }
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }
}
