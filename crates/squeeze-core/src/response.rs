//! Response sink trait and an in-memory recorder

use crate::middleware::Body;
use crate::Result;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

/// Sink a handler writes its response into
///
/// Headers and status may be changed at any point before the host commits the
/// response; body bytes are appended in call order.
pub trait ResponseWriter {
    /// Response headers
    fn headers(&self) -> &HeaderMap;

    /// Mutable response headers
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Current status code
    fn status(&self) -> StatusCode;

    /// Set the status code
    fn set_status(&mut self, status: StatusCode);

    /// Write body bytes, returning how many were accepted
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Write the whole buffer
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            if n == 0 {
                return Err(crate::Error::Io(std::io::ErrorKind::WriteZero.into()));
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

/// Response sink that records everything in memory
///
/// Used as the real sink when the chain is driven outside of a server, and by
/// hosts that want an [`http::Response`] out of a handler run.
#[derive(Debug, Clone)]
pub struct ResponseRecorder {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseRecorder {
    /// Create an empty `200 OK` recorder
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Body written so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Drop the recorded body, keeping status and headers
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Build the final response
    pub fn into_response(self) -> Result<Response<Body>> {
        let mut response = Response::builder().status(self.status);

        if let Some(headers) = response.headers_mut() {
            *headers = self.headers;
        }

        Ok(response.body(Full::new(self.body.freeze()))?)
    }

    /// Take the recorded body
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}
