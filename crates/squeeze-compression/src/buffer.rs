//! Body-capturing response sink

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use squeeze_core::{ResponseWriter, Result};

/// Sink that diverts body bytes into memory
///
/// Status and header calls go straight to the wrapped sink, so whatever the
/// handler declares stays visible there. Body writes never reach the wrapped
/// sink; they are kept until [`into_body`](Self::into_body) hands them over.
/// Dropping the buffer discards anything captured.
#[derive(Debug)]
pub struct ResponseBuffer<'a, W: ResponseWriter + ?Sized> {
    captured: BytesMut,
    inner: &'a mut W,
}

impl<'a, W: ResponseWriter + ?Sized> ResponseBuffer<'a, W> {
    /// Wrap a sink
    pub fn new(inner: &'a mut W) -> Self {
        Self {
            captured: BytesMut::new(),
            inner,
        }
    }

    /// Bytes captured so far
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Number of bytes captured so far
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    /// Release the wrapped sink and return the captured body
    pub fn into_body(self) -> Bytes {
        self.captured.freeze()
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for ResponseBuffer<'_, W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn status(&self) -> StatusCode {
        self.inner.status()
    }

    fn set_status(&mut self, status: StatusCode) {
        self.inner.set_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.captured.extend_from_slice(buf);
        Ok(buf.len())
    }
}
