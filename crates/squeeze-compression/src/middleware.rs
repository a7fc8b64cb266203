//! Compression middleware implementation

use crate::buffer::ResponseBuffer;
use crate::compressor::{Compressor, Encoding};
use crate::config::{CompressionConfig, MIN_CONTENT_LENGTH};
use crate::defaults::DefaultContentTypes;
use crate::negotiation::{accepts_compression, select_encoding};
use crate::policy::{CompressionLevel, CompressionPolicy};
use bytes::Bytes;
use http::header::{
    HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
    VARY,
};
use http::{HeaderMap, Request};
use squeeze_core::{Body, Middleware, Next, ResponseWriter, Result};
use tracing::{debug, trace, warn};

/// Compression middleware
///
/// Buffers the downstream response and, when the client accepts `gzip` or
/// `deflate`, the body is larger than the minimum length and its content type
/// is admitted by the policy, sends it compressed with the first coding the
/// client listed.
///
/// Every response body passes through memory in full before the first byte is
/// written; there is no streaming path.
#[derive(Debug, Clone)]
pub struct CompressionMiddleware {
    policy: CompressionPolicy,
    min_length: usize,
}

impl CompressionMiddleware {
    /// Create a middleware with the default level, seeded from the process-wide content types
    pub fn new() -> Self {
        Self::from_policy(CompressionPolicy::new(CompressionLevel::Default))
    }

    /// Create a middleware with an explicit level between 1 and 9
    pub fn with_level(level: u32) -> Result<Self> {
        Ok(Self::from_policy(CompressionPolicy::new(
            CompressionLevel::new(level)?,
        )))
    }

    /// Create a middleware seeded from an explicit set of default content types
    pub fn with_defaults(level: CompressionLevel, defaults: &DefaultContentTypes) -> Self {
        Self::from_policy(CompressionPolicy::with_defaults(level, defaults))
    }

    /// Create a middleware around a ready policy
    pub fn from_policy(policy: CompressionPolicy) -> Self {
        Self {
            policy,
            min_length: MIN_CONTENT_LENGTH,
        }
    }

    /// Create a middleware from configuration, seeded from the process-wide content types
    pub fn from_config(config: &CompressionConfig) -> Result<Self> {
        Self::from_config_with_defaults(config, DefaultContentTypes::global())
    }

    /// Create a middleware from configuration and an explicit set of default content types
    pub fn from_config_with_defaults(
        config: &CompressionConfig,
        defaults: &DefaultContentTypes,
    ) -> Result<Self> {
        config.validate()?;

        let mut policy = CompressionPolicy::with_defaults(config.compression_level()?, defaults);
        policy.add_content_types(&config.content_type_refs())?;

        Ok(Self::from_policy(policy).min_length(config.min_length))
    }

    /// Set the size a body must exceed to be compressed
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Add content types to this instance only
    ///
    /// See [`CompressionPolicy::add_content_types`].
    pub fn add_content_type(&mut self, candidates: &[&str]) -> Result<()> {
        self.policy.add_content_types(candidates)
    }

    /// The policy this middleware applies
    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    /// Decide on and write the final body to the real sink
    fn flush(&self, w: &mut dyn ResponseWriter, accept_encoding: &str, body: Bytes) -> Result<()> {
        let content_type = content_type(w.headers());
        let eligible = body.len() > self.min_length
            && is_unset(w.headers(), &CONTENT_ENCODING)
            && self.policy.is_compressible(content_type);

        if !eligible {
            trace!(
                size = body.len(),
                content_type,
                "Response not eligible for compression"
            );
            return w.write_all(&body);
        }

        let Some(encoding) = select_encoding(accept_encoding) else {
            return w.write_all(&body);
        };

        let compressed = Compressor::compress(&body, encoding, self.policy.level());
        write_encoded(w, encoding, &body, compressed)
    }
}

impl Default for CompressionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for CompressionMiddleware {
    fn call(&self, w: &mut dyn ResponseWriter, req: &Request<Body>, next: Next) -> Result<()> {
        // Notify the user agent that we support content compression
        if is_unset(w.headers(), &VARY) {
            w.headers_mut()
                .insert(VARY, HeaderValue::from_static("Accept-Encoding"));
        }

        // Skip compression if content is already encoded
        if !is_unset(w.headers(), &CONTENT_ENCODING) {
            return next.run(w, req);
        }

        let accept_encoding = req
            .headers()
            .get(ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .filter(|v| accepts_compression(v));

        let Some(accept_encoding) = accept_encoding else {
            return next.run(w, req);
        };

        let mut buffer = ResponseBuffer::new(&mut *w);
        let outcome = next.run(&mut buffer, req);
        let body = buffer.into_body();

        if let Err(ref e) = outcome {
            debug!(error = %e, "Downstream handler failed, flushing captured body");
        }

        self.flush(w, accept_encoding, body)?;
        outcome
    }
}

/// A header that is missing or empty counts as unset
fn is_unset(headers: &HeaderMap, name: &HeaderName) -> bool {
    headers.get(name).map_or(true, |v| v.is_empty())
}

/// Raw Content-Type value, or "" when absent
fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Write the compressed body with its headers, or `body` verbatim if compression failed
fn write_encoded(
    w: &mut dyn ResponseWriter,
    encoding: Encoding,
    body: &[u8],
    compressed: Result<Bytes>,
) -> Result<()> {
    match compressed {
        Ok(compressed) => {
            debug!(
                encoding = encoding.as_str(),
                original_size = body.len(),
                compressed_size = compressed.len(),
                "Response compressed successfully"
            );

            let headers = w.headers_mut();
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding.as_str()));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(compressed.len()));

            w.write_all(&compressed)
        }
        Err(e) => {
            warn!(error = %e, "Failed to compress response, returning uncompressed");
            w.write_all(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use squeeze_core::{Chain, Error, ResponseRecorder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request(accept_encoding: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("http://localhost/foo");
        if let Some(accept) = accept_encoding {
            builder = builder.header(ACCEPT_ENCODING, accept);
        }
        builder.body(Body::default()).unwrap()
    }

    fn stack(middleware: CompressionMiddleware) -> Vec<Arc<dyn Middleware>> {
        let middleware: Arc<dyn Middleware> = Arc::new(middleware);
        vec![middleware]
    }

    fn handler_chain(
        middleware: CompressionMiddleware,
        content_type: &'static str,
        body: String,
    ) -> Chain {
        Chain::new(stack(middleware), move |w, _req| {
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            w.write_all(body.as_bytes())
        })
    }

    fn local_middleware() -> CompressionMiddleware {
        CompressionMiddleware::with_defaults(CompressionLevel::Default, &DefaultContentTypes::new())
    }

    #[test]
    fn test_new_uses_default_level() {
        let middleware = CompressionMiddleware::new();
        assert_eq!(middleware.policy().level(), CompressionLevel::Default);
        assert_eq!(middleware.min_length, MIN_CONTENT_LENGTH);
    }

    #[test]
    fn test_with_level() {
        let middleware = CompressionMiddleware::with_level(1).unwrap();
        assert_eq!(middleware.policy().level(), CompressionLevel::Precise(1));
        assert!(matches!(
            CompressionMiddleware::with_level(0),
            Err(Error::InvalidLevel(0))
        ));
    }

    #[test]
    fn test_vary_set_when_unset() {
        let chain = handler_chain(local_middleware(), "text/plain", "small".to_string());

        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(None)).unwrap();
        assert_eq!(w.headers()[VARY], "Accept-Encoding");

        let mut w = ResponseRecorder::new();
        w.headers_mut().insert(VARY, HeaderValue::from_static(""));
        chain.serve(&mut w, &request(None)).unwrap();
        assert_eq!(w.headers()[VARY], "Accept-Encoding");
    }

    #[test]
    fn test_vary_not_overwritten() {
        let chain = handler_chain(local_middleware(), "text/plain", "small".to_string());

        let mut w = ResponseRecorder::new();
        w.headers_mut().insert(VARY, HeaderValue::from_static("test"));
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert_eq!(w.headers()[VARY], "test");
    }

    #[test]
    fn test_no_accept_encoding() {
        let body = ".".repeat(4096);
        let chain = handler_chain(local_middleware(), "text/plain", body.clone());

        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(None)).unwrap();
        assert!(!w.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(w.body(), body.as_bytes());
    }

    #[test]
    fn test_handler_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let chain = Chain::new(stack(local_middleware()), move |w, _req| {
            counter.fetch_add(1, Ordering::SeqCst);
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
            w.write_all(&[b'x'; 3000])
        });

        for accept in [None, Some("gzip"), Some("unknown")] {
            let mut w = ResponseRecorder::new();
            chain.serve(&mut w, &request(accept)).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_handler_set_content_encoding_is_respected() {
        let chain = Chain::new(stack(local_middleware()), |w, _req| {
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            w.headers_mut()
                .insert(CONTENT_ENCODING, HeaderValue::from_static("br"));
            w.write_all(&[7u8; 4096])
        });

        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "br");
        assert_eq!(w.body(), &[7u8; 4096][..]);
    }

    #[test]
    fn test_handler_error_still_flushes() {
        let chain = Chain::new(stack(local_middleware()), |w, _req| {
            w.set_status(StatusCode::BAD_GATEWAY);
            w.write_all(b"partial")?;
            Err(Error::Handler("upstream went away".to_string()))
        });

        let mut w = ResponseRecorder::new();
        let err = chain.serve(&mut w, &request(Some("gzip"))).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(w.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(w.body(), b"partial");
    }

    #[test]
    fn test_content_type_tested_with_parameters() {
        let chain = handler_chain(
            local_middleware(),
            "text/html; charset=utf-8",
            "<p>".repeat(1000),
        );

        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "gzip");

        // An exact pattern does not cover the parameterised header value
        let mut json_only = local_middleware();
        json_only
            .add_content_type(&["*/*", "application/json"])
            .unwrap();
        let body = "x".repeat(4096);

        let chain = handler_chain(
            json_only.clone(),
            "application/json; charset=utf-8",
            body.clone(),
        );
        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert!(!w.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(w.body(), body.as_bytes());

        let chain = handler_chain(json_only, "application/json", body);
        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "gzip");
    }

    #[test]
    fn test_min_length_is_exclusive() {
        let middleware = local_middleware().min_length(100);
        let chain = handler_chain(middleware.clone(), "text/plain", "a".repeat(100));
        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert!(!w.headers().contains_key(CONTENT_ENCODING));

        let chain = handler_chain(middleware, "text/plain", "a".repeat(101));
        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &request(Some("gzip"))).unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "gzip");
    }

    #[test]
    fn test_missing_content_type() {
        let mut middleware = local_middleware();
        let no_type = |middleware: CompressionMiddleware| {
            Chain::new(stack(middleware), |w, _req| w.write_all(&[b'a'; 4096]))
        };

        let mut w = ResponseRecorder::new();
        no_type(middleware.clone())
            .serve(&mut w, &request(Some("gzip")))
            .unwrap();
        assert!(!w.headers().contains_key(CONTENT_ENCODING));

        // An empty list admits responses without any content type
        middleware.add_content_type(&["*/*"]).unwrap();
        let mut w = ResponseRecorder::new();
        no_type(middleware)
            .serve(&mut w, &request(Some("gzip")))
            .unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "gzip");
    }

    #[test]
    fn test_from_config() {
        let defaults = DefaultContentTypes::new();
        let config = CompressionConfig {
            level: Some(9),
            min_length: 10,
            content_types: vec!["application/json".to_string()],
        };

        let middleware = CompressionMiddleware::from_config_with_defaults(&config, &defaults).unwrap();
        assert_eq!(middleware.policy().level(), CompressionLevel::Precise(9));
        assert_eq!(middleware.min_length, 10);
        assert!(middleware.policy().is_compressible("application/json"));
        assert!(middleware.policy().is_compressible("text/css"));

        let bad = CompressionConfig {
            content_types: vec!["json".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            CompressionMiddleware::from_config_with_defaults(&bad, &defaults),
            Err(Error::BadContentTypeFormat(_))
        ));
    }

    #[test]
    fn test_content_type_is_raw_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_type(&headers), "");

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain ; charset=utf-8"),
        );
        assert_eq!(content_type(&headers), "text/plain ; charset=utf-8");
    }

    #[test]
    fn test_compression_failure_falls_back_to_plain_body() {
        let mut w = ResponseRecorder::new();
        let failure = Error::compression(
            "gzip",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "encoder closed"),
        );

        write_encoded(&mut w, Encoding::Gzip, b"plain body", Err(failure)).unwrap();
        assert!(!w.headers().contains_key(CONTENT_ENCODING));
        assert!(!w.headers().contains_key(CONTENT_LENGTH));
        assert_eq!(w.body(), b"plain body");
    }

    #[test]
    fn test_write_encoded_sets_headers() {
        let mut w = ResponseRecorder::new();
        let compressed = Bytes::from_static(&[1, 2, 3]);

        write_encoded(&mut w, Encoding::Deflate, b"original", Ok(compressed)).unwrap();
        assert_eq!(w.headers()[CONTENT_ENCODING], "deflate");
        assert_eq!(w.headers()[CONTENT_LENGTH], "3");
        assert_eq!(w.body(), &[1u8, 2, 3][..]);
    }
}
