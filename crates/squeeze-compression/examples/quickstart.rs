//! Quickstart: wire the compression middleware in front of a handler
//!
//! Run with: RUST_LOG=squeeze_compression=debug cargo run --example quickstart

use http::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use http::Request;
use squeeze_compression::{add_content_type, CompressionMiddleware};
use squeeze_core::{Body, Chain, Middleware, ResponseRecorder, ResponseWriter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    // Every middleware built from here on also compresses JSON
    add_content_type(&["application/json"])?;

    let mut compression = CompressionMiddleware::with_level(9)?;
    compression.add_content_type(&["application/pdf", "image/*"])?;

    let middleware: Arc<dyn Middleware> = Arc::new(compression);
    let chain = Chain::new(vec![middleware], |w, _req| {
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let mut body =
            String::from("Large enough compressible content will be encoded based on client support.");
        body.push_str(&".".repeat(2049));
        w.write_all(body.as_bytes())
    });

    for accept in ["gzip", "deflate, gzip", "br"] {
        let req = Request::builder()
            .uri("http://localhost:3000/")
            .header(ACCEPT_ENCODING, accept)
            .body(Body::default())?;

        let mut w = ResponseRecorder::new();
        chain.serve(&mut w, &req)?;

        let response = w.into_response()?;
        tracing::info!(
            accept_encoding = accept,
            content_encoding = ?response.headers().get(CONTENT_ENCODING),
            content_length = ?response.headers().get(CONTENT_LENGTH),
            "Served response"
        );
    }

    Ok(())
}
