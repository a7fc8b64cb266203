//! Response compression middleware for Squeeze
//!
//! Negotiates a content coding per request and compresses buffered response
//! bodies:
//! - gzip and deflate, picked in the order the client lists them
//! - Content-type admission list, compiled into a single matcher
//! - Minimum size threshold
//! - `Vary: Accept-Encoding` announcement
//! - Already-encoded responses pass through untouched
//!
//! ```no_run
//! use squeeze_compression::CompressionMiddleware;
//!
//! let mut compression = CompressionMiddleware::with_level(9)?;
//! compression.add_content_type(&["application/pdf", "image/*"])?;
//!
//! // Every middleware built from now on also compresses JSON
//! squeeze_compression::add_content_type(&["application/json"])?;
//! # Ok::<(), squeeze_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod buffer;
pub mod compressor;
pub mod config;
pub mod defaults;
pub mod matcher;
pub mod middleware;
pub mod negotiation;
pub mod policy;

pub use buffer::ResponseBuffer;
pub use compressor::{Compressor, Encoding};
pub use config::{CompressionConfig, MIN_CONTENT_LENGTH};
pub use defaults::{add_content_type, DefaultContentTypes, DEFAULT_CONTENT_TYPES};
pub use matcher::{ContentTypeMatcher, MATCH_ALL};
pub use middleware::CompressionMiddleware;
pub use negotiation::{accepts_compression, select_encoding};
pub use policy::{CompressionLevel, CompressionPolicy};
