//! # Squeeze Core
//!
//! Core types, traits, and error handling for Squeeze response compression.
//!
//! This crate provides the host-facing abstractions the compression pipeline is
//! written against:
//! - Response sink trait and an in-memory recorder
//! - Synchronous middleware chain
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod middleware;
pub mod response;

pub use error::{Error, Result};
pub use middleware::{Body, Chain, HandlerFn, Middleware, Next};
pub use response::{ResponseRecorder, ResponseWriter};

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{Body, Chain, Middleware, Next};
    pub use crate::response::{ResponseRecorder, ResponseWriter};
}
