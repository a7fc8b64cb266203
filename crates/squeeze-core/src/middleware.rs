//! Middleware trait and utilities

use crate::response::ResponseWriter;
use crate::{Error, Result};
use bytes::Bytes;
use http::Request;
use http_body_util::Full;
use std::fmt;
use std::sync::Arc;

/// Body type alias
pub type Body = Full<Bytes>;

/// Middleware trait for request/response processing
///
/// Middleware runs synchronously on the host's request thread. It may write to
/// `w` itself, hand `w` (or a wrapper around it) to `next`, or both.
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Process a request
    ///
    /// # Arguments
    ///
    /// * `w` - The response sink for this request
    /// * `req` - The incoming HTTP request
    /// * `next` - The next middleware/handler in the chain
    fn call(&self, w: &mut dyn ResponseWriter, req: &Request<Body>, next: Next) -> Result<()>;
}

/// Type alias for the final handler function
pub type HandlerFn =
    Box<dyn Fn(&mut dyn ResponseWriter, &Request<Body>) -> Result<()> + Send + Sync>;

/// Represents the next middleware/handler in the chain
///
/// `run` consumes the value, so the downstream is invoked at most once.
pub struct Next {
    middleware_stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    final_handler: Option<Arc<HandlerFn>>,
}

impl Next {
    /// Create a new Next from a middleware stack
    pub fn new(middleware_stack: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self {
            middleware_stack,
            index: 0,
            final_handler: None,
        }
    }

    /// Create a new Next with a final handler
    pub fn with_handler(middleware_stack: Arc<[Arc<dyn Middleware>]>, handler: HandlerFn) -> Self {
        Self::with_shared_handler(middleware_stack, Arc::new(handler))
    }

    fn with_shared_handler(
        middleware_stack: Arc<[Arc<dyn Middleware>]>,
        handler: Arc<HandlerFn>,
    ) -> Self {
        Self {
            middleware_stack,
            index: 0,
            final_handler: Some(handler),
        }
    }

    /// Run the next middleware or final handler
    pub fn run(self, w: &mut dyn ResponseWriter, req: &Request<Body>) -> Result<()> {
        if let Some(middleware) = self.middleware_stack.get(self.index) {
            let next = Self {
                middleware_stack: Arc::clone(&self.middleware_stack),
                index: self.index + 1,
                final_handler: self.final_handler.clone(),
            };
            middleware.call(w, req, next)
        } else if let Some(handler) = self.final_handler {
            handler(w, req)
        } else {
            // Reached end of chain without handler
            Err(Error::Internal(
                "Middleware chain completed without handler".to_string(),
            ))
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &(self.middleware_stack.len() - self.index))
            .finish()
    }
}

/// A middleware stack terminated by a handler
pub struct Chain {
    middleware_stack: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<HandlerFn>,
}

impl Chain {
    /// Create a chain from middleware (outermost first) and a final handler
    pub fn new<F>(middleware: Vec<Arc<dyn Middleware>>, handler: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request<Body>) -> Result<()> + Send + Sync + 'static,
    {
        let handler: HandlerFn = Box::new(handler);
        Self {
            middleware_stack: middleware.into(),
            handler: Arc::new(handler),
        }
    }

    /// Serve a single request through the chain
    pub fn serve(&self, w: &mut dyn ResponseWriter, req: &Request<Body>) -> Result<()> {
        Next::with_shared_handler(Arc::clone(&self.middleware_stack), Arc::clone(&self.handler))
            .run(w, req)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.middleware_stack)
            .finish()
    }
}
