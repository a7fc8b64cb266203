//! Error types for Squeeze

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Squeeze
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A content-type pattern does not follow the `type/subtype` grammar
    #[error("Syntax error in content type: {0}")]
    BadContentTypeFormat(String),

    /// The assembled content-type matcher failed to compile
    #[error("Failed to compile content type matcher: {0}")]
    Compile(#[from] regex::Error),

    /// Compression level outside of 1..=9
    #[error("Invalid compression level {0} (must be between 1 and 9)")]
    InvalidLevel(u32),

    /// The encoder failed while producing a compressed body
    #[error("Compression failed for '{encoding}': {source}")]
    CompressionFailure {
        /// Content-Encoding token being produced
        encoding: &'static str,
        /// Underlying encoder error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Downstream handler error
    #[error("Handler error: {0}")]
    Handler(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a compression failure for the given encoding
    pub fn compression(encoding: &'static str, source: std::io::Error) -> Self {
        Error::CompressionFailure { encoding, source }
    }
}
