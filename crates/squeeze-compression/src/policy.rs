//! Per-instance compression policy

use crate::defaults::DefaultContentTypes;
use crate::matcher::ContentTypeMatcher;
use squeeze_core::{Error, Result};

/// Compression level handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Let the encoder pick its balanced default
    #[default]
    Default,
    /// Explicit level between 1 (fastest) and 9 (smallest)
    Precise(u32),
}

impl CompressionLevel {
    /// Lowest accepted explicit level
    pub const MIN: u32 = 1;
    /// Highest accepted explicit level
    pub const MAX: u32 = 9;

    /// Create an explicit level, rejecting values outside 1..=9
    pub fn new(level: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self::Precise(level))
        } else {
            Err(Error::InvalidLevel(level))
        }
    }

    /// Level as understood by the deflate family of encoders
    pub fn to_flate2(self) -> flate2::Compression {
        match self {
            Self::Default => flate2::Compression::default(),
            Self::Precise(level) => flate2::Compression::new(level),
        }
    }
}

/// Compression level plus the content types eligible for compression
///
/// Each policy owns its own copy of the pattern list; later changes to the
/// defaults it was seeded from do not reach it.
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    level: CompressionLevel,
    content_types: ContentTypeMatcher,
}

impl CompressionPolicy {
    /// Create a policy seeded from the process-wide default content types
    pub fn new(level: CompressionLevel) -> Self {
        Self::with_defaults(level, DefaultContentTypes::global())
    }

    /// Create a policy seeded from an explicit set of default content types
    pub fn with_defaults(level: CompressionLevel, defaults: &DefaultContentTypes) -> Self {
        Self {
            level,
            content_types: defaults.snapshot(),
        }
    }

    /// Configured compression level
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Content types eligible for compression
    pub fn content_types(&self) -> &ContentTypeMatcher {
        &self.content_types
    }

    /// Add content types to this policy only
    ///
    /// Candidates are applied in order; `*/*` clears the list so that every type
    /// is compressed. If any candidate is malformed the policy is left exactly as
    /// it was and the first error is returned.
    pub fn add_content_types(&mut self, candidates: &[&str]) -> Result<()> {
        self.content_types = self.content_types.with_content_types(candidates)?;
        Ok(())
    }

    /// Whether a response with this content type may be compressed
    pub fn is_compressible(&self, content_type: &str) -> bool {
        self.content_types.matches(content_type)
    }
}
