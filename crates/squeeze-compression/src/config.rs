//! Configuration for compression middleware

use crate::policy::CompressionLevel;
use serde::{Deserialize, Serialize};
use squeeze_core::{Error, Result};

/// Minimum response size to compress (in bytes); bodies must be strictly larger
pub const MIN_CONTENT_LENGTH: usize = 2048;

/// Compression configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Compression level (1-9), or the encoder default when unset
    #[serde(default)]
    pub level: Option<u32>,

    /// Responses must be larger than this to be compressed (in bytes)
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Content types added on top of the process-wide defaults, in order.
    /// `*/*` clears everything before it.
    #[serde(default)]
    pub content_types: Vec<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: None,
            min_length: MIN_CONTENT_LENGTH,
            content_types: Vec::new(),
        }
    }
}

fn default_min_length() -> usize {
    MIN_CONTENT_LENGTH
}

impl CompressionConfig {
    /// Resolve the configured level
    pub fn compression_level(&self) -> Result<CompressionLevel> {
        match self.level {
            None => Ok(CompressionLevel::Default),
            Some(level) => CompressionLevel::new(level),
        }
    }

    /// Check the configuration without building anything
    pub fn validate(&self) -> Result<()> {
        self.compression_level()?;

        if self.content_types.iter().any(|ct| ct.trim().is_empty()) {
            return Err(Error::Config(
                "content_types cannot contain empty entries".to_string(),
            ));
        }

        if self.min_length == 0 {
            tracing::warn!("min_length is 0, every non-empty response will be compressed");
        }

        Ok(())
    }

    /// Content types as string slices
    pub fn content_type_refs(&self) -> Vec<&str> {
        self.content_types.iter().map(String::as_str).collect()
    }
}
