//! Process-wide default content types

use crate::matcher::{translate, ContentTypeMatcher};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use squeeze_core::Result;

/// Content types compressed out of the box
pub const DEFAULT_CONTENT_TYPES: [&str; 3] =
    ["text/*", "application/x-javascript", "application/xhtml+xml"];

/// Global default content types
static GLOBAL_DEFAULTS: Lazy<DefaultContentTypes> = Lazy::new(DefaultContentTypes::new);

/// Lock-protected content-type list that new policies are seeded from
///
/// Policies take a [`snapshot`](Self::snapshot) at construction time; mutating
/// the defaults afterwards only affects policies created later.
#[derive(Debug)]
pub struct DefaultContentTypes {
    matcher: RwLock<ContentTypeMatcher>,
}

impl DefaultContentTypes {
    /// Create a set holding [`DEFAULT_CONTENT_TYPES`]
    pub fn new() -> Self {
        Self {
            matcher: RwLock::new(default_matcher()),
        }
    }

    /// The process-wide instance
    pub fn global() -> &'static Self {
        &GLOBAL_DEFAULTS
    }

    /// Copy of the current patterns and their compiled matcher
    pub fn snapshot(&self) -> ContentTypeMatcher {
        self.matcher.read().clone()
    }

    /// Add content types with the same rules as
    /// [`CompressionPolicy::add_content_types`](crate::CompressionPolicy::add_content_types)
    pub fn add_content_types(&self, candidates: &[&str]) -> Result<()> {
        let mut matcher = self.matcher.write();
        let updated = matcher.with_content_types(candidates)?;
        tracing::debug!(patterns = ?updated.patterns(), "Default content types updated");
        *matcher = updated;
        Ok(())
    }

    /// Restore [`DEFAULT_CONTENT_TYPES`]
    pub fn reset(&self) {
        *self.matcher.write() = default_matcher();
    }
}

impl Default for DefaultContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

/// Add content types to the process-wide defaults
///
/// Only middleware created after this call sees the change.
pub fn add_content_type(candidates: &[&str]) -> Result<()> {
    DefaultContentTypes::global().add_content_types(candidates)
}

fn default_matcher() -> ContentTypeMatcher {
    let patterns = DEFAULT_CONTENT_TYPES.iter().map(|c| translate(c)).collect();
    ContentTypeMatcher::compile(patterns).expect("default content types compile")
}
