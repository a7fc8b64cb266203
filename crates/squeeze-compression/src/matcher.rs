//! Content-type admission matching

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use squeeze_core::{Error, Result};

/// Pattern that resets a pattern list to the empty, match-everything state
pub const MATCH_ALL: &str = "*/*";

/// Grammar every accepted content-type pattern must follow
static CONTENT_TYPE_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"^([A-Za-z0-9_]+|\*)/([-+.A-Za-z0-9_]|\*)+$").expect("valid content type grammar")
    });

/// Compiled predicate over a list of content-type patterns
///
/// Patterns are stored in their translated (regular expression) form, in the
/// order they were first added. An empty list matches every content type.
#[derive(Debug, Clone)]
pub struct ContentTypeMatcher {
    patterns: Vec<String>,
    regex: Regex,
}

impl ContentTypeMatcher {
    /// Compile a list of translated patterns into a matcher
    pub fn compile(patterns: Vec<String>) -> Result<Self> {
        let source = if patterns.is_empty() {
            ".*".to_string()
        } else {
            format!("^({})$", patterns.join("|"))
        };

        let regex = RegexBuilder::new(&source).case_insensitive(true).build()?;

        Ok(Self { patterns, regex })
    }

    /// Test a content type against the compiled predicate
    pub fn matches(&self, content_type: &str) -> bool {
        self.regex.is_match(content_type)
    }

    /// Translated patterns, in insertion order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Source of the compiled expression
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether this matcher accepts every content type
    pub fn matches_all(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Return a new matcher with `candidates` added in order
    ///
    /// Either every candidate is applied and the result recompiled, or the first
    /// error is returned and `self` is left as it was.
    pub fn with_content_types(&self, candidates: &[&str]) -> Result<Self> {
        let mut patterns = self.patterns.clone();
        for candidate in candidates {
            append_pattern(&mut patterns, candidate)?;
        }

        Self::compile(patterns)
    }
}

/// Add a content-type pattern to `patterns`
///
/// `*/*` clears the list. Anything else must follow the `type/subtype` grammar,
/// where `*` stands for any token; it is translated and appended unless already
/// present. On error `patterns` is not touched.
pub fn append_pattern(patterns: &mut Vec<String>, candidate: &str) -> Result<()> {
    if candidate == MATCH_ALL {
        patterns.clear();
        return Ok(());
    }

    if !CONTENT_TYPE_GRAMMAR.is_match(candidate) {
        return Err(Error::BadContentTypeFormat(candidate.to_string()));
    }

    let translated = translate(candidate);
    if !patterns.contains(&translated) {
        patterns.push(translated);
    }

    Ok(())
}

/// Translate a grammar-checked content type into regular expression source
///
/// `*` matches one or more characters; `.` and `+` are literal. The result is
/// lowercased since matching ignores case.
pub fn translate(content_type: &str) -> String {
    let mut out = String::with_capacity(content_type.len() + 4);
    for c in content_type.chars().map(|c| c.to_ascii_lowercase()) {
        match c {
            '*' => out.push_str(".+"),
            '.' | '+' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
