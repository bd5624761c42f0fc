//! Types for the parsing system.

use crate::config::DEFAULT_MIN_ARTICLE_CHARS;

/// Tunable parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Clause-less articles are kept only when their body is longer than
    /// this many characters.
    pub min_article_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_article_chars: DEFAULT_MIN_ARTICLE_CHARS,
        }
    }
}

impl ParserConfig {
    /// Set the minimum body length for clause-less articles.
    #[must_use]
    pub fn with_min_article_chars(mut self, min_article_chars: usize) -> Self {
        self.min_article_chars = min_article_chars;
        self
    }
}
