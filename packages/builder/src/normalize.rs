//! Plain-text normalization of extracted statute documents.
//!
//! Text extraction from PDF (or OCR) happens outside this crate. The
//! normalizer takes the extracted text, one page per form feed, and removes
//! page-boundary noise so the parser sees one contiguous document.

use std::fs;
use std::path::Path;

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::config::CLAUSE_MARKERS;
use crate::error::{BuilderError, Result};

/// Page separator emitted by common PDF-to-text tools.
const PAGE_BREAK: char = '\x0c';

/// A page with more article lines than this, and no clause markers, is
/// treated as a table of contents.
const TOC_ARTICLE_LINE_THRESHOLD: usize = 15;

/// Running headers are short lines ending in "법" (e.g. "건축법").
const RUNNING_HEADER_MAX_CHARS: usize = 10;

/// Publisher watermarks repeated on every page.
const WATERMARKS: [&str; 2] = ["법제처", "국가법령정보센터"];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TOC_ARTICLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*제[0-9]+조").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PUBLISHER_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^법제처\s+[0-9]+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PAGE_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\s*/\s*[0-9]+$").expect("valid regex"));

/// Source of normalized document text.
pub trait Normalizer {
    /// Return the normalized text of the document at `path`.
    fn normalize(&self, path: &Path) -> Result<String>;
}

/// Normalizer for UTF-8 text files produced by an external extractor.
#[derive(Debug, Clone)]
pub struct PlainTextNormalizer {
    skip_toc: bool,
}

impl Default for PlainTextNormalizer {
    fn default() -> Self {
        Self { skip_toc: true }
    }
}

impl PlainTextNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or drop table-of-contents pages.
    #[must_use]
    pub fn with_skip_toc(mut self, skip_toc: bool) -> Self {
        self.skip_toc = skip_toc;
        self
    }

    /// Normalize already-extracted text.
    #[must_use]
    pub fn normalize_text(&self, raw: &str) -> String {
        let composed: String = raw.nfc().collect();
        let mut lines: Vec<&str> = Vec::new();
        let mut skipped_pages = 0usize;

        for page in composed.split(PAGE_BREAK) {
            if self.skip_toc && is_toc_page(page) {
                skipped_pages += 1;
                continue;
            }
            lines.extend(page.lines().map(str::trim).filter(|l| !is_noise_line(l)));
        }

        if skipped_pages > 0 {
            tracing::debug!(skipped_pages, "Dropped table-of-contents pages");
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

impl Normalizer for PlainTextNormalizer {
    fn normalize(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(BuilderError::SourceNotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let raw = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Document is not valid UTF-8, replacing invalid sequences"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let text = self.normalize_text(&raw);
        if text.trim().is_empty() {
            return Err(BuilderError::EmptyDocument(path.to_path_buf()));
        }

        tracing::info!(path = %path.display(), chars = text.chars().count(), "Normalized document");
        Ok(text)
    }
}

/// Detect a table-of-contents page: many article lines and no clauses.
fn is_toc_page(page: &str) -> bool {
    let article_lines = page
        .lines()
        .filter(|line| TOC_ARTICLE_LINE.is_match(line))
        .count();
    let has_clauses = page.chars().any(|c| CLAUSE_MARKERS[..5].contains(&c));
    article_lines > TOC_ARTICLE_LINE_THRESHOLD && !has_clauses
}

/// Detect page furniture: watermarks, page numbers and running headers.
fn is_noise_line(line: &str) -> bool {
    if line.is_empty() || WATERMARKS.contains(&line) {
        return true;
    }
    if line.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if PUBLISHER_PAGE_NUMBER.is_match(line) || PAGE_COUNTER.is_match(line) {
        return true;
    }
    line.ends_with('법') && line.chars().count() <= RUNNING_HEADER_MAX_CHARS
}
