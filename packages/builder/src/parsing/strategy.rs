//! Line-marker strategies for list segmentation.
//!
//! Items (호) and subitems (목) are segmented by the same line-oriented
//! algorithm; only the marker that opens a new entry differs.

use std::collections::HashSet;

use regex::Regex;
use std::sync::LazyLock;

/// Item marker: decimal numeral, period, whitespace ("1. ").
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ITEM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.\s").expect("valid regex"));

/// Subitem marker: one Hangul syllable, period, whitespace ("가. ").
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SUBITEM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([가-힣])\.\s").expect("valid regex"));

/// Trait for list marker recognition.
pub trait ListMarker {
    /// Return the marker id if `line` opens a new list entry.
    fn marker<'t>(&self, line: &'t str) -> Option<&'t str>;
}

/// Marker strategy for items ("1.", "2.", ...).
pub struct ItemMarker;

impl ListMarker for ItemMarker {
    fn marker<'t>(&self, line: &'t str) -> Option<&'t str> {
        ITEM_MARKER
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Marker strategy for subitems ("가.", "나.", ...).
pub struct SubitemMarker;

impl ListMarker for SubitemMarker {
    fn marker<'t>(&self, line: &'t str) -> Option<&'t str> {
        SUBITEM_MARKER
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// A list entry produced by [`split_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub text: String,
}

/// Split `text` into list entries opened by `marker`.
///
/// Lines are trimmed and blank lines skipped. A marker line opens a new
/// entry and is part of its text; following lines are appended until the
/// next marker. Lines before the first marker belong to no entry.
pub fn split_list<M: ListMarker>(text: &str, marker: &M) -> Vec<ListEntry> {
    let mut entries: Vec<ListEntry> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(id) = marker.marker(line) {
            if let Some((id, lines)) = current.take() {
                entries.push(ListEntry {
                    id,
                    text: lines.join("\n"),
                });
            }
            current = Some((id.to_string(), vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((id, lines)) = current {
        entries.push(ListEntry {
            id,
            text: lines.join("\n"),
        });
    }

    entries
}

/// Ids that occur more than once, in order of their second occurrence.
///
/// Sibling entries sharing an id also share a uid, so only the last one
/// survives an upsert.
pub fn duplicate_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in ids {
        if !seen.insert(id) && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }
    duplicates
}
