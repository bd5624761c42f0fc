//! Hierarchical parsing of Korean statute text.
//!
//! Splits a normalized document into articles (조), clauses (항), items (호)
//! and subitems (목), then collapses duplicate article captures.

mod dedup;
mod engine;
mod strategy;
mod types;

pub use dedup::deduplicate;
pub use engine::LawParser;
pub use strategy::{duplicate_ids, split_list, ItemMarker, ListEntry, ListMarker, SubitemMarker};
pub use types::ParserConfig;
