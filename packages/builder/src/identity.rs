//! Deterministic node identities.
//!
//! Every node is upserted under a uid derived only from its position in the
//! statute: `{law_code}_{law_type}_{article_id}` for articles, and the parent
//! uid joined with `_` and the local marker for clauses, items and subitems.
//! Identical inputs always produce identical uids, which is what makes
//! re-ingestion converge instead of duplicating nodes.

use crate::types::LawType;

/// Uid of an article.
///
/// # Examples
/// ```
/// use lawgraph_builder::identity::article_uid;
/// use lawgraph_builder::types::LawType;
///
/// assert_eq!(article_uid("BUILDING", LawType::Act, "제11조"), "BUILDING_Act_제11조");
/// ```
#[must_use]
pub fn article_uid(law_code: &str, law_type: LawType, article_id: &str) -> String {
    format!("{law_code}_{}_{article_id}", law_type.as_str())
}

/// Uid of a clause, item or subitem under `parent_uid`.
///
/// # Examples
/// ```
/// use lawgraph_builder::identity::child_uid;
///
/// assert_eq!(child_uid("BUILDING_Act_제11조", "①"), "BUILDING_Act_제11조_①");
/// ```
#[must_use]
pub fn child_uid(parent_uid: &str, marker: &str) -> String {
    format!("{parent_uid}_{marker}")
}
