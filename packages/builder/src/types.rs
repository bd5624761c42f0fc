//! Core data types for the statute graph.
//!
//! Entities own their children: an `Article` holds its clauses, a `Clause`
//! its items and an `Item` its subitems. Every entity carries the uid it is
//! stored under, computed by [`crate::identity`] at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuilderError, Result};

/// Tier of a statutory instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LawType {
    /// Act (법률).
    Act,

    /// Enforcement decree (시행령).
    Decree,

    /// Enforcement rule (시행규칙).
    Rule,
}

impl LawType {
    /// All law types in ingestion order.
    pub const ALL: [LawType; 3] = [LawType::Act, LawType::Decree, LawType::Rule];

    /// Get the string value used in uids and store properties.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Act => "Act",
            Self::Decree => "Decree",
            Self::Rule => "Rule",
        }
    }

    /// The instrument a document of this type delegates to, if any.
    ///
    /// Decrees implement the Act, rules implement the Decree.
    #[must_use]
    pub fn delegation_target(&self) -> Option<LawType> {
        match self {
            Self::Act => None,
            Self::Decree => Some(Self::Act),
            Self::Rule => Some(Self::Decree),
        }
    }
}

impl fmt::Display for LawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LawType {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "act" | "법률" | "법" => Ok(Self::Act),
            "decree" | "시행령" | "대통령령" => Ok(Self::Decree),
            "rule" | "시행규칙" => Ok(Self::Rule),
            _ => Err(BuilderError::InvalidLawType(s.to_string())),
        }
    }
}

/// Kind of node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Article,
    Clause,
    Item,
    Subitem,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Article,
        NodeKind::Clause,
        NodeKind::Item,
        NodeKind::Subitem,
    ];

    /// Generic label shared by every node of this kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Clause => "Clause",
            Self::Item => "Item",
            Self::Subitem => "Subitem",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Relationship types of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Structural containment (Article→Clause→Item→Subitem).
    Contains,

    /// Citation within the same document.
    RefersTo,

    /// Decree→Act or Rule→Decree citation within one law code.
    DelegatesTo,

    /// Citation of another statute's Act.
    CrossRefersTo,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 4] = [
        EdgeKind::Contains,
        EdgeKind::RefersTo,
        EdgeKind::DelegatesTo,
        EdgeKind::CrossRefersTo,
    ];

    /// Relationship type name in the store.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::RefersTo => "REFERS_TO",
            Self::DelegatesTo => "DELEGATES_TO",
            Self::CrossRefersTo => "CROSS_REFERS_TO",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two nodes addressed by uid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from_kind: NodeKind,
    pub from: String,
    pub to_kind: NodeKind,
    pub to: String,
}

impl Edge {
    /// Containment edge from a parent node to its child.
    #[must_use]
    pub fn contains(
        from_kind: NodeKind,
        from: impl Into<String>,
        to_kind: NodeKind,
        to: impl Into<String>,
    ) -> Self {
        Self {
            kind: EdgeKind::Contains,
            from_kind,
            from: from.into(),
            to_kind,
            to: to.into(),
        }
    }

    /// Citation edge between two articles.
    #[must_use]
    pub fn citation(kind: EdgeKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from_kind: NodeKind::Article,
            from: from.into(),
            to_kind: NodeKind::Article,
            to: to.into(),
        }
    }
}

/// Subdivision of an item (목), labelled with a Hangul syllable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subitem {
    pub uid: String,
    pub subitem_id: String,
    pub content: String,
    pub law_code: String,
    pub law_type: LawType,
}

/// Subdivision of a clause (호), labelled with an Arabic numeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub uid: String,
    pub item_id: String,
    pub content: String,
    pub law_code: String,
    pub law_type: LawType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<Subitem>,
}

/// First-level subdivision of an article (항), labelled with a circled digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub uid: String,
    pub clause_id: String,
    pub content: String,
    pub law_code: String,
    pub law_type: LawType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

/// A single article (조) of an act, decree or rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub uid: String,
    pub article_id: String,
    pub title: String,
    pub law_code: String,
    pub law_type: LawType,
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clauses: Vec<Clause>,
}

impl Article {
    /// Length of the article body in characters.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.full_text.chars().count()
    }

    /// View of this article as the reference resolver sees it.
    #[must_use]
    pub fn to_record(&self) -> ArticleRecord {
        ArticleRecord {
            uid: self.uid.clone(),
            article_id: self.article_id.clone(),
            law_code: self.law_code.clone(),
            law_type: self.law_type,
            full_text: self.full_text.clone(),
        }
    }
}

/// A parsed document: all articles of one law code and law type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub law_code: String,
    pub law_type: LawType,
    pub articles: Vec<Article>,
}

impl Document {
    /// Count clauses, items and subitems across all articles.
    #[must_use]
    pub fn counts(&self) -> DocumentCounts {
        let mut counts = DocumentCounts {
            articles: self.articles.len(),
            ..DocumentCounts::default()
        };
        for clause in self.articles.iter().flat_map(|a| &a.clauses) {
            counts.clauses += 1;
            for item in &clause.items {
                counts.items += 1;
                counts.subitems += item.subitems.len();
            }
        }
        counts
    }
}

/// Node counts for one parsed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentCounts {
    pub articles: usize,
    pub clauses: usize,
    pub items: usize,
    pub subitems: usize,
}

/// Stored article fields needed for citation resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub uid: String,
    pub article_id: String,
    pub law_code: String,
    pub law_type: LawType,
    pub full_text: String,
}
