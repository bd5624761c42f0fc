//! Graph store abstraction.
//!
//! The builder talks to the graph through [`GraphStore`], a small set of
//! idempotent primitives: merge a node keyed on its uid, merge an edge when
//! both endpoints exist, and list nodes by label. Two backends are provided:
//!
//! - [`MemoryStore`]: in-process graph with JSON snapshots, used for dry
//!   runs and tests
//! - [`Neo4jStore`]: Neo4j over its HTTP transactional endpoint

mod memory;
mod neo4j;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BuilderError, Result};
use crate::types::{Article, ArticleRecord, Clause, Edge, EdgeKind, Item, NodeKind, Subitem};

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// Storage backend for the statute graph.
///
/// Every write is keyed on a deterministic uid, so re-running any operation
/// converges to the same graph.
pub trait GraphStore: Send + Sync {
    /// Create lookup indexes on `uid` for every node kind, plus `article_id`
    /// and `law_code` for articles. Existing indexes are left alone.
    fn create_indexes(&self) -> Result<()>;

    /// Delete every node and edge.
    fn clear(&self) -> Result<()>;

    /// Create or update a node; content properties are overwritten.
    fn upsert_node(&self, node: &Node<'_>) -> Result<()>;

    /// Create an edge if both endpoints exist.
    ///
    /// Returns whether both endpoints were found. An edge that already exists
    /// is left as is.
    fn upsert_edge(&self, edge: &Edge) -> Result<bool>;

    /// Submit a batch of edges as one request.
    ///
    /// Returns how many edges had both endpoints present.
    fn upsert_edges(&self, edges: &[Edge]) -> Result<usize> {
        let mut matched = 0;
        for edge in edges {
            if self.upsert_edge(edge)? {
                matched += 1;
            }
        }
        Ok(matched)
    }

    /// All nodes carrying `label`.
    fn nodes_by_label(&self, label: &str) -> Result<Vec<StoredNode>>;

    /// Node and edge counts.
    fn stats(&self) -> Result<GraphStats>;
}

/// A node to upsert, borrowing the parsed entity.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// An article with its law-type-specific label (e.g., "BuildingAct").
    Article {
        article: &'a Article,
        law_label: &'a str,
    },
    Clause(&'a Clause),
    Item(&'a Item),
    Subitem(&'a Subitem),
}

impl Node<'_> {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Article { .. } => NodeKind::Article,
            Self::Clause(_) => NodeKind::Clause,
            Self::Item(_) => NodeKind::Item,
            Self::Subitem(_) => NodeKind::Subitem,
        }
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        match self {
            Self::Article { article, .. } => &article.uid,
            Self::Clause(clause) => &clause.uid,
            Self::Item(item) => &item.uid,
            Self::Subitem(subitem) => &subitem.uid,
        }
    }

    /// Labels in store order: the kind label first, then the law label for
    /// articles.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = vec![self.kind().label()];
        if let Self::Article { law_label, .. } = self {
            labels.push(law_label);
        }
        labels
    }

    /// Stored properties, including `uid`.
    #[must_use]
    pub fn properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        let mut put = |key: &str, value: &str| {
            props.insert(key.to_string(), Value::String(value.to_string()));
        };

        match self {
            Self::Article { article, .. } => {
                put("uid", &article.uid);
                put("article_id", &article.article_id);
                put("title", &article.title);
                put("law_code", &article.law_code);
                put("law_type", article.law_type.as_str());
                put("full_text", &article.full_text);
            }
            Self::Clause(clause) => {
                put("uid", &clause.uid);
                put("clause_id", &clause.clause_id);
                put("content", &clause.content);
                put("law_code", &clause.law_code);
                put("law_type", clause.law_type.as_str());
            }
            Self::Item(item) => {
                put("uid", &item.uid);
                put("item_id", &item.item_id);
                put("content", &item.content);
                put("law_code", &item.law_code);
                put("law_type", item.law_type.as_str());
            }
            Self::Subitem(subitem) => {
                put("uid", &subitem.uid);
                put("subitem_id", &subitem.subitem_id);
                put("content", &subitem.content);
                put("law_code", &subitem.law_code);
                put("law_type", subitem.law_type.as_str());
            }
        }
        props
    }
}

/// A node as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    pub uid: String,
    pub properties: Map<String, Value>,
}

impl StoredNode {
    /// String property, or `MissingProperty` if absent or not a string.
    pub fn str_property(&self, property: &str) -> Result<&str> {
        self.properties
            .get(property)
            .and_then(Value::as_str)
            .ok_or_else(|| BuilderError::MissingProperty {
                uid: self.uid.clone(),
                property: property.to_string(),
            })
    }
}

impl TryFrom<StoredNode> for ArticleRecord {
    type Error = BuilderError;

    fn try_from(node: StoredNode) -> Result<Self> {
        Ok(Self {
            article_id: node.str_property("article_id")?.to_string(),
            law_code: node.str_property("law_code")?.to_string(),
            law_type: node.str_property("law_type")?.parse()?,
            // Articles stored without text still take part as citation targets.
            full_text: node.str_property("full_text").unwrap_or_default().to_string(),
            uid: node.uid,
        })
    }
}

/// Article count of one document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentArticles {
    pub law_code: String,
    pub law_type: String,
    pub articles: usize,
}

/// Node and edge counts of the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: BTreeMap<NodeKind, usize>,
    pub edges: BTreeMap<EdgeKind, usize>,
    /// Articles per `(law_code, law_type)`, sorted.
    pub documents: Vec<DocumentArticles>,
}

impl GraphStats {
    #[must_use]
    pub fn node_count(&self, kind: NodeKind) -> usize {
        self.nodes.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes:")?;
        for kind in NodeKind::ALL {
            writeln!(f, "  {:<16} {}", kind.label(), self.node_count(kind))?;
        }
        writeln!(f, "Relationships:")?;
        for kind in EdgeKind::ALL {
            writeln!(f, "  {:<16} {}", kind.as_str(), self.edge_count(kind))?;
        }
        if !self.documents.is_empty() {
            writeln!(f, "Articles per document:")?;
            for doc in &self.documents {
                let name = format!("{}/{}", doc.law_code, doc.law_type);
                writeln!(f, "  {name:<24} {}", doc.articles)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LawType;
    use pretty_assertions::assert_eq;

    fn article() -> Article {
        Article {
            uid: "BUILDING_Act_제1조".to_string(),
            article_id: "제1조".to_string(),
            title: "목적".to_string(),
            law_code: "BUILDING".to_string(),
            law_type: LawType::Act,
            full_text: "제1조(목적) 이 법은".to_string(),
            clauses: Vec::new(),
        }
    }

    #[test]
    fn test_article_node_labels_and_properties() {
        let article = article();
        let node = Node::Article {
            article: &article,
            law_label: "BuildingAct",
        };

        assert_eq!(node.kind(), NodeKind::Article);
        assert_eq!(node.labels(), vec!["Article", "BuildingAct"]);

        let props = node.properties();
        assert_eq!(props["uid"], "BUILDING_Act_제1조");
        assert_eq!(props["law_type"], "Act");
        assert_eq!(props["title"], "목적");
        assert!(!props.contains_key("clauses"));
    }

    #[test]
    fn test_clause_node_has_single_label() {
        let clause = Clause {
            uid: "BUILDING_Act_제1조_①".to_string(),
            clause_id: "①".to_string(),
            content: "내용".to_string(),
            law_code: "BUILDING".to_string(),
            law_type: LawType::Act,
            items: Vec::new(),
        };
        let node = Node::Clause(&clause);
        assert_eq!(node.labels(), vec!["Clause"]);
        assert_eq!(node.properties()["clause_id"], "①");
    }

    #[test]
    fn test_article_record_from_stored_node() {
        let article = article();
        let node = Node::Article {
            article: &article,
            law_label: "BuildingAct",
        };
        let stored = StoredNode {
            uid: article.uid.clone(),
            properties: node.properties(),
        };

        let record = ArticleRecord::try_from(stored).unwrap();
        assert_eq!(record, article.to_record());
    }

    #[test]
    fn test_article_record_missing_property() {
        let stored = StoredNode {
            uid: "BUILDING_Act_제1조".to_string(),
            properties: Map::new(),
        };
        let err = ArticleRecord::try_from(stored).unwrap_err();
        assert!(matches!(err, BuilderError::MissingProperty { ref property, .. } if property == "article_id"));
    }

    #[test]
    fn test_article_record_without_text() {
        let mut properties = Map::new();
        for (key, value) in [
            ("article_id", "제3조"),
            ("law_code", "BUILDING"),
            ("law_type", "Decree"),
        ] {
            properties.insert(key.to_string(), Value::String(value.to_string()));
        }
        let stored = StoredNode {
            uid: "BUILDING_Decree_제3조".to_string(),
            properties,
        };

        let record = ArticleRecord::try_from(stored).unwrap();
        assert_eq!(record.law_type, LawType::Decree);
        assert_eq!(record.full_text, "");
    }

    #[test]
    fn test_stats_display() {
        let mut stats = GraphStats::default();
        stats.nodes.insert(NodeKind::Article, 3);
        stats.edges.insert(EdgeKind::Contains, 5);
        stats.documents.push(DocumentArticles {
            law_code: "BUILDING".to_string(),
            law_type: "Act".to_string(),
            articles: 3,
        });

        let rendered = stats.to_string();
        assert!(rendered.contains("Article"));
        assert!(rendered.contains("BUILDING/Act"));
        assert!(rendered.contains("CONTAINS"));
        assert_eq!(stats.node_count(NodeKind::Subitem), 0);
        assert_eq!(stats.edge_count(EdgeKind::Contains), 5);
    }
}
