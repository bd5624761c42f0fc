//! Graph upsert protocol.
//!
//! Two stages, both idempotent:
//!
//! 1. [`ingest_document`] writes one parsed document: every node first, then
//!    the containment edges between them. A store failure aborts the rest of
//!    that document only.
//! 2. [`link_references`] runs once after all documents are stored. It reads
//!    every article back, resolves citations over that universe and submits
//!    the edges in fixed-size batches. A failed batch is logged and counted;
//!    earlier batches stay committed.

use std::fmt;

use serde::Serialize;

use crate::config::is_article_id;
use crate::error::Result;
use crate::references::ReferenceResolver;
use crate::store::{GraphStore, Node};
use crate::types::{ArticleRecord, Document, DocumentCounts, Edge, EdgeKind, NodeKind};

/// Progress of one document through the ingestion stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IngestPhase {
    Start,
    NodesUpserted,
    ContainmentEdgesUpserted,
    Done,
}

impl fmt::Display for IngestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::NodesUpserted => "nodes upserted",
            Self::ContainmentEdgesUpserted => "containment edges upserted",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub law_code: String,
    pub law_type: String,
    pub phase: IngestPhase,
    pub counts: DocumentCounts,
    pub containment_edges: usize,
}

/// Containment edges of a document, parents before children.
#[must_use]
pub fn containment_edges(document: &Document) -> Vec<Edge> {
    let mut edges = Vec::new();
    for article in &document.articles {
        for clause in &article.clauses {
            edges.push(Edge::contains(
                NodeKind::Article,
                &article.uid,
                NodeKind::Clause,
                &clause.uid,
            ));
            for item in &clause.items {
                edges.push(Edge::contains(
                    NodeKind::Clause,
                    &clause.uid,
                    NodeKind::Item,
                    &item.uid,
                ));
                for subitem in &item.subitems {
                    edges.push(Edge::contains(
                        NodeKind::Item,
                        &item.uid,
                        NodeKind::Subitem,
                        &subitem.uid,
                    ));
                }
            }
        }
    }
    edges
}

fn upsert_nodes(store: &dyn GraphStore, document: &Document, law_label: &str) -> Result<()> {
    for article in &document.articles {
        store.upsert_node(&Node::Article { article, law_label })?;
        for clause in &article.clauses {
            store.upsert_node(&Node::Clause(clause))?;
            for item in &clause.items {
                store.upsert_node(&Node::Item(item))?;
                for subitem in &item.subitems {
                    store.upsert_node(&Node::Subitem(subitem))?;
                }
            }
        }
    }
    Ok(())
}

/// Write one document's nodes and containment edges.
///
/// Articles are labelled `Article` plus `law_label`. Every containment edge
/// is attempted only after all nodes of the document exist.
pub fn ingest_document(
    store: &dyn GraphStore,
    document: &Document,
    law_label: &str,
) -> Result<IngestReport> {
    let mut phase = IngestPhase::Start;
    tracing::debug!(law_code = %document.law_code, law_type = %document.law_type, %phase, "Ingesting document");

    upsert_nodes(store, document, law_label)?;
    phase = IngestPhase::NodesUpserted;
    tracing::debug!(law_code = %document.law_code, %phase, "Document progress");

    let edges = containment_edges(document);
    let mut linked = 0;
    for edge in &edges {
        if store.upsert_edge(edge)? {
            linked += 1;
        }
    }
    phase = IngestPhase::ContainmentEdgesUpserted;
    tracing::debug!(law_code = %document.law_code, %phase, edges = linked, "Document progress");

    if linked < edges.len() {
        tracing::warn!(
            law_code = %document.law_code,
            law_type = %document.law_type,
            missing = edges.len() - linked,
            "Some containment edges found no endpoints"
        );
    }

    phase = IngestPhase::Done;
    let counts = document.counts();
    tracing::info!(
        law_code = %document.law_code,
        law_type = %document.law_type,
        articles = counts.articles,
        clauses = counts.clauses,
        items = counts.items,
        subitems = counts.subitems,
        "Ingested document"
    );

    Ok(IngestReport {
        law_code: document.law_code.clone(),
        law_type: document.law_type.to_string(),
        phase,
        counts,
        containment_edges: linked,
    })
}

/// Per-kind result of the citation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeKindReport {
    /// Edges resolved against the article universe.
    pub resolved: usize,

    /// Edges the store confirmed in successful batches.
    pub linked: usize,

    /// Batches the store rejected.
    pub failed_batches: usize,
}

/// Outcome of the citation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub articles: usize,
    pub refers_to: EdgeKindReport,
    pub delegates_to: EdgeKindReport,
    pub cross_refers_to: EdgeKindReport,
}

impl LinkReport {
    #[must_use]
    pub fn kind(&self, kind: EdgeKind) -> Option<&EdgeKindReport> {
        match kind {
            EdgeKind::RefersTo => Some(&self.refers_to),
            EdgeKind::DelegatesTo => Some(&self.delegates_to),
            EdgeKind::CrossRefersTo => Some(&self.cross_refers_to),
            EdgeKind::Contains => None,
        }
    }

    #[must_use]
    pub fn failed_batches(&self) -> usize {
        self.refers_to.failed_batches
            + self.delegates_to.failed_batches
            + self.cross_refers_to.failed_batches
    }

    #[must_use]
    pub fn linked(&self) -> usize {
        self.refers_to.linked + self.delegates_to.linked + self.cross_refers_to.linked
    }
}

/// Submit `edges` in batches of `batch_size`; failures do not stop later
/// batches.
fn upsert_in_batches(
    store: &dyn GraphStore,
    kind: EdgeKind,
    edges: &[Edge],
    batch_size: usize,
) -> EdgeKindReport {
    let mut report = EdgeKindReport {
        resolved: edges.len(),
        ..EdgeKindReport::default()
    };

    for (index, batch) in edges.chunks(batch_size.max(1)).enumerate() {
        match store.upsert_edges(batch) {
            Ok(linked) => report.linked += linked,
            Err(e) => {
                report.failed_batches += 1;
                tracing::warn!(
                    kind = %kind,
                    batch = index,
                    size = batch.len(),
                    error = %e,
                    "Edge batch failed"
                );
            }
        }
    }

    tracing::info!(kind = %kind, resolved = report.resolved, linked = report.linked, "Linked citations");
    report
}

/// Resolve citations over every stored article and upsert the edges.
///
/// Must run after all documents meant to cross-reference each other are
/// ingested. Re-running over an unchanged graph creates no new edges.
pub fn link_references(
    store: &dyn GraphStore,
    resolver: &ReferenceResolver,
    batch_size: usize,
) -> Result<LinkReport> {
    let mut articles: Vec<ArticleRecord> = store
        .nodes_by_label(NodeKind::Article.label())?
        .into_iter()
        .filter_map(|node| {
            let uid = node.uid.clone();
            match ArticleRecord::try_from(node) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(%uid, error = %e, "Ignoring incomplete article node");
                    None
                }
            }
        })
        .collect();

    articles.retain(|article| {
        let valid = is_article_id(&article.article_id);
        if !valid {
            tracing::warn!(uid = %article.uid, article_id = %article.article_id, "Ignoring article with malformed id");
        }
        valid
    });

    let resolved = resolver.resolve(&articles);

    Ok(LinkReport {
        articles: articles.len(),
        refers_to: upsert_in_batches(store, EdgeKind::RefersTo, &resolved.internal, batch_size),
        delegates_to: upsert_in_batches(
            store,
            EdgeKind::DelegatesTo,
            &resolved.delegates,
            batch_size,
        ),
        cross_refers_to: upsert_in_batches(
            store,
            EdgeKind::CrossRefersTo,
            &resolved.cross,
            batch_size,
        ),
    })
}
