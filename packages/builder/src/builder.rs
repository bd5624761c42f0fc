//! Build service that ties all components together.
//!
//! Walks every registered statute and law type, normalizes and parses each
//! source document, ingests it, and finally resolves citations over the whole
//! stored article set.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::DEFAULT_EDGE_BATCH_SIZE;
use crate::error::{BuilderError, Result};
use crate::laws::{GraphConfig, LawDefinition};
use crate::loader::{ingest_document, link_references, IngestReport, LinkReport};
use crate::normalize::Normalizer;
use crate::parsing::{LawParser, ParserConfig};
use crate::references::ReferenceResolver;
use crate::store::GraphStore;
use crate::types::LawType;

/// Options for a full build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root of the conventional source layout `<dir>/<CODE>/<LawType>.txt`.
    pub source_dir: Option<PathBuf>,

    /// Restrict the build to these law codes (registry order is kept).
    pub only: Vec<String>,

    /// Delete the whole graph before ingesting.
    pub clear: bool,

    pub parser: ParserConfig,

    /// Edges per upsert request in the citation stage.
    pub batch_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_dir: None,
            only: Vec::new(),
            clear: false,
            parser: ParserConfig::default(),
            batch_size: DEFAULT_EDGE_BATCH_SIZE,
        }
    }
}

/// What happened to one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Ingested(IngestReport),
    /// Missing or empty input; nothing was written.
    Skipped { reason: String },
    /// The store rejected part of the document.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub law_code: String,
    pub law_type: LawType,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

/// Outcome of a full build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub documents: Vec<DocumentReport>,
    pub links: LinkReport,
}

impl BuildReport {
    fn count(&self, pred: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.status)).count()
    }

    #[must_use]
    pub fn ingested(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Ingested(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Skipped { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Failed { .. }))
    }

    /// No document failed and every edge batch was accepted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.links.failed_batches() == 0
    }

    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Documents: {} ingested, {} skipped, {} failed",
            self.ingested(),
            self.skipped(),
            self.failed()
        )?;
        writeln!(
            f,
            "Citations: {} REFERS_TO, {} DELEGATES_TO, {} CROSS_REFERS_TO across {} articles",
            self.links.refers_to.linked,
            self.links.delegates_to.linked,
            self.links.cross_refers_to.linked,
            self.links.articles
        )?;
        if self.links.failed_batches() > 0 {
            writeln!(f, "Failed edge batches: {}", self.links.failed_batches())?;
        }
        Ok(())
    }
}

/// Statutes selected for a build, in registry order.
fn select_laws<'a>(config: &'a GraphConfig, only: &[String]) -> Result<Vec<&'a LawDefinition>> {
    if only.is_empty() {
        return Ok(config.registry.iter().collect());
    }
    for code in only {
        if config.registry.get(code).is_none() {
            return Err(BuilderError::UnknownLaw(code.clone()));
        }
    }
    Ok(config
        .registry
        .iter()
        .filter(|law| only.contains(&law.code))
        .collect())
}

fn process_document(
    store: &dyn GraphStore,
    normalizer: &dyn Normalizer,
    parser: &LawParser,
    law: &LawDefinition,
    law_type: LawType,
    options: &BuildOptions,
) -> DocumentStatus {
    let Some(path) = law.source_path(law_type, options.source_dir.as_deref()) else {
        return DocumentStatus::Skipped {
            reason: "no source configured".to_string(),
        };
    };

    let text = match normalizer.normalize(&path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(law_code = %law.code, %law_type, error = %e, "Skipping document");
            return DocumentStatus::Skipped {
                reason: e.to_string(),
            };
        }
    };

    let document = parser.parse(&text, &law.code, law_type);
    if document.articles.is_empty() {
        tracing::warn!(law_code = %law.code, %law_type, path = %path.display(), "No articles found");
        return DocumentStatus::Skipped {
            reason: "no articles found".to_string(),
        };
    }

    match ingest_document(store, &document, &law.label(law_type)) {
        Ok(report) => DocumentStatus::Ingested(report),
        Err(e) => {
            tracing::error!(law_code = %law.code, %law_type, error = %e, "Ingestion failed");
            DocumentStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Build the graph, reporting each document before it is processed.
///
/// Input defects skip a document; store failures fail it; neither stops the
/// remaining documents. Index creation, clearing and reading the article set
/// back are fatal.
pub fn build_graph_with_progress(
    store: &dyn GraphStore,
    config: &GraphConfig,
    normalizer: &dyn Normalizer,
    options: &BuildOptions,
    on_document: &mut dyn FnMut(&str, LawType),
) -> Result<BuildReport> {
    let started_at = Local::now();
    let laws = select_laws(config, &options.only)?;
    let resolver = ReferenceResolver::new(&config.cross_references)?;
    let parser = LawParser::new(options.parser);

    tracing::info!(laws = laws.len(), started_at = %started_at.to_rfc3339(), "Starting build");

    if options.clear {
        store.clear()?;
    }
    store.create_indexes()?;

    let mut documents = Vec::new();
    for law in laws {
        for law_type in LawType::ALL {
            on_document(&law.code, law_type);
            let status = process_document(store, normalizer, &parser, law, law_type, options);
            documents.push(DocumentReport {
                law_code: law.code.clone(),
                law_type,
                status,
            });
        }
    }

    let links = link_references(store, &resolver, options.batch_size)?;

    let report = BuildReport {
        started_at,
        finished_at: Local::now(),
        documents,
        links,
    };
    tracing::info!(
        ingested = report.ingested(),
        skipped = report.skipped(),
        failed = report.failed(),
        elapsed_ms = report.elapsed().num_milliseconds(),
        "Build finished"
    );
    Ok(report)
}

/// Build the graph for every selected statute.
pub fn build_graph(
    store: &dyn GraphStore,
    config: &GraphConfig,
    normalizer: &dyn Normalizer,
    options: &BuildOptions,
) -> Result<BuildReport> {
    build_graph_with_progress(store, config, normalizer, options, &mut |_, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laws::{CrossReference, CrossReferenceTable, LawRegistry};
    use crate::normalize::PlainTextNormalizer;
    use crate::store::MemoryStore;
    use crate::types::{EdgeKind, NodeKind};
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, code: &str, law_type: LawType, text: &str) {
        let law_dir = dir.join(code);
        fs::create_dir_all(&law_dir).unwrap();
        fs::write(law_dir.join(format!("{law_type}.txt")), text).unwrap();
    }

    fn config() -> GraphConfig {
        GraphConfig {
            registry: LawRegistry::new(vec![
                LawDefinition::new("BUILDING", "건축법"),
                LawDefinition::new("HOUSING", "주택법"),
            ])
            .unwrap(),
            cross_references: CrossReferenceTable::new([(
                "BUILDING".to_string(),
                vec![CrossReference::new("주택법", "HOUSING")],
            )]),
        }
    }

    #[test]
    fn test_build_graph() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "BUILDING", LawType::Act, "제11조(건축허가)\n① 주택법 제15조에 따른 승인을 받은 경우에는 허가를 받은 것으로 본다.\n");
        write(dir.path(), "BUILDING", LawType::Decree, "제8조(허가)\n① 법 제11조에 따라 허가를 받으려는 자는 신청서를 제출하여야 한다.\n");
        write(dir.path(), "HOUSING", LawType::Act, "제15조(사업계획의 승인)\n① 사업주체는 사업계획승인을 받아야 한다.\n");

        let store = MemoryStore::new();
        let options = BuildOptions {
            source_dir: Some(dir.path().to_path_buf()),
            ..BuildOptions::default()
        };
        let mut seen = Vec::new();
        let report = build_graph_with_progress(
            &store,
            &config(),
            &PlainTextNormalizer::new(),
            &options,
            &mut |code, law_type| seen.push(format!("{code}/{law_type}")),
        )
        .unwrap();

        assert_eq!(report.ingested(), 3);
        assert_eq!(report.skipped(), 3);
        assert!(report.is_success());
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], "BUILDING/Act");

        let stats = store.stats().unwrap();
        assert_eq!(stats.node_count(NodeKind::Article), 3);
        assert!(store
            .has_edge(EdgeKind::DelegatesTo, "BUILDING_Decree_제8조", "BUILDING_Act_제11조")
            .unwrap());
        assert!(store
            .has_edge(EdgeKind::CrossRefersTo, "BUILDING_Act_제11조", "HOUSING_Act_제15조")
            .unwrap());
    }

    #[test]
    fn test_build_graph_only_selected_laws() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "HOUSING", LawType::Act, "제15조(사업계획의 승인)\n① 사업주체는 사업계획승인을 받아야 한다.\n");

        let store = MemoryStore::new();
        let options = BuildOptions {
            source_dir: Some(dir.path().to_path_buf()),
            only: vec!["HOUSING".to_string()],
            ..BuildOptions::default()
        };
        let report = build_graph(&store, &config(), &PlainTextNormalizer::new(), &options).unwrap();

        assert_eq!(report.documents.len(), 3);
        assert_eq!(report.ingested(), 1);
    }

    #[test]
    fn test_build_graph_unknown_law() {
        let options = BuildOptions {
            only: vec!["PARKING".to_string()],
            ..BuildOptions::default()
        };
        let err = build_graph(
            &MemoryStore::new(),
            &config(),
            &PlainTextNormalizer::new(),
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, BuilderError::UnknownLaw(code) if code == "PARKING"));
    }

    #[test]
    fn test_documents_without_articles_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "BUILDING", LawType::Act, "부칙\n이 법은 공포한 날부터 시행한다.\n");

        let options = BuildOptions {
            source_dir: Some(dir.path().to_path_buf()),
            only: vec!["BUILDING".to_string()],
            ..BuildOptions::default()
        };
        let report = build_graph(
            &MemoryStore::new(),
            &config(),
            &PlainTextNormalizer::new(),
            &options,
        )
        .unwrap();

        assert_eq!(report.ingested(), 0);
        assert_eq!(
            report.documents[0].status,
            DocumentStatus::Skipped {
                reason: "no articles found".to_string()
            }
        );
    }
}
