//! In-memory graph store with JSON snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DocumentArticles, GraphStats, GraphStore, Node, StoredNode};
use crate::error::{BuilderError, Result};
use crate::types::{Edge, EdgeKind, NodeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MemoryNode {
    kind: NodeKind,
    labels: BTreeSet<String>,
    properties: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryGraph {
    nodes: BTreeMap<String, MemoryNode>,
    edges: BTreeSet<(EdgeKind, String, String)>,
}

/// Graph store backed by in-process maps.
///
/// Mirrors the merge semantics of the Neo4j backend: nodes are keyed on uid,
/// edges are a set and only materialize between existing endpoints of the
/// expected kinds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: Mutex<MemoryGraph>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryGraph>> {
        self.graph
            .lock()
            .map_err(|e| BuilderError::StoreUnavailable(format!("memory store lock poisoned: {e}")))
    }

    /// Load a snapshot written by [`MemoryStore::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let graph: MemoryGraph = serde_json::from_reader(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), nodes = graph.nodes.len(), "Loaded snapshot");
        Ok(Self {
            graph: Mutex::new(graph),
        })
    }

    /// Load a snapshot if `path` exists, otherwise start empty.
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write the whole graph to `path` as JSON.
    ///
    /// The snapshot is written to a temporary sibling and renamed into place,
    /// so a failed or interrupted save leaves the previous snapshot intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let graph = self.lock()?;
        let content = serde_json::to_vec_pretty(&*graph)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.json".to_string());
        let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

        {
            let mut file = File::create(&temp_file)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path)?;
        }

        fs::rename(&temp_file, path)?;
        tracing::info!(path = %path.display(), nodes = graph.nodes.len(), edges = graph.edges.len(), "Saved snapshot");
        Ok(())
    }

    /// Whether an edge of `kind` connects `from` to `to`.
    pub fn has_edge(&self, kind: EdgeKind, from: &str, to: &str) -> Result<bool> {
        let graph = self.lock()?;
        Ok(graph
            .edges
            .contains(&(kind, from.to_string(), to.to_string())))
    }

    /// Number of edges of `kind` pointing at `uid`.
    pub fn inbound_count(&self, kind: EdgeKind, uid: &str) -> Result<usize> {
        let graph = self.lock()?;
        Ok(graph
            .edges
            .iter()
            .filter(|(k, _, to)| *k == kind && to == uid)
            .count())
    }

    /// Labels of the node stored under `uid`.
    pub fn labels(&self, uid: &str) -> Result<Option<Vec<String>>> {
        let graph = self.lock()?;
        Ok(graph
            .nodes
            .get(uid)
            .map(|node| node.labels.iter().cloned().collect()))
    }
}

fn endpoint_matches(graph: &MemoryGraph, uid: &str, kind: NodeKind) -> bool {
    graph.nodes.get(uid).is_some_and(|node| node.kind == kind)
}

impl GraphStore for MemoryStore {
    fn create_indexes(&self) -> Result<()> {
        // Lookups are already keyed on uid.
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut graph = self.lock()?;
        graph.nodes.clear();
        graph.edges.clear();
        Ok(())
    }

    fn upsert_node(&self, node: &Node<'_>) -> Result<()> {
        let mut graph = self.lock()?;
        let entry = graph
            .nodes
            .entry(node.uid().to_string())
            .or_insert_with(|| MemoryNode {
                kind: node.kind(),
                labels: BTreeSet::new(),
                properties: Map::new(),
            });
        entry
            .labels
            .extend(node.labels().into_iter().map(str::to_string));
        entry.properties.extend(node.properties());
        Ok(())
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let mut graph = self.lock()?;
        if !endpoint_matches(&graph, &edge.from, edge.from_kind)
            || !endpoint_matches(&graph, &edge.to, edge.to_kind)
        {
            return Ok(false);
        }
        graph
            .edges
            .insert((edge.kind, edge.from.clone(), edge.to.clone()));
        Ok(true)
    }

    fn nodes_by_label(&self, label: &str) -> Result<Vec<StoredNode>> {
        let graph = self.lock()?;
        Ok(graph
            .nodes
            .iter()
            .filter(|(_, node)| node.labels.contains(label))
            .map(|(uid, node)| StoredNode {
                uid: uid.clone(),
                properties: node.properties.clone(),
            })
            .collect())
    }

    fn stats(&self) -> Result<GraphStats> {
        let graph = self.lock()?;
        let mut stats = GraphStats::default();
        for kind in NodeKind::ALL {
            stats.nodes.insert(kind, 0);
        }
        for kind in EdgeKind::ALL {
            stats.edges.insert(kind, 0);
        }
        for node in graph.nodes.values() {
            *stats.nodes.entry(node.kind).or_default() += 1;
        }
        for (kind, _, _) in &graph.edges {
            *stats.edges.entry(*kind).or_default() += 1;
        }

        let mut documents: BTreeMap<(String, String), usize> = BTreeMap::new();
        for node in graph.nodes.values().filter(|n| n.kind == NodeKind::Article) {
            let property = |key: &str| {
                node.properties
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            *documents
                .entry((property("law_code"), property("law_type")))
                .or_default() += 1;
        }
        stats.documents = documents
            .into_iter()
            .map(|((law_code, law_type), articles)| DocumentArticles {
                law_code,
                law_type,
                articles,
            })
            .collect();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Article, Clause, LawType};
    use pretty_assertions::assert_eq;

    fn article(id: &str, text: &str) -> Article {
        Article {
            uid: format!("BUILDING_Act_{id}"),
            article_id: id.to_string(),
            title: "제목".to_string(),
            law_code: "BUILDING".to_string(),
            law_type: LawType::Act,
            full_text: text.to_string(),
            clauses: Vec::new(),
        }
    }

    fn upsert_article(store: &MemoryStore, article: &Article) {
        store
            .upsert_node(&Node::Article {
                article,
                law_label: "BuildingAct",
            })
            .unwrap();
    }

    #[test]
    fn test_upsert_node_overwrites_content() {
        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "처음"));
        upsert_article(&store, &article("제1조", "수정"));

        let nodes = store.nodes_by_label("Article").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].properties["full_text"], "수정");
        assert_eq!(
            store.labels("BUILDING_Act_제1조").unwrap(),
            Some(vec!["Article".to_string(), "BuildingAct".to_string()])
        );
    }

    #[test]
    fn test_edge_requires_both_endpoints() {
        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));

        let dangling = Edge::citation(EdgeKind::RefersTo, "BUILDING_Act_제1조", "BUILDING_Act_제9조");
        assert!(!store.upsert_edge(&dangling).unwrap());
        assert_eq!(store.stats().unwrap().edge_count(EdgeKind::RefersTo), 0);
    }

    #[test]
    fn test_edge_endpoint_kind_must_match() {
        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));
        upsert_article(&store, &article("제2조", "본문"));

        let wrong_kind = Edge::contains(
            NodeKind::Article,
            "BUILDING_Act_제1조",
            NodeKind::Clause,
            "BUILDING_Act_제2조",
        );
        assert!(!store.upsert_edge(&wrong_kind).unwrap());
    }

    #[test]
    fn test_edges_are_a_set() {
        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));
        upsert_article(&store, &article("제2조", "본문"));

        let edge = Edge::citation(EdgeKind::RefersTo, "BUILDING_Act_제2조", "BUILDING_Act_제1조");
        assert_eq!(store.upsert_edges(&[edge.clone(), edge.clone()]).unwrap(), 2);
        assert!(store.upsert_edge(&edge).unwrap());

        assert_eq!(store.stats().unwrap().edge_count(EdgeKind::RefersTo), 1);
        assert!(store
            .has_edge(EdgeKind::RefersTo, "BUILDING_Act_제2조", "BUILDING_Act_제1조")
            .unwrap());
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));
        store.clear().unwrap();
        assert_eq!(store.stats().unwrap().node_count(NodeKind::Article), 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph").join("snapshot.json");

        let store = MemoryStore::new();
        let parent = article("제1조", "본문");
        let clause = Clause {
            uid: "BUILDING_Act_제1조_①".to_string(),
            clause_id: "①".to_string(),
            content: "항".to_string(),
            law_code: "BUILDING".to_string(),
            law_type: LawType::Act,
            items: Vec::new(),
        };
        upsert_article(&store, &parent);
        store.upsert_node(&Node::Clause(&clause)).unwrap();
        store
            .upsert_edge(&Edge::contains(
                NodeKind::Article,
                &parent.uid,
                NodeKind::Clause,
                &clause.uid,
            ))
            .unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::open(&path).unwrap();
        let stats = loaded.stats().unwrap();
        assert_eq!(stats, store.stats().unwrap());
        assert_eq!(
            stats.documents,
            vec![DocumentArticles {
                law_code: "BUILDING".to_string(),
                law_type: "Act".to_string(),
                articles: 1,
            }]
        );
        assert_eq!(loaded.inbound_count(EdgeKind::Contains, &clause.uid).unwrap(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));
        store.save(&path).unwrap();

        // The temporary sibling cannot be created when a directory holds its name.
        fs::create_dir(dir.path().join(".snapshot.json.tmp")).unwrap();
        upsert_article(&store, &article("제2조", "본문"));
        assert!(store.save(&path).is_err());

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.stats().unwrap().node_count(NodeKind::Article), 1);
    }

    #[test]
    fn test_save_replaces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let store = MemoryStore::new();
        upsert_article(&store, &article("제1조", "본문"));
        store.save(&path).unwrap();
        upsert_article(&store, &article("제2조", "본문"));
        store.save(&path).unwrap();

        assert!(!dir.path().join(".snapshot.json.tmp").exists());
        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.stats().unwrap().node_count(NodeKind::Article), 2);
    }

    #[test]
    fn test_open_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.stats().unwrap().node_count(NodeKind::Article), 0);
    }
}
