//! End-to-end tests for the build pipeline.
//!
//! Builds the graph from the text fixtures (building act, decree and rule,
//! housing act) into the in-memory store and checks the resulting hierarchy
//! and citation edges.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use lawgraph_builder::builder::{build_graph, BuildOptions, DocumentStatus};
use lawgraph_builder::laws::GraphConfig;
use lawgraph_builder::loader::link_references;
use lawgraph_builder::normalize::{Normalizer, PlainTextNormalizer};
use lawgraph_builder::parsing::LawParser;
use lawgraph_builder::references::ReferenceResolver;
use lawgraph_builder::store::{GraphStore, MemoryStore};
use lawgraph_builder::types::{EdgeKind, LawType, NodeKind};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn options() -> BuildOptions {
    BuildOptions {
        source_dir: Some(fixtures()),
        only: vec!["BUILDING".to_string(), "HOUSING".to_string()],
        ..BuildOptions::default()
    }
}

fn build(store: &MemoryStore) -> lawgraph_builder::BuildReport {
    build_graph(
        store,
        &GraphConfig::builtin(),
        &PlainTextNormalizer::new(),
        &options(),
    )
    .expect("build should succeed")
}

#[test]
fn test_build_counts() {
    let store = MemoryStore::new();
    let report = build(&store);

    assert_eq!(report.documents.len(), 6);
    assert_eq!(report.ingested(), 4);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 0);
    assert!(report.is_success());

    let stats = store.stats().unwrap();
    assert_eq!(stats.node_count(NodeKind::Article), 8);
    assert_eq!(stats.node_count(NodeKind::Clause), 14);
    assert_eq!(stats.node_count(NodeKind::Item), 7);
    assert_eq!(stats.node_count(NodeKind::Subitem), 3);
    assert_eq!(stats.edge_count(EdgeKind::Contains), 24);
    assert_eq!(stats.edge_count(EdgeKind::RefersTo), 3);
    assert_eq!(stats.edge_count(EdgeKind::DelegatesTo), 3);
    assert_eq!(stats.edge_count(EdgeKind::CrossRefersTo), 2);

    let per_document: Vec<(String, String, usize)> = stats
        .documents
        .iter()
        .map(|d| (d.law_code.clone(), d.law_type.clone(), d.articles))
        .collect();
    assert_eq!(
        per_document,
        vec![
            ("BUILDING".to_string(), "Act".to_string(), 4),
            ("BUILDING".to_string(), "Decree".to_string(), 2),
            ("BUILDING".to_string(), "Rule".to_string(), 1),
            ("HOUSING".to_string(), "Act".to_string(), 1),
        ]
    );
}

#[test]
fn test_missing_documents_are_skipped() {
    let store = MemoryStore::new();
    let report = build(&store);

    let skipped: Vec<(String, LawType)> = report
        .documents
        .iter()
        .filter(|d| matches!(d.status, DocumentStatus::Skipped { .. }))
        .map(|d| (d.law_code.clone(), d.law_type))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("HOUSING".to_string(), LawType::Decree),
            ("HOUSING".to_string(), LawType::Rule),
        ]
    );
}

#[test]
fn test_citation_edges() {
    let store = MemoryStore::new();
    build(&store);

    let expected = [
        (EdgeKind::RefersTo, "BUILDING_Act_제11조", "BUILDING_Act_제2조"),
        (EdgeKind::RefersTo, "BUILDING_Act_제11조의2", "BUILDING_Act_제11조"),
        (EdgeKind::RefersTo, "BUILDING_Decree_제9조", "BUILDING_Decree_제8조"),
        (EdgeKind::DelegatesTo, "BUILDING_Decree_제8조", "BUILDING_Act_제11조"),
        (EdgeKind::DelegatesTo, "BUILDING_Decree_제8조", "BUILDING_Act_제11조의2"),
        (EdgeKind::DelegatesTo, "BUILDING_Rule_제6조", "BUILDING_Decree_제8조"),
        (EdgeKind::CrossRefersTo, "BUILDING_Act_제11조", "HOUSING_Act_제15조"),
        (EdgeKind::CrossRefersTo, "HOUSING_Act_제15조", "BUILDING_Act_제11조"),
    ];
    for (kind, from, to) in expected {
        assert!(
            store.has_edge(kind, from, to).unwrap(),
            "missing {kind} edge {from} -> {to}"
        );
    }

    // 법 제99조 and 주차장법 제19조 point at articles that are not loaded
    assert!(!store
        .has_edge(EdgeKind::DelegatesTo, "BUILDING_Decree_제8조", "BUILDING_Act_제99조")
        .unwrap());
    assert!(!store
        .has_edge(EdgeKind::CrossRefersTo, "BUILDING_Act_제11조", "PARKING_Act_제19조")
        .unwrap());
}

#[test]
fn test_every_child_has_exactly_one_parent() {
    let store = MemoryStore::new();
    build(&store);

    for kind in [NodeKind::Clause, NodeKind::Item, NodeKind::Subitem] {
        for node in store.nodes_by_label(kind.label()).unwrap() {
            assert_eq!(
                store.inbound_count(EdgeKind::Contains, &node.uid).unwrap(),
                1,
                "{} should have one parent",
                node.uid
            );
        }
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    let store = MemoryStore::new();
    build(&store);
    let first = store.stats().unwrap();
    let nodes_before: Vec<_> = [NodeKind::Article, NodeKind::Clause, NodeKind::Subitem]
        .iter()
        .map(|kind| store.nodes_by_label(kind.label()).unwrap())
        .collect();

    build(&store);
    assert_eq!(store.stats().unwrap(), first);
    let nodes_after: Vec<_> = [NodeKind::Article, NodeKind::Clause, NodeKind::Subitem]
        .iter()
        .map(|kind| store.nodes_by_label(kind.label()).unwrap())
        .collect();
    assert_eq!(nodes_after, nodes_before);

    let resolver = ReferenceResolver::new(&GraphConfig::builtin().cross_references).unwrap();
    link_references(&store, &resolver, 2).unwrap();
    assert_eq!(store.stats().unwrap(), first);
}

#[test]
fn test_article_labels() {
    let store = MemoryStore::new();
    build(&store);

    assert_eq!(
        store.labels("BUILDING_Decree_제8조").unwrap(),
        Some(vec!["Article".to_string(), "BuildingDecree".to_string()])
    );
    assert_eq!(
        store.labels("BUILDING_Decree_제8조_①").unwrap(),
        Some(vec!["Clause".to_string()])
    );
    assert_eq!(store.nodes_by_label("HousingAct").unwrap().len(), 1);
}

#[test]
fn test_snapshot_then_link() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("graph.json");

    let store = MemoryStore::new();
    build(&store);
    store.save(&snapshot).unwrap();

    let reloaded = MemoryStore::load(&snapshot).unwrap();
    let resolver = ReferenceResolver::new(&GraphConfig::builtin().cross_references).unwrap();
    let report = link_references(&reloaded, &resolver, 1000).unwrap();

    assert_eq!(report.articles, 8);
    assert_eq!(report.linked(), 8);
    assert_eq!(reloaded.stats().unwrap(), store.stats().unwrap());
}

#[test]
fn test_parse_fixture_hierarchy() {
    let text = PlainTextNormalizer::new()
        .normalize(&fixtures().join("BUILDING").join("Act.txt"))
        .unwrap();
    let document = LawParser::default().parse(&text, "BUILDING", LawType::Act);

    let ids: Vec<&str> = document
        .articles
        .iter()
        .map(|a| a.article_id.as_str())
        .collect();
    assert_eq!(ids, vec!["제1조", "제2조", "제11조", "제11조의2"]);

    let definitions = &document.articles[1];
    assert_eq!(definitions.title, "정의");
    let items = &definitions.clauses[0].items;
    assert_eq!(items.len(), 3);
    let subitems: Vec<&str> = items[2]
        .subitems
        .iter()
        .map(|s| s.subitem_id.as_str())
        .collect();
    assert_eq!(subitems, vec!["가", "나", "다"]);
    assert_eq!(items[2].subitems[1].uid, "BUILDING_Act_제2조_①_3_나");

    // page furniture between pages does not leak into clause text
    assert_eq!(definitions.clauses[1].content, "건축물의 용도는 대통령령으로 정한다.");
}

#[test]
fn test_table_of_contents_does_not_change_articles() {
    let path = fixtures().join("BUILDING").join("Act.txt");
    let with_toc = PlainTextNormalizer::new()
        .with_skip_toc(false)
        .normalize(&path)
        .unwrap();
    let without_toc = PlainTextNormalizer::new().normalize(&path).unwrap();

    assert!(with_toc.contains("제18조(조문 18)"));
    assert!(!without_toc.contains("제18조(조문 18)"));

    let parser = LawParser::default();
    assert_eq!(
        parser.parse(&with_toc, "BUILDING", LawType::Act),
        parser.parse(&without_toc, "BUILDING", LawType::Act)
    );
}
