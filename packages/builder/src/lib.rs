//! Lawgraph Builder - Turn Korean statute text into a knowledge graph.
//!
//! This crate segments normalized statute text (acts, enforcement decrees
//! and enforcement rules) into an `Article → Clause → Item → Subitem`
//! hierarchy, resolves citations between articles, and writes both into a
//! graph store with idempotent upserts.
//!
//! # Example
//!
//! ```
//! use lawgraph_builder::parsing::LawParser;
//! use lawgraph_builder::types::LawType;
//!
//! let text = "\n제11조(건축허가)\n①건축물을 건축하려는 자는 허가를 받아야 한다.\n1. 제1호\n가. 목 내용\n";
//! let document = LawParser::default().parse(text, "BUILDING", LawType::Act);
//!
//! let article = &document.articles[0];
//! assert_eq!(article.uid, "BUILDING_Act_제11조");
//! assert_eq!(article.clauses[0].items[0].subitems[0].subitem_id, "가");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, validation and store connection settings
//! - [`types`]: Core data types (Article, Clause, Edge, etc.)
//! - [`error`]: Error types and Result alias
//! - [`identity`]: Deterministic uids
//! - [`normalize`]: Page-noise removal for extracted text
//! - [`parsing`]: Hierarchical parser and deduplication
//! - [`laws`]: Law registry and cross-reference table
//! - [`references`]: Citation classification and resolution
//! - [`store`]: Graph store trait with memory and Neo4j backends
//! - [`http`]: HTTP client for the Neo4j backend
//! - [`loader`]: Node and edge upsert protocol
//! - [`builder`]: Build service over all registered statutes
//! - [`yaml`]: YAML output of parsed documents
//! - [`cli`]: Command-line interface

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod laws;
pub mod loader;
pub mod normalize;
pub mod parsing;
pub mod references;
pub mod store;
pub mod types;
pub mod yaml;

// Re-export main functions
pub use builder::{build_graph, BuildOptions, BuildReport};
pub use loader::{ingest_document, link_references};

// Re-export commonly used items
pub use error::{BuilderError, Result};
pub use laws::{CrossReferenceTable, GraphConfig, LawRegistry};
pub use parsing::LawParser;
pub use references::ReferenceResolver;
pub use store::{GraphStore, MemoryStore, Neo4jStore};
pub use types::{Article, Clause, Document, Edge, EdgeKind, Item, LawType, NodeKind, Subitem};
