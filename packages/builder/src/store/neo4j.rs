//! Neo4j backend over the HTTP transactional endpoint.
//!
//! Every call is one auto-committed transaction posted to
//! `{uri}/db/{database}/tx/commit`. Labels and relationship types cannot be
//! parameterized in Cypher, so they are validated before being spliced into
//! statement text; all values travel as parameters.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{DocumentArticles, GraphStats, GraphStore, Node, StoredNode};
use crate::config::{validate_label, StoreConfig};
use crate::error::{BuilderError, Result};
use crate::http::{check_status, create_client};
use crate::types::{Edge, EdgeKind, NodeKind};

#[derive(Debug, Serialize)]
struct Statement {
    statement: String,
    parameters: Value,
}

impl Statement {
    fn new(statement: impl Into<String>, parameters: Value) -> Self {
        Self {
            statement: statement.into(),
            parameters,
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: &'a [Statement],
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
    #[serde(default)]
    errors: Vec<QueryError>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    data: Vec<Row>,
}

impl QueryResult {
    /// First column of the first row as a count.
    fn count(&self) -> usize {
        self.data
            .first()
            .and_then(|row| row.row.first())
            .and_then(Value::as_u64)
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}

#[derive(Debug, Deserialize)]
struct Row {
    row: Vec<Value>,
}

/// `[law_code, law_type, count]` row of the per-document statistics query.
fn document_articles(row: &Row) -> Option<DocumentArticles> {
    let [law_code, law_type, count] = row.row.as_slice() else {
        return None;
    };
    Some(DocumentArticles {
        law_code: law_code.as_str()?.to_string(),
        law_type: law_type.as_str()?.to_string(),
        articles: usize::try_from(count.as_u64()?).ok()?,
    })
}

#[derive(Debug, Deserialize)]
struct QueryError {
    code: String,
    message: String,
}

/// Graph store backed by a Neo4j server.
pub struct Neo4jStore {
    client: Client,
    config: StoreConfig,
}

impl Neo4jStore {
    /// Create a store for the configured server. No request is sent until the
    /// first operation.
    pub fn new(config: StoreConfig) -> Result<Self> {
        validate_database(&config.database)?;
        let client = create_client(config.timeout)?;
        Ok(Self { client, config })
    }

    /// Run statements in one transaction and return one result per statement.
    fn run(&self, statements: &[Statement]) -> Result<Vec<QueryResult>> {
        let response = self
            .client
            .post(self.config.commit_url())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&CommitRequest { statements })
            .send()?;

        let body: CommitResponse = check_status(response)?.json()?;
        if let Some(error) = body.errors.into_iter().next() {
            return Err(BuilderError::StoreQuery {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.results)
    }

    fn run_one(&self, statement: Statement) -> Result<QueryResult> {
        Ok(self.run(&[statement])?.into_iter().next().unwrap_or_default())
    }
}

fn validate_database(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(BuilderError::Config(format!("invalid database name: {name}")))
    }
}

/// Cypher label expression, e.g. `:Article:BuildingAct`.
fn label_expr(labels: &[&str]) -> Result<String> {
    let mut expr = String::new();
    for label in labels {
        validate_label(label)?;
        expr.push(':');
        expr.push_str(label);
    }
    Ok(expr)
}

/// Edge merge for one `(kind, from_kind, to_kind)` group.
fn merge_edges_statement(kind: EdgeKind, from: NodeKind, to: NodeKind, edges: &[&Edge]) -> Statement {
    let batch: Vec<Value> = edges
        .iter()
        .map(|e| json!({ "from": e.from, "to": e.to }))
        .collect();
    Statement::new(
        format!(
            "UNWIND $batch AS row \
             MATCH (a:{} {{uid: row.from}}) \
             MATCH (b:{} {{uid: row.to}}) \
             MERGE (a)-[:{}]->(b) \
             RETURN count(*) AS matched",
            from.label(),
            to.label(),
            kind.as_str()
        ),
        json!({ "batch": batch }),
    )
}

impl GraphStore for Neo4jStore {
    fn create_indexes(&self) -> Result<()> {
        let mut indexes: Vec<(NodeKind, &str)> =
            NodeKind::ALL.iter().map(|kind| (*kind, "uid")).collect();
        indexes.push((NodeKind::Article, "article_id"));
        indexes.push((NodeKind::Article, "law_code"));

        // Schema statements go one per transaction.
        for (kind, property) in indexes {
            let name = format!("{}_{property}", kind.label().to_lowercase());
            self.run_one(Statement::new(
                format!(
                    "CREATE INDEX {name} IF NOT EXISTS FOR (n:{}) ON (n.{property})",
                    kind.label()
                ),
                json!({}),
            ))?;
        }
        tracing::info!("Ensured graph indexes");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.run_one(Statement::new("MATCH (n) DETACH DELETE n", json!({})))?;
        tracing::info!("Cleared graph store");
        Ok(())
    }

    fn upsert_node(&self, node: &Node<'_>) -> Result<()> {
        let labels = label_expr(&node.labels())?;
        self.run_one(Statement::new(
            format!("MERGE (n{labels} {{uid: $uid}}) SET n += $props"),
            json!({ "uid": node.uid(), "props": Value::Object(node.properties()) }),
        ))?;
        Ok(())
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        Ok(self.upsert_edges(std::slice::from_ref(edge))? > 0)
    }

    fn upsert_edges(&self, edges: &[Edge]) -> Result<usize> {
        if edges.is_empty() {
            return Ok(0);
        }

        let mut groups: BTreeMap<(EdgeKind, NodeKind, NodeKind), Vec<&Edge>> = BTreeMap::new();
        for edge in edges {
            groups
                .entry((edge.kind, edge.from_kind, edge.to_kind))
                .or_default()
                .push(edge);
        }

        let statements: Vec<Statement> = groups
            .iter()
            .map(|(&(kind, from, to), group)| merge_edges_statement(kind, from, to, group))
            .collect();

        let results = self.run(&statements)?;
        Ok(results.iter().map(QueryResult::count).sum())
    }

    fn nodes_by_label(&self, label: &str) -> Result<Vec<StoredNode>> {
        validate_label(label)?;
        let result = self.run_one(Statement::new(
            format!("MATCH (n:{label}) RETURN n.uid AS uid, properties(n) AS props"),
            json!({}),
        ))?;

        let mut nodes = Vec::with_capacity(result.data.len());
        for row in result.data {
            let mut columns = row.row.into_iter();
            let (Some(Value::String(uid)), Some(props)) = (columns.next(), columns.next()) else {
                tracing::warn!(label, "Skipping node without uid");
                continue;
            };
            let properties = match props {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            nodes.push(StoredNode { uid, properties });
        }

        tracing::debug!(label, count = nodes.len(), "Fetched nodes");
        Ok(nodes)
    }

    fn stats(&self) -> Result<GraphStats> {
        let mut statements: Vec<Statement> = NodeKind::ALL
            .iter()
            .map(|kind| {
                Statement::new(
                    format!("MATCH (n:{}) RETURN count(n)", kind.label()),
                    json!({}),
                )
            })
            .collect();
        statements.extend(EdgeKind::ALL.iter().map(|kind| {
            Statement::new(
                format!("MATCH ()-[r:{}]->() RETURN count(r)", kind.as_str()),
                json!({}),
            )
        }));
        statements.push(Statement::new(
            "MATCH (n:Article) \
             RETURN n.law_code AS law_code, n.law_type AS law_type, count(n) AS articles \
             ORDER BY law_code, law_type",
            json!({}),
        ));

        let results = self.run(&statements)?;
        let count_at = |i: usize| results.get(i).map_or(0, QueryResult::count);

        let mut stats = GraphStats::default();
        for (i, kind) in NodeKind::ALL.iter().enumerate() {
            stats.nodes.insert(*kind, count_at(i));
        }
        for (i, kind) in EdgeKind::ALL.iter().enumerate() {
            stats.edges.insert(*kind, count_at(NodeKind::ALL.len() + i));
        }
        if let Some(per_document) = results.get(NodeKind::ALL.len() + EdgeKind::ALL.len()) {
            stats.documents = per_document.data.iter().filter_map(document_articles).collect();
        }
        Ok(stats)
    }
}
