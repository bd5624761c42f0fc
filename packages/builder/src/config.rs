//! Configuration constants and validation functions for the builder.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{BuilderError, Result};

/// Minimum article body length (in characters) for retaining an article
/// that has no clauses.
///
/// Shorter clause-less matches are usually table-of-contents lines or
/// footnote cross-references rather than real articles.
pub const DEFAULT_MIN_ARTICLE_CHARS: usize = 100;

/// Number of citation edges submitted to the store per request.
pub const DEFAULT_EDGE_BATCH_SIZE: usize = 1000;

/// HTTP timeout in seconds for graph store requests.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default Neo4j HTTP endpoint.
pub const DEFAULT_NEO4J_URI: &str = "http://localhost:7474";

/// Default Neo4j user.
pub const DEFAULT_NEO4J_USER: &str = "neo4j";

/// Default Neo4j database name.
pub const DEFAULT_NEO4J_DATABASE: &str = "neo4j";

/// Clause markers in document order (circled digits 1 through 20).
pub const CLAUSE_MARKERS: [char; 20] = [
    '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩', '⑪', '⑫', '⑬', '⑭', '⑮', '⑯', '⑰', '⑱',
    '⑲', '⑳',
];

/// Law code pattern: upper-case identifier such as `BUILDING_MGMT`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAW_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"));

/// Article id pattern: 제N조 or 제N조의M.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^제[0-9]+조(?:의[0-9]+)?$").expect("valid regex"));

/// Graph label pattern. Labels are interpolated into Cypher, so only plain
/// identifiers are accepted.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LABEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));

/// Validate a law code.
///
/// # Examples
/// ```
/// use lawgraph_builder::config::validate_law_code;
///
/// assert!(validate_law_code("BUILDING_MGMT").is_ok());
/// assert!(validate_law_code("building").is_err());
/// ```
pub fn validate_law_code(code: &str) -> Result<()> {
    if LAW_CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(BuilderError::InvalidLawCode(code.to_string()))
    }
}

/// Check whether a string is a well-formed article id ("제N조" or "제N조의M").
///
/// # Examples
/// ```
/// use lawgraph_builder::config::is_article_id;
///
/// assert!(is_article_id("제11조"));
/// assert!(is_article_id("제5조의2"));
/// assert!(!is_article_id("제5항"));
/// ```
#[must_use]
pub fn is_article_id(id: &str) -> bool {
    ARTICLE_ID_PATTERN.is_match(id)
}

/// Validate a graph label.
pub fn validate_label(label: &str) -> Result<()> {
    if LABEL_PATTERN.is_match(label) {
        Ok(())
    } else {
        Err(BuilderError::InvalidLabel(label.to_string()))
    }
}

/// Connection settings for the Neo4j graph store.
///
/// NOTE: Do NOT derive `Debug` on this struct: it holds the password.
#[derive(Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let password = std::env::var("NEO4J_PASSWORD")
            .map_err(|_| BuilderError::Config("NEO4J_PASSWORD not set".into()))?;

        let uri = std::env::var("NEO4J_URI").unwrap_or_else(|_| DEFAULT_NEO4J_URI.into());
        let user = std::env::var("NEO4J_USER").unwrap_or_else(|_| DEFAULT_NEO4J_USER.into());
        let database =
            std::env::var("NEO4J_DATABASE").unwrap_or_else(|_| DEFAULT_NEO4J_DATABASE.into());

        let timeout_secs: u64 = std::env::var("NEO4J_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        Ok(Self {
            uri: uri.trim_end_matches('/').to_string(),
            user,
            password,
            database,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn new(uri: impl Into<String>, password: impl Into<String>) -> Self {
        let uri: String = uri.into();
        Self {
            uri: uri.trim_end_matches('/').to_string(),
            user: DEFAULT_NEO4J_USER.into(),
            password: password.into(),
            database: DEFAULT_NEO4J_DATABASE.into(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Transactional commit endpoint for the configured database.
    #[must_use]
    pub fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.uri, self.database)
    }
}
