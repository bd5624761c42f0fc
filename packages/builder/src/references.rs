//! Citation classification and resolution.
//!
//! Scans article text for citation patterns and turns them into typed
//! article-to-article edges. Candidates are addressed by uid and only
//! survive resolution when the target article is part of the known universe;
//! anything else (repealed or renumbered articles, unregistered statutes) is
//! dropped silently.

use std::collections::{BTreeMap, HashSet};

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::Result;
use crate::identity::article_uid;
use crate::laws::CrossReferenceTable;
use crate::types::{ArticleRecord, Edge, EdgeKind, LawType};

/// Article citation: `제N조` with optional `의M`.
const ARTICLE_CITATION: &str = r"제([0-9]+)조(?:의([0-9]+))?";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INTERNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARTICLE_CITATION).expect("valid regex"));

/// "법 제N조" in a decree: the parent act.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ACT_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"법\s*{ARTICLE_CITATION}")).expect("valid regex"));

/// "영 제N조" in a rule: the parent decree.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DECREE_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"영\s*{ARTICLE_CITATION}")).expect("valid regex"));

/// How a delegated instrument cites its parent of type `target`.
fn delegation_pattern(target: LawType) -> Option<&'static Regex> {
    match target {
        LawType::Act => Some(&*ACT_CITATION),
        LawType::Decree => Some(&*DECREE_CITATION),
        LawType::Rule => None,
    }
}

/// Rebuild the cited article id from a citation match.
fn cited_article_id(caps: &Captures<'_>) -> Option<String> {
    let number = caps.get(1)?.as_str();
    Some(match caps.get(2) {
        Some(sub) => format!("제{number}조의{}", sub.as_str()),
        None => format!("제{number}조"),
    })
}

/// Resolved citation edges, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    /// `REFERS_TO` edges within one document.
    pub internal: Vec<Edge>,

    /// `DELEGATES_TO` edges from decrees and rules to their parent instrument.
    pub delegates: Vec<Edge>,

    /// `CROSS_REFERS_TO` edges to other statutes' acts.
    pub cross: Vec<Edge>,
}

impl ResolvedReferences {
    /// Edges of one kind.
    #[must_use]
    pub fn edges(&self, kind: EdgeKind) -> &[Edge] {
        match kind {
            EdgeKind::RefersTo => &self.internal,
            EdgeKind::DelegatesTo => &self.delegates,
            EdgeKind::CrossRefersTo => &self.cross,
            EdgeKind::Contains => &[],
        }
    }

    /// Total number of resolved edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.internal.len() + self.delegates.len() + self.cross.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compiled cross-statute pattern: statute name followed by an article id.
#[derive(Debug)]
struct CrossPattern {
    pattern: Regex,
    target: String,
}

/// Classifies citations in article text and resolves them against a set of
/// known articles.
///
/// Cross-statute patterns are compiled once from the [`CrossReferenceTable`]
/// passed at construction.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    cross: BTreeMap<String, Vec<CrossPattern>>,
}

impl ReferenceResolver {
    /// Compile the cross-statute patterns of `table`.
    pub fn new(table: &CrossReferenceTable) -> Result<Self> {
        let mut cross = BTreeMap::new();
        for (source, rules) in table.iter() {
            let patterns = rules
                .iter()
                .map(|rule| -> Result<CrossPattern> {
                    let pattern = format!(
                        r"{}\s*{ARTICLE_CITATION}",
                        regex::escape(rule.statute.trim())
                    );
                    Ok(CrossPattern {
                        pattern: Regex::new(&pattern)?,
                        target: rule.target.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            cross.insert(source.clone(), patterns);
        }
        Ok(Self { cross })
    }

    /// All citation candidates of one article, unvalidated and in text order
    /// per kind.
    ///
    /// Self-references are excluded by comparing the rebuilt article id with
    /// the article's own id, so "제5조" cited from 제5조의2 is a candidate.
    #[must_use]
    pub fn candidates(&self, article: &ArticleRecord) -> Vec<Edge> {
        let mut edges = Vec::new();
        let text = &article.full_text;

        for caps in INTERNAL.captures_iter(text) {
            let Some(id) = cited_article_id(&caps) else {
                continue;
            };
            if id == article.article_id {
                continue;
            }
            edges.push(Edge::citation(
                EdgeKind::RefersTo,
                &article.uid,
                article_uid(&article.law_code, article.law_type, &id),
            ));
        }

        let delegation = article
            .law_type
            .delegation_target()
            .and_then(|target| delegation_pattern(target).map(|pattern| (pattern, target)));
        if let Some((pattern, target_type)) = delegation {
            for caps in pattern.captures_iter(text) {
                if let Some(id) = cited_article_id(&caps) {
                    edges.push(Edge::citation(
                        EdgeKind::DelegatesTo,
                        &article.uid,
                        article_uid(&article.law_code, target_type, &id),
                    ));
                }
            }
        }

        for rule in self.cross.get(&article.law_code).into_iter().flatten() {
            for caps in rule.pattern.captures_iter(text) {
                if let Some(id) = cited_article_id(&caps) {
                    edges.push(Edge::citation(
                        EdgeKind::CrossRefersTo,
                        &article.uid,
                        article_uid(&rule.target, LawType::Act, &id),
                    ));
                }
            }
        }

        edges
    }

    /// Resolve citations across the whole article universe.
    ///
    /// A candidate becomes an edge only when its target uid is one of
    /// `articles`; duplicate candidates collapse to a single edge.
    #[must_use]
    pub fn resolve(&self, articles: &[ArticleRecord]) -> ResolvedReferences {
        let known: HashSet<&str> = articles.iter().map(|a| a.uid.as_str()).collect();
        let mut seen: HashSet<Edge> = HashSet::new();
        let mut resolved = ResolvedReferences::default();
        let mut dropped = 0usize;

        for article in articles {
            for edge in self.candidates(article) {
                if !known.contains(edge.to.as_str()) {
                    dropped += 1;
                    continue;
                }
                if !seen.insert(edge.clone()) {
                    continue;
                }
                match edge.kind {
                    EdgeKind::RefersTo => resolved.internal.push(edge),
                    EdgeKind::DelegatesTo => resolved.delegates.push(edge),
                    EdgeKind::CrossRefersTo => resolved.cross.push(edge),
                    EdgeKind::Contains => {}
                }
            }
        }

        tracing::info!(
            articles = articles.len(),
            internal = resolved.internal.len(),
            delegates = resolved.delegates.len(),
            cross = resolved.cross.len(),
            dropped,
            "Resolved citations"
        );

        resolved
    }
}
