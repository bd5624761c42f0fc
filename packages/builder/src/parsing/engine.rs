//! Parser that segments normalized statute text into the article hierarchy.

use regex::Regex;
use std::sync::LazyLock;

use super::dedup::deduplicate;
use super::strategy::{duplicate_ids, split_list, ItemMarker, SubitemMarker};
use super::types::ParserConfig;
use crate::config::CLAUSE_MARKERS;
use crate::identity::{article_uid, child_uid};
use crate::types::{Article, Clause, Document, Item, LawType, Subitem};

/// Article header at a line start: `제N조[의M](title)`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\A|\n)(제[0-9]+조(?:의[0-9]+)?)\(([^)]+)\)").expect("valid regex")
});

/// Parser for Korean statute text.
///
/// Produces `Article → Clause → Item → Subitem` records with uids assigned.
/// Segmentation never fails: text that does not match the next level's
/// markers is simply not segmented further.
#[derive(Debug, Clone, Default)]
pub struct LawParser {
    config: ParserConfig,
}

impl LawParser {
    /// Create a new parser.
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a normalized document and resolve duplicate articles.
    pub fn parse(&self, text: &str, law_code: &str, law_type: LawType) -> Document {
        let candidates = self.segment_articles(text, law_code, law_type);
        let found = candidates.len();
        let articles = deduplicate(candidates);

        tracing::info!(
            law_code,
            law_type = %law_type,
            articles = articles.len(),
            duplicates = found - articles.len(),
            "Parsed document"
        );

        Document {
            law_code: law_code.to_string(),
            law_type,
            articles,
        }
    }

    /// Find all article candidates in document order, before deduplication.
    ///
    /// A candidate is kept when it has at least one clause or its body is
    /// longer than [`ParserConfig::min_article_chars`].
    pub fn segment_articles(&self, text: &str, law_code: &str, law_type: LawType) -> Vec<Article> {
        let headers: Vec<_> = ARTICLE_HEADER.captures_iter(text).collect();
        let mut articles = Vec::new();

        for (i, caps) in headers.iter().enumerate() {
            let (Some(whole), Some(id), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            let body = text[whole.start()..end].trim();

            let uid = article_uid(law_code, law_type, id.as_str());
            let clauses = parse_clauses(body, &uid, law_code, law_type);

            if clauses.is_empty() && body.chars().count() <= self.config.min_article_chars {
                tracing::debug!(
                    article_id = id.as_str(),
                    len = body.chars().count(),
                    "Skipping short article without clauses"
                );
                continue;
            }

            articles.push(Article {
                uid,
                article_id: id.as_str().to_string(),
                title: title.as_str().to_string(),
                law_code: law_code.to_string(),
                law_type,
                full_text: body.to_string(),
                clauses,
            });
        }

        articles
    }
}

/// Split an article body on circled-digit markers.
///
/// Text before the first marker (the article header and any lead-in)
/// belongs to no clause; clauses whose trimmed body is empty are dropped.
fn parse_clauses(body: &str, article_uid: &str, law_code: &str, law_type: LawType) -> Vec<Clause> {
    let markers: Vec<(usize, char)> = body
        .char_indices()
        .filter(|(_, c)| CLAUSE_MARKERS.contains(c))
        .collect();

    let mut clauses = Vec::new();
    for (i, &(pos, marker)) in markers.iter().enumerate() {
        let start = pos + marker.len_utf8();
        let end = markers.get(i + 1).map_or(body.len(), |&(next, _)| next);
        let content = body[start..end].trim();
        if content.is_empty() {
            continue;
        }

        let clause_id = marker.to_string();
        let uid = child_uid(article_uid, &clause_id);
        let items = parse_items(content, &uid, law_code, law_type);

        clauses.push(Clause {
            uid,
            clause_id,
            content: content.to_string(),
            law_code: law_code.to_string(),
            law_type,
            items,
        });
    }

    warn_shared_uids(article_uid, clauses.iter().map(|c| c.clause_id.as_str()));
    clauses
}

/// Log sibling ids under `parent_uid` that would collapse into one node.
fn warn_shared_uids<'a>(parent_uid: &str, ids: impl IntoIterator<Item = &'a str>) {
    let duplicates = duplicate_ids(ids);
    if !duplicates.is_empty() {
        tracing::warn!(
            parent = parent_uid,
            ids = ?duplicates,
            "Repeated markers share a uid; later entries overwrite earlier ones"
        );
    }
}

fn parse_items(content: &str, clause_uid: &str, law_code: &str, law_type: LawType) -> Vec<Item> {
    let entries = split_list(content, &ItemMarker);
    warn_shared_uids(clause_uid, entries.iter().map(|e| e.id.as_str()));

    entries
        .into_iter()
        .map(|entry| {
            let uid = child_uid(clause_uid, &entry.id);
            let subentries = split_list(&entry.text, &SubitemMarker);
            warn_shared_uids(&uid, subentries.iter().map(|e| e.id.as_str()));
            let subitems = subentries
                .into_iter()
                .map(|sub| Subitem {
                    uid: child_uid(&uid, &sub.id),
                    subitem_id: sub.id,
                    content: sub.text,
                    law_code: law_code.to_string(),
                    law_type,
                })
                .collect();

            Item {
                uid,
                item_id: entry.id,
                content: entry.text,
                law_code: law_code.to_string(),
                law_type,
                subitems,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> LawParser {
        LawParser::new(ParserConfig::default())
    }

    #[test]
    fn test_parse_full_hierarchy() {
        let text = "\n제11조(건축허가)\n①건축물을 건축하려는 자는 허가를 받아야 한다.\n1. 제1호\n가. 목 내용\n";
        let doc = parser().parse(text, "BUILDING", LawType::Act);

        assert_eq!(doc.articles.len(), 1);
        let article = &doc.articles[0];
        assert_eq!(article.article_id, "제11조");
        assert_eq!(article.title, "건축허가");
        assert_eq!(article.uid, "BUILDING_Act_제11조");

        assert_eq!(article.clauses.len(), 1);
        let clause = &article.clauses[0];
        assert_eq!(clause.clause_id, "①");
        assert_eq!(clause.uid, "BUILDING_Act_제11조_①");

        assert_eq!(clause.items.len(), 1);
        let item = &clause.items[0];
        assert_eq!(item.item_id, "1");
        assert_eq!(item.content, "1. 제1호\n가. 목 내용");

        assert_eq!(item.subitems.len(), 1);
        let subitem = &item.subitems[0];
        assert_eq!(subitem.subitem_id, "가");
        assert_eq!(subitem.content, "가. 목 내용");
        assert_eq!(subitem.uid, "BUILDING_Act_제11조_①_1_가");
    }

    #[test]
    fn test_clauses_in_order_without_overlap() {
        let text = "\n제2조(정의)\n① 첫째 항이다.\n② 둘째 항이다.\n③ 셋째 항이다.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);
        let clauses = &doc.articles[0].clauses;

        let ids: Vec<&str> = clauses.iter().map(|c| c.clause_id.as_str()).collect();
        assert_eq!(ids, vec!["①", "②", "③"]);
        assert_eq!(clauses[0].content, "첫째 항이다.");
        assert_eq!(clauses[1].content, "둘째 항이다.");
        assert_eq!(clauses[2].content, "셋째 항이다.");
    }

    #[test]
    fn test_article_body_runs_to_next_header() {
        let text = "\n제1조(목적)\n① 이 법은 목적을 정한다.\n제2조(정의)\n① 용어의 뜻은 다음과 같다.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);

        assert_eq!(doc.articles.len(), 2);
        assert_eq!(doc.articles[0].full_text, "제1조(목적)\n① 이 법은 목적을 정한다.");
        assert_eq!(doc.articles[1].full_text, "제2조(정의)\n① 용어의 뜻은 다음과 같다.");
    }

    #[test]
    fn test_sub_numbered_article_id() {
        let text = "\n제5조의2(특례)\n① 특례를 둔다.";
        let doc = parser().parse(text, "BUILDING", LawType::Decree);
        assert_eq!(doc.articles[0].article_id, "제5조의2");
        assert_eq!(doc.articles[0].uid, "BUILDING_Decree_제5조의2");
    }

    #[test]
    fn test_short_article_without_clauses_is_dropped() {
        let text = "\n제3조(적용 제외)\n삭제 <2020. 1. 1.>";
        assert!(parser().parse(text, "BUILDING", LawType::Act).articles.is_empty());
    }

    #[test]
    fn test_min_article_chars_is_tunable() {
        let text = "\n제3조(적용 제외)\n이 조는 항 없이 작성된 본문이다.";
        let lenient = LawParser::new(ParserConfig::default().with_min_article_chars(10));
        let doc = lenient.parse(text, "BUILDING", LawType::Act);

        assert_eq!(doc.articles.len(), 1);
        assert!(doc.articles[0].clauses.is_empty());
    }

    #[test]
    fn test_long_plain_article_is_kept() {
        let body = "가".repeat(120);
        let text = format!("\n제4조(본문)\n{body}");
        let doc = parser().parse(&text, "BUILDING", LawType::Act);
        assert_eq!(doc.articles.len(), 1);
        assert!(doc.articles[0].clauses.is_empty());
    }

    #[test]
    fn test_inline_reference_is_not_an_article_header() {
        let text = "\n제7조(허가)\n① 제6조(신고)에 따른 신고를 한 자는 허가를 받은 것으로 본다.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);
        assert_eq!(doc.articles.len(), 1);
        assert_eq!(doc.articles[0].article_id, "제7조");
    }

    #[test]
    fn test_header_at_start_of_text() {
        let text = "제1조(목적)\n① 이 법은 목적을 정한다.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);
        assert_eq!(doc.articles.len(), 1);
    }

    #[test]
    fn test_duplicate_articles_keep_longer_body() {
        let text = "\n제5조(정의)\n① 짧다.\n제5조(정의)\n① 이쪽 본문이 더 길다.\n② 둘째 항.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);

        assert_eq!(doc.articles.len(), 1);
        assert_eq!(doc.articles[0].clauses.len(), 2);
    }

    #[test]
    fn test_empty_clause_bodies_are_discarded() {
        let text = "\n제8조(삭제)\n①\n② 남은 항.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);
        let ids: Vec<&str> = doc.articles[0]
            .clauses
            .iter()
            .map(|c| c.clause_id.as_str())
            .collect();
        assert_eq!(ids, vec!["②"]);
    }

    #[test]
    fn test_clause_without_items() {
        let text = "\n제9조(준용)\n① 이 조에는 호가 없다.";
        let doc = parser().parse(text, "BUILDING", LawType::Act);
        assert!(doc.articles[0].clauses[0].items.is_empty());
    }

    #[test]
    fn test_no_headers_yields_empty_document() {
        let doc = parser().parse("본문만 있는 문서", "BUILDING", LawType::Rule);
        assert!(doc.articles.is_empty());
        assert_eq!(doc.law_type, LawType::Rule);
    }

    #[test]
    fn test_restarted_item_list_keeps_both_entries() {
        let text = "\n제20조(가설건축물)\n① 다음 각 호의 건축물은 신고하여야 한다.\n\
                    1. 첫째 기준\n2. 둘째 기준\n다만, 다음 각 호는 제외한다.\n1. 재해복구\n2. 임시건축물\n";
        let doc = parser().parse(text, "BUILDING", LawType::Act);

        let items = &doc.articles[0].clauses[0].items;
        let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "1", "2"]);
        assert_eq!(items[0].uid, items[2].uid);
        assert_eq!(duplicate_ids(ids), vec!["1", "2"]);
    }
}
