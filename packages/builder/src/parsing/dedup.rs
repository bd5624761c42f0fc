//! Article deduplication.
//!
//! Overlapping page chunks upstream can capture the same article twice.
//! Candidates are collapsed per article id, keeping the longest body.

use std::collections::HashMap;

use crate::types::Article;

/// Collapse articles sharing an `article_id` into the one with the longest
/// `full_text` (in characters). Ties keep the first candidate seen. The
/// result keeps the order in which each id first appeared.
pub fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let mut unique: Vec<Article> = Vec::with_capacity(articles.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for article in articles {
        match index.get(&article.article_id) {
            Some(&pos) => {
                if article.text_len() > unique[pos].text_len() {
                    tracing::debug!(
                        article_id = %article.article_id,
                        kept_len = article.text_len(),
                        dropped_len = unique[pos].text_len(),
                        "Replacing shorter duplicate article"
                    );
                    unique[pos] = article;
                }
            }
            None => {
                index.insert(article.article_id.clone(), unique.len());
                unique.push(article);
            }
        }
    }

    unique
}
