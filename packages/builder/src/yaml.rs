//! YAML output for parsed documents.
//!
//! Lets a parse be inspected or diffed without a graph store: the `parse`
//! command writes the full article hierarchy of one document.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;
use crate::types::{Article, Document, DocumentCounts, LawType};

#[derive(Debug, Serialize)]
struct YamlDocument<'a> {
    law_code: &'a str,
    law_type: LawType,
    generated_at: String,
    counts: DocumentCounts,
    articles: &'a [Article],
}

/// Render a parsed document as YAML with a document start marker.
pub fn generate_yaml(document: &Document, generated_at: DateTime<Local>) -> Result<String> {
    let yaml_struct = YamlDocument {
        law_code: &document.law_code,
        law_type: document.law_type,
        generated_at: generated_at.to_rfc3339(),
        counts: document.counts(),
        articles: &document.articles,
    };
    let yaml_string = serde_yaml_ng::to_string(&yaml_struct)?;

    let lines: Vec<&str> = yaml_string.lines().map(str::trim_end).collect();
    Ok(format!("---\n{}\n", lines.join("\n")))
}

/// Write a parsed document to `path`.
///
/// Writes to a temporary sibling first and renames it into place, so an
/// interrupted write never leaves a truncated file behind.
pub fn save_yaml(document: &Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = generate_yaml(document, Local::now())?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.yaml".to_string());
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    tracing::info!(path = %path.display(), articles = document.articles.len(), "Saved YAML");
    Ok(())
}
