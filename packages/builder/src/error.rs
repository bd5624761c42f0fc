//! Error types for the graph builder.
//!
//! `BuilderError` is the single error type surfaced to library consumers.
//! Parse ambiguity and unresolved citations are not errors and never appear
//! here; they are handled by dropping text or edge candidates.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the builder library.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Invalid law code format.
    #[error("Invalid law code: '{0}'. Expected upper-case letters, digits and underscores (e.g., BUILDING_MGMT)")]
    InvalidLawCode(String),

    /// Unrecognized law type.
    #[error("Invalid law type: '{0}'. Expected Act, Decree or Rule")]
    InvalidLawType(String),

    /// Graph label that cannot be used as a node label.
    #[error("Invalid graph label: '{0}'. Expected an identifier such as BuildingAct")]
    InvalidLabel(String),

    /// Law code missing from the registry.
    #[error("Unknown law code: {0}")]
    UnknownLaw(String),

    /// Source document does not exist.
    #[error("Source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Source document normalized to an empty string.
    #[error("Source document is empty after normalization: {}", .0.display())]
    EmptyDocument(PathBuf),

    /// HTTP request to the graph store failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Graph store answered with a non-success status.
    #[error("Graph store returned status {status}: {message}")]
    StoreStatus { status: u16, message: String },

    /// Graph store rejected a statement.
    #[error("Graph store query failed ({code}): {message}")]
    StoreQuery { code: String, message: String },

    /// Graph store is not usable (e.g. a poisoned lock).
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored node lacks a property the builder relies on.
    #[error("Node {uid} is missing property '{property}'")]
    MissingProperty { uid: String, property: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A citation pattern failed to compile.
    #[error("Invalid citation pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, BuilderError>;
