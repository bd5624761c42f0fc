//! Law registry and cross-statute reference table.
//!
//! Both are static configuration: loaded once before parsing begins and
//! passed explicitly to the orchestrator and the reference resolver. A
//! built-in configuration covers the building and land-use statutes; a YAML
//! file can replace it.
//!
//! ```yaml
//! laws:
//!   - code: BUILDING
//!     name: 건축법
//!     sources:
//!       Act: building/act.txt
//!       Decree: building/decree.txt
//!   - code: HOUSING
//!     name: 주택법
//!     labels:
//!       Act: HousingAct
//! cross_references:
//!   BUILDING:
//!     - statute: 주택법
//!       target: HOUSING
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{validate_label, validate_law_code};
use crate::error::{BuilderError, Result};
use crate::types::LawType;

/// Definition of one statute: its act, decree and rule documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawDefinition {
    /// Short code used in uids (e.g., "BUILDING").
    pub code: String,

    /// Official statute name (e.g., "건축법").
    pub name: String,

    /// Label overrides per law type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<LawType, String>,

    /// Explicit source documents per law type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<LawType, PathBuf>,
}

impl LawDefinition {
    /// Create a definition with default labels and no explicit sources.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            labels: BTreeMap::new(),
            sources: BTreeMap::new(),
        }
    }

    /// Set an explicit source document for a law type.
    #[must_use]
    pub fn with_source(mut self, law_type: LawType, path: impl Into<PathBuf>) -> Self {
        self.sources.insert(law_type, path.into());
        self
    }

    /// Law-type-specific label for articles of this statute.
    #[must_use]
    pub fn label(&self, law_type: LawType) -> String {
        self.labels
            .get(&law_type)
            .cloned()
            .unwrap_or_else(|| default_label(&self.code, law_type))
    }

    /// Locate the source document for a law type.
    ///
    /// Explicit sources win; otherwise `<source_dir>/<CODE>/<LawType>.txt`.
    #[must_use]
    pub fn source_path(&self, law_type: LawType, source_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = self.sources.get(&law_type) {
            return Some(path.clone());
        }
        source_dir.map(|dir| {
            dir.join(&self.code)
                .join(format!("{}.txt", law_type.as_str()))
        })
    }

    fn validate(&self) -> Result<()> {
        validate_law_code(&self.code)?;
        for law_type in LawType::ALL {
            validate_label(&self.label(law_type))?;
        }
        Ok(())
    }
}

/// Default law-type label: PascalCase law code followed by the law type.
///
/// # Examples
/// ```
/// use lawgraph_builder::laws::default_label;
/// use lawgraph_builder::types::LawType;
///
/// assert_eq!(default_label("BUILDING_MGMT", LawType::Decree), "BuildingMgmtDecree");
/// ```
#[must_use]
pub fn default_label(code: &str, law_type: LawType) -> String {
    let mut label: String = code
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    label.push_str(law_type.as_str());
    label
}

/// Registry of known statutes, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LawRegistry {
    laws: Vec<LawDefinition>,
}

impl LawRegistry {
    /// Build a registry, rejecting invalid or duplicate codes.
    pub fn new(laws: Vec<LawDefinition>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for law in &laws {
            law.validate()?;
            if !seen.insert(law.code.as_str()) {
                return Err(BuilderError::Config(format!(
                    "duplicate law code: {}",
                    law.code
                )));
            }
        }
        Ok(Self { laws })
    }

    /// Look up a statute by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&LawDefinition> {
        self.laws.iter().find(|law| law.code == code)
    }

    /// All statutes in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &LawDefinition> {
        self.laws.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.laws.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }

    /// Label for articles of `code`/`law_type`, falling back to the default
    /// label for codes missing from the registry.
    #[must_use]
    pub fn label(&self, code: &str, law_type: LawType) -> String {
        self.get(code)
            .map(|law| law.label(law_type))
            .unwrap_or_else(|| default_label(code, law_type))
    }
}

/// One cross-statute citation rule: `statute` written in the text of the
/// source law resolves to the Act of `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Literal statute name as it appears in citing text (e.g., "주택법").
    pub statute: String,

    /// Law code of the cited statute.
    pub target: String,
}

impl CrossReference {
    #[must_use]
    pub fn new(statute: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            statute: statute.into(),
            target: target.into(),
        }
    }
}

/// Cross-statute citation rules keyed by source law code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossReferenceTable {
    entries: BTreeMap<String, Vec<CrossReference>>,
}

impl CrossReferenceTable {
    /// Build a table from `(source_code, rules)` entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, Vec<CrossReference>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Rules applying to articles of `source_code`.
    #[must_use]
    pub fn rules_for(&self, source_code: &str) -> &[CrossReference] {
        self.entries
            .get(source_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All `(source_code, rules)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<CrossReference>)> {
        self.entries.iter()
    }
}

/// On-disk configuration file format.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    laws: Vec<LawDefinition>,
    #[serde(default)]
    cross_references: CrossReferenceTable,
}

/// Complete static configuration: registry plus cross-reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    pub registry: LawRegistry,
    pub cross_references: CrossReferenceTable,
}

impl GraphConfig {
    /// Parse a YAML configuration. Relative source paths are resolved
    /// against `base_dir`.
    pub fn from_yaml(yaml: &str, base_dir: &Path) -> Result<Self> {
        let mut file: ConfigFile = serde_yaml_ng::from_str(yaml)?;

        for law in &mut file.laws {
            for path in law.sources.values_mut() {
                if path.is_relative() {
                    *path = base_dir.join(&*path);
                }
            }
        }

        for (source, rules) in file.cross_references.iter() {
            validate_law_code(source)?;
            for rule in rules {
                validate_law_code(&rule.target)?;
                if rule.statute.trim().is_empty() {
                    return Err(BuilderError::Config(format!(
                        "empty statute name in cross references of {source}"
                    )));
                }
            }
        }

        Ok(Self {
            registry: LawRegistry::new(file.laws)?,
            cross_references: file.cross_references,
        })
    }

    /// Load a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&yaml, base_dir)
    }

    /// Built-in configuration for the building and land-use statutes.
    #[must_use]
    pub fn builtin() -> Self {
        let laws = [
            ("BUILDING", "건축법"),
            ("BUILDING_MGMT", "건축물관리법"),
            ("BUILDING_SERVICE", "건축서비스산업진흥법"),
            ("PARKING", "주차장법"),
            ("LAND_PLAN", "국토의계획및이용에관한법률"),
            ("HOUSING", "주택법"),
            ("GREEN_BUILDING", "녹색건축물조성지원법"),
            ("HANOK", "한옥등건축자산의진흥에관한법률"),
            ("BUILDING_SALE", "건축물의분양에관한법률"),
            ("CONVENIENCE", "장애인노인임산부등의편의증진보장에관한법률"),
        ]
        .into_iter()
        .map(|(code, name)| LawDefinition::new(code, name))
        .collect();

        let rule = |statute: &str, target: &str| CrossReference::new(statute, target);
        let cross_references = CrossReferenceTable::new([
            (
                "BUILDING".to_string(),
                vec![
                    rule("주택법", "HOUSING"),
                    rule("건축물관리법", "BUILDING_MGMT"),
                    rule("국토의계획및이용에관한법률", "LAND_PLAN"),
                    rule("주차장법", "PARKING"),
                ],
            ),
            ("HOUSING".to_string(), vec![rule("건축법", "BUILDING")]),
            ("LAND_PLAN".to_string(), vec![rule("건축법", "BUILDING")]),
        ]);

        Self {
            registry: LawRegistry { laws },
            cross_references,
        }
    }
}
