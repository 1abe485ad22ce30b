// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration types for the PII redactor

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::{RedactorError, Result};

/// Entity categories produced by an entity source
///
/// The set is open: labels the redactor has no name for are kept verbatim
/// in [`Category::Other`] and pass through unless explicitly allow-listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Person,
    Org,
    Gpe,
    Loc,
    Date,
    Email,
    Phone,
    Ssn,
    Other(String),
}

impl Category {
    /// Categories redacted when no allow-list is configured
    pub const DEFAULT_ALLOWED: [Category; 8] = [
        Category::Person,
        Category::Gpe,
        Category::Email,
        Category::Org,
        Category::Loc,
        Category::Date,
        Category::Phone,
        Category::Ssn,
    ];

    /// Parse an entity label (case-insensitive for known labels)
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_uppercase().as_str() {
            "PERSON" => Category::Person,
            "ORG" => Category::Org,
            "GPE" => Category::Gpe,
            "LOC" => Category::Loc,
            "DATE" => Category::Date,
            "EMAIL" => Category::Email,
            "PHONE" => Category::Phone,
            "SSN" => Category::Ssn,
            _ => Category::Other(label.to_string()),
        }
    }

    /// Label used in placeholders and mapping entries
    pub fn as_str(&self) -> &str {
        match self {
            Category::Person => "PERSON",
            Category::Org => "ORG",
            Category::Gpe => "GPE",
            Category::Loc => "LOC",
            Category::Date => "DATE",
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Ssn => "SSN",
            Category::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::from_label(label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Set of categories eligible for redaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    categories: HashSet<Category>,
}

impl AllowList {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(Category::DEFAULT_ALLOWED)
    }
}

/// Custom detection pattern supplied through configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    pub pattern: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Configuration for the redactor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactorConfig {
    // Categories eligible for redaction
    pub allowed_categories: Vec<Category>,

    // Built-in pattern detection flags
    pub detect_email: bool,
    pub detect_phone: bool,
    pub detect_ssn: bool,
    pub detect_date: bool,

    pub custom_patterns: Vec<CustomPattern>,

    // Whitelist patterns (regex strings)
    pub whitelist_patterns: Vec<String>,

    /// External entity recognizer: program followed by its arguments
    pub ner_command: Option<Vec<String>>,

    pub mapping_file: Option<PathBuf>,

    pub log_detections: bool,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            allowed_categories: Category::DEFAULT_ALLOWED.to_vec(),

            detect_email: true,
            detect_phone: true,
            detect_ssn: true,
            detect_date: true,

            custom_patterns: Vec::new(),
            whitelist_patterns: Vec::new(),

            ner_command: None,
            mapping_file: None,

            log_detections: true,
        }
    }
}

impl RedactorConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RedactorError::InvalidConfig {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| RedactorError::InvalidConfig {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }

    /// Default config location: `<config dir>/pii-redactor/config.json`
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("pii-redactor").join("config.json"))
    }

    /// Load from the default location, or defaults when no file exists
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allowed_categories.iter().cloned())
    }
}
