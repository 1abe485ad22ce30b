// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Placeholder -> original text mapping and its JSON persistence

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::config::Category;
use super::error::{RedactorError, Result};

/// Synthetic token replacing a redacted span: `[<CATEGORY>_<N>]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholder(String);

impl Placeholder {
    /// Build the placeholder for the `sequence`-th entity of `category`
    pub fn new(category: &Category, sequence: usize) -> Self {
        Self(format!("[{}_{}]", category, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Placeholder {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Placeholder {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a placeholder stands for
///
/// Offsets are character offsets into the text that was redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub original_text: String,
    pub entity_type: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// Ordered placeholder -> entry map
///
/// Keys are unique. Entries keep the order they were inserted in, which is
/// the order placeholders were created during redaction, and serialize as a
/// JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PiiMapping {
    entries: Vec<(Placeholder, MappingEntry)>,
    // Placeholder -> position in `entries`
    index: HashMap<Placeholder, usize>,
}

impl PiiMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing the value of an existing key in place
    pub fn insert(&mut self, placeholder: Placeholder, entry: MappingEntry) {
        match self.index.get(&placeholder) {
            Some(&position) => self.entries[position].1 = entry,
            None => {
                self.index.insert(placeholder.clone(), self.entries.len());
                self.entries.push((placeholder, entry));
            }
        }
    }

    pub fn get(&self, placeholder: &str) -> Option<&MappingEntry> {
        self.index
            .get(placeholder)
            .map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Placeholder, &MappingEntry)> {
        self.entries.iter().map(|(key, entry)| (key, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PiiMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (placeholder, entry) in &self.entries {
            map.serialize_entry(placeholder, entry)?;
        }
        map.end()
    }
}

struct PiiMappingVisitor;

impl<'de> Visitor<'de> for PiiMappingVisitor {
    type Value = PiiMapping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of placeholder -> {original_text, entity_type, start_char, end_char}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<PiiMapping, A::Error> {
        let mut mapping = PiiMapping::new();
        while let Some((placeholder, entry)) = access.next_entry::<Placeholder, MappingEntry>()? {
            mapping.insert(placeholder, entry);
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for PiiMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(PiiMappingVisitor)
    }
}

/// Parse mapping JSON; `source_name` only labels the error
pub fn parse_mapping(json: &str, source_name: &str) -> Result<PiiMapping> {
    serde_json::from_str(json).map_err(|e| RedactorError::MappingMalformed {
        source_name: source_name.to_string(),
        cause: e.to_string(),
    })
}

/// Load a mapping file written by [`save_mapping`]
///
/// # Errors
/// * `MappingNotFound` if the file does not exist
/// * `MappingMalformed` if it is not a valid mapping object
pub fn load_mapping(path: &Path) -> Result<PiiMapping> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RedactorError::MappingNotFound {
            path: path.to_path_buf(),
        },
        _ => RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    parse_mapping(&contents, &path.display().to_string())
}

/// Write a mapping file as pretty-printed JSON
pub fn save_mapping(path: &Path, mapping: &PiiMapping) -> Result<()> {
    let json = serde_json::to_string_pretty(mapping)?;

    std::fs::write(path, json).map_err(|source| RedactorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), entries = mapping.len(), "saved mapping");
    Ok(())
}
