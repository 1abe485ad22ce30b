// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Restoring redacted text from a placeholder mapping

use std::borrow::Cow;
use std::path::Path;

use super::error::Result;
use super::mapping::{load_mapping, parse_mapping, PiiMapping};

/// Replace every placeholder occurrence with its original text
///
/// Placeholders are matched as literal substrings, never by offset, since
/// positions in the redacted text no longer line up with the original.
/// Returns the input unchanged (borrowed) when no placeholder occurs in it.
pub fn reverse<'a>(redacted_text: &'a str, mapping: &PiiMapping) -> Cow<'a, str> {
    let mut restored = Cow::Borrowed(redacted_text);

    for (placeholder, entry) in mapping.iter() {
        if restored.contains(placeholder.as_str()) {
            restored = Cow::Owned(restored.replace(placeholder.as_str(), &entry.original_text));
        }
    }

    restored
}

/// Restore text using mapping JSON
pub fn reverse_with_mapping_json(redacted_text: &str, json: &str, source_name: &str) -> Result<String> {
    let mapping = parse_mapping(json, source_name)?;
    Ok(reverse(redacted_text, &mapping).into_owned())
}

/// Restore text using a mapping file written during redaction
pub fn reverse_with_mapping_file(redacted_text: &str, path: &Path) -> Result<String> {
    let mapping = load_mapping(path)?;
    Ok(reverse(redacted_text, &mapping).into_owned())
}
