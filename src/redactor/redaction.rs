// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Placeholder substitution for detected entities

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::config::{AllowList, Category};
use super::entity::{char_boundaries, EntitySpan};
use super::mapping::{MappingEntry, PiiMapping, Placeholder};

// Anything shaped like a placeholder, e.g. [PERSON_1]
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Za-z][A-Za-z0-9_]*_\d+\]").expect("valid placeholder regex"));

/// Output of [`redact`]
///
/// Lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub redacted_text: String,
    pub pii_mapping: PiiMapping,
    pub original_length: usize,
    pub redacted_length: usize,
    pub entity_count: usize,
}

/// Replace allow-listed entities in `input_text` with numbered placeholders
///
/// # Arguments
/// * `input_text` - Text the spans were detected in
/// * `entities` - Spans in any order, of any category
/// * `allow_list` - Categories to redact; all other spans are left in place
///
/// # Returns
/// Redacted text plus the mapping needed to restore it
///
/// Spans are numbered per category from the rightmost one leftwards, so
/// `[PERSON_1]` is the last person in the text. Spans with equal `start` are
/// ordered longest first, then by label and text. A span overlapping one
/// already numbered, or whose offsets do not match the text, is skipped.
pub fn redact(input_text: &str, entities: &[EntitySpan], allow_list: &AllowList) -> RedactionResult {
    let boundaries = char_boundaries(input_text);

    let mut candidates: Vec<(&EntitySpan, (usize, usize))> = entities
        .iter()
        .filter(|span| allow_list.contains(&span.label))
        .filter_map(|span| match span.byte_range(input_text, &boundaries) {
            Some(range) => Some((span, range)),
            None => {
                tracing::warn!(
                    category = %span.label,
                    start = span.start,
                    end = span.end,
                    "skipping entity whose offsets do not match the input"
                );
                None
            }
        })
        .collect();

    candidates.sort_by(|(a, _), (b, _)| {
        b.start
            .cmp(&a.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.text.cmp(&b.text))
    });

    let mut counters: HashMap<&Category, usize> = HashMap::new();
    let mut pii_mapping = PiiMapping::new();
    // Byte ranges with their placeholders, rightmost first
    let mut replacements: Vec<(usize, usize, Placeholder)> = Vec::new();
    let mut leftmost_start = usize::MAX;

    for (span, (byte_start, byte_end)) in candidates {
        if span.end > leftmost_start {
            tracing::warn!(
                category = %span.label,
                start = span.start,
                end = span.end,
                "skipping entity overlapping another entity"
            );
            continue;
        }

        let counter = counters.entry(&span.label).or_insert(0);
        *counter += 1;
        let placeholder = Placeholder::new(&span.label, *counter);

        pii_mapping.insert(
            placeholder.clone(),
            MappingEntry {
                original_text: span.text.clone(),
                entity_type: span.label.to_string(),
                start_char: span.start,
                end_char: span.end,
            },
        );
        replacements.push((byte_start, byte_end, placeholder));
        leftmost_start = span.start;
    }

    let mut redacted_text = String::with_capacity(input_text.len());
    let mut cursor = 0;
    for (byte_start, byte_end, placeholder) in replacements.iter().rev() {
        redacted_text.push_str(&input_text[cursor..*byte_start]);
        redacted_text.push_str(placeholder.as_str());
        cursor = *byte_end;
    }
    redacted_text.push_str(&input_text[cursor..]);

    let original_length = boundaries.len() - 1;
    let redacted_length = redacted_text.chars().count();
    let entity_count = pii_mapping.len();

    RedactionResult {
        redacted_text,
        pii_mapping,
        original_length,
        redacted_length,
        entity_count,
    }
}

/// Placeholder-shaped tokens present in `text`, in order of appearance
///
/// Input that already contains such tokens cannot be restored unambiguously.
pub fn find_placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// Short SHA256 fingerprint for correlating log lines without logging text
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(start: usize, end: usize, text: &str) -> EntitySpan {
        EntitySpan::new(Category::Person, start, end, text)
    }

    #[test]
    fn test_redact_empty_entities() {
        let result = redact("No PII here", &[], &AllowList::default());

        assert_eq!(result.redacted_text, "No PII here");
        assert!(result.pii_mapping.is_empty());
        assert_eq!(result.entity_count, 0);
        assert_eq!(result.original_length, result.redacted_length);
    }

    #[test]
    fn test_numbering_starts_from_rightmost() {
        let text = "Ann, Ben and Cat";
        let spans = vec![person(0, 3, "Ann"), person(5, 8, "Ben"), person(13, 16, "Cat")];

        let result = redact(text, &spans, &AllowList::default());

        assert_eq!(result.redacted_text, "[PERSON_3], [PERSON_2] and [PERSON_1]");
        assert_eq!(result.pii_mapping.get("[PERSON_1]").unwrap().original_text, "Cat");
        assert_eq!(result.pii_mapping.get("[PERSON_3]").unwrap().start_char, 0);
    }

    #[test]
    fn test_mapping_in_creation_order() {
        let text = "Ann in Rome";
        let spans = vec![person(0, 3, "Ann"), EntitySpan::new(Category::Gpe, 7, 11, "Rome")];

        let result = redact(text, &spans, &AllowList::default());
        let keys: Vec<_> = result.pii_mapping.iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(keys, vec!["[GPE_1]", "[PERSON_1]"]);
    }

    #[test]
    fn test_unlisted_category_untouched() {
        let text = "Ann paid 5 dollars";
        let spans = vec![
            person(0, 3, "Ann"),
            EntitySpan::new(Category::Other("MONEY".to_string()), 9, 18, "5 dollars"),
        ];

        let result = redact(text, &spans, &AllowList::default());

        assert_eq!(result.redacted_text, "[PERSON_1] paid 5 dollars");
        assert_eq!(result.entity_count, 1);
    }

    #[test]
    fn test_custom_allow_list() {
        let text = "Ann paid 5 dollars";
        let spans = vec![
            person(0, 3, "Ann"),
            EntitySpan::new(Category::Other("MONEY".to_string()), 9, 18, "5 dollars"),
        ];
        let allow = AllowList::new([Category::Other("MONEY".to_string())]);

        let result = redact(text, &spans, &allow);
        assert_eq!(result.redacted_text, "Ann paid [MONEY_1]");
    }

    #[test]
    fn test_equal_start_longest_span_wins() {
        let text = "New York City";
        let spans = vec![
            EntitySpan::new(Category::Gpe, 0, 8, "New York"),
            EntitySpan::new(Category::Gpe, 0, 13, "New York City"),
        ];

        let result = redact(text, &spans, &AllowList::default());

        assert_eq!(result.redacted_text, "[GPE_1]");
        assert_eq!(result.entity_count, 1);
        assert_eq!(result.pii_mapping.get("[GPE_1]").unwrap().original_text, "New York City");
    }

    #[test]
    fn test_overlap_rightmost_span_wins() {
        let text = "New York City";
        let spans = vec![
            EntitySpan::new(Category::Gpe, 0, 8, "New York"),
            EntitySpan::new(Category::Loc, 4, 13, "York City"),
        ];

        let result = redact(text, &spans, &AllowList::default());

        assert_eq!(result.redacted_text, "New [LOC_1]");
        assert_eq!(result.entity_count, 1);
    }

    #[test]
    fn test_invalid_span_skipped() {
        let text = "Ann met Ben";
        let spans = vec![person(0, 3, "Ann"), person(8, 40, "Ben")];

        let result = redact(text, &spans, &AllowList::default());
        assert_eq!(result.redacted_text, "[PERSON_1] met Ben");
    }

    #[test]
    fn test_multibyte_lengths_in_chars() {
        let text = "José à Zürich";
        let spans = vec![
            person(0, 4, "José"),
            EntitySpan::new(Category::Gpe, 7, 13, "Zürich"),
        ];

        let result = redact(text, &spans, &AllowList::default());

        assert_eq!(result.redacted_text, "[PERSON_1] à [GPE_1]");
        assert_eq!(result.original_length, 13);
        assert_eq!(result.redacted_length, 20);
    }

    #[test]
    fn test_find_placeholders() {
        let found = find_placeholders("see [PERSON_1] and [DATE_12], not [x] or [_1]");
        assert_eq!(found, vec!["[PERSON_1]", "[DATE_12]"]);
    }

    #[test]
    fn test_fingerprint() {
        let digest = fingerprint("sensitive");
        assert_eq!(digest.len(), 12);
        assert_eq!(digest, fingerprint("sensitive"));
        assert_ne!(digest, fingerprint("Sensitive"));
    }
}
