// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Entity span contract shared by entity sources and the redaction engine

use serde::{Deserialize, Serialize};

use super::config::Category;
use super::error::Result;

/// A labelled run of the input text
///
/// `start` and `end` are character offsets (not byte offsets) into the text
/// the span was detected in, and `text` is the substring they delimit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: Category,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl EntitySpan {
    pub fn new(label: Category, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            label,
            start,
            end,
            text: text.into(),
        }
    }

    /// Byte range of this span in `text`, if the span is valid for it
    ///
    /// `boundaries` must come from [`char_boundaries`] over the same text.
    /// Returns `None` when the offsets are out of order or out of range, or
    /// when the stored `text` differs from the substring they delimit.
    pub fn byte_range(&self, text: &str, boundaries: &[usize]) -> Option<(usize, usize)> {
        if self.start > self.end || self.end >= boundaries.len() {
            return None;
        }
        let (start, end) = (boundaries[self.start], boundaries[self.end]);
        (text[start..end] == self.text).then_some((start, end))
    }

    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Byte offset of every character boundary in `text`
///
/// Index `i` holds the byte offset of character `i`; the final element is
/// `text.len()`, so the result has `char_count + 1` entries.
pub fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Anything able to find PII entities in text
///
/// Implementations own whatever model or process state they need; callers
/// hold the source for as long as they want that state to live.
pub trait EntitySource {
    /// Detect entities in `text`
    ///
    /// Every returned span must satisfy `start <= end` and
    /// `span.text == text[start..end]` in character offsets.
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

impl<T: EntitySource + ?Sized> EntitySource for Box<T> {
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        (**self).detect(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_boundaries_multibyte() {
        let boundaries = char_boundaries("né!");
        assert_eq!(boundaries, vec![0, 1, 3, 4]);
        assert_eq!(char_boundaries(""), vec![0]);
    }

    #[test]
    fn test_byte_range_valid_span() {
        let text = "Zoë lives in Köln";
        let boundaries = char_boundaries(text);
        let span = EntitySpan::new(Category::Gpe, 13, 17, "Köln");

        let (start, end) = span.byte_range(text, &boundaries).unwrap();
        assert_eq!(&text[start..end], "Köln");
    }

    #[test]
    fn test_byte_range_rejects_invalid_spans() {
        let text = "Alice met Bob";
        let boundaries = char_boundaries(text);

        let out_of_range = EntitySpan::new(Category::Person, 10, 14, "Bob");
        assert!(out_of_range.byte_range(text, &boundaries).is_none());

        let reversed = EntitySpan::new(Category::Person, 5, 0, "");
        assert!(reversed.byte_range(text, &boundaries).is_none());

        let wrong_text = EntitySpan::new(Category::Person, 0, 5, "Alicia");
        assert!(wrong_text.byte_range(text, &boundaries).is_none());
    }

    #[test]
    fn test_overlaps() {
        let a = EntitySpan::new(Category::Person, 0, 5, "Alice");
        let b = EntitySpan::new(Category::Org, 3, 8, "ce me");
        let c = EntitySpan::new(Category::Org, 5, 8, " me");
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_span_deserializes_from_ner_output() {
        let span: EntitySpan =
            serde_json::from_str(r#"{"label": "PERSON", "start": 0, "end": 5, "text": "Alice"}"#)
                .unwrap();
        assert_eq!(span, EntitySpan::new(Category::Person, 0, 5, "Alice"));
    }
}
