// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PII Redactor - Rust Implementation
//
// Reversible PII redaction:
// - Entity sources (built-in RegexSet patterns, external NER, precomputed spans)
// - Right-to-left placeholder numbering, output built from slices
// - Substring-based reversal from a JSON mapping

pub mod config;
pub mod detector;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod patterns;
#[cfg(feature = "python")]
pub mod python;
pub mod redaction;
pub mod reversal;

pub use config::{AllowList, Category, RedactorConfig};
pub use detector::{CommandEntitySource, FileEntitySource, PatternEntitySource};
pub use entity::{EntitySource, EntitySpan};
pub use error::{RedactorError, Result};
pub use mapping::{load_mapping, parse_mapping, save_mapping, MappingEntry, PiiMapping, Placeholder};
pub use redaction::{redact, RedactionResult};
pub use reversal::{reverse, reverse_with_mapping_file, reverse_with_mapping_json};
