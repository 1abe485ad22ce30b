// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Error types for the PII redactor

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while detecting, redacting or restoring PII
#[derive(Debug, Error)]
pub enum RedactorError {
    /// The entity source cannot be used (model missing, process failed, ...)
    #[error("entity detection unavailable: {reason}")]
    DetectionUnavailable { reason: String, remediation: String },

    /// No text was supplied on any input channel
    #[error("no input text provided")]
    EmptyInput,

    /// Reversal was requested against a mapping file that does not exist
    #[error("mapping file {} not found", path.display())]
    MappingNotFound { path: PathBuf },

    /// Mapping data does not parse into placeholder -> entry pairs
    #[error("invalid mapping data in {source_name}: {cause}")]
    MappingMalformed { source_name: String, cause: String },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration in {}: {cause}", path.display())]
    InvalidConfig { path: PathBuf, cause: String },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RedactorError {
    /// Build a `DetectionUnavailable` error
    pub fn detection_unavailable(reason: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self::DetectionUnavailable {
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }

    /// Remediation hint to show the user, if the error carries one
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::DetectionUnavailable { remediation, .. } if !remediation.is_empty() => {
                Some(remediation)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedactorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_only_for_detection_errors() {
        let err = RedactorError::detection_unavailable(
            "model not installed",
            "Install with: pip install spacy",
        );
        assert_eq!(err.remediation(), Some("Install with: pip install spacy"));
        assert_eq!(
            err.to_string(),
            "entity detection unavailable: model not installed"
        );

        assert!(RedactorError::EmptyInput.remediation().is_none());
    }

    #[test]
    fn test_mapping_not_found_message() {
        let err = RedactorError::MappingNotFound {
            path: PathBuf::from("/tmp/missing.json"),
        };
        assert_eq!(err.to_string(), "mapping file /tmp/missing.json not found");
    }
}
