// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Regex pattern compilation for the built-in entity source
// Uses RegexSet to find which patterns match before running each one

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder, RegexSet};

use super::config::{Category, RedactorConfig};
use super::error::{RedactorError, Result};

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub category: Category,
    pub regex: Regex,
    pub description: String,
}

/// All compiled patterns with RegexSet for parallel matching
#[derive(Debug)]
pub struct CompiledPatterns {
    pub regex_set: RegexSet,
    pub patterns: Vec<CompiledPattern>,
    pub whitelist: Vec<Regex>,
}

/// Pattern definitions (pattern, description)
type PatternDef = (&'static str, &'static str);

// SSN patterns
static SSN_PATTERNS: Lazy<Vec<PatternDef>> = Lazy::new(|| {
    vec![(
        r"\b\d{3}-\d{2}-\d{4}\b",
        "US Social Security Number",
    )]
});

// Email patterns
static EMAIL_PATTERNS: Lazy<Vec<PatternDef>> = Lazy::new(|| {
    vec![(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "Email address",
    )]
});

// Phone patterns (US and international)
static PHONE_PATTERNS: Lazy<Vec<PatternDef>> = Lazy::new(|| {
    vec![
        (
            r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b",
            "US phone number",
        ),
        (r"\+[1-9]\d{9,14}\b", "International phone number"),
    ]
});

// Date patterns
static DATE_PATTERNS: Lazy<Vec<PatternDef>> = Lazy::new(|| {
    vec![
        (
            r"\b(?:0?[1-9]|1[0-2])[-/](?:0?[1-9]|[12]\d|3[01])[-/](?:19|20)\d{2}\b",
            "Date in MM/DD/YYYY format",
        ),
        (
            r"\b(?:19|20)\d{2}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])\b",
            "ISO 8601 date",
        ),
        (
            r"\b(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.? (?:[12]\d|3[01]|0?[1-9])(?:st|nd|rd|th)?(?:,? (?:19|20)\d{2})?\b",
            "Month name date",
        ),
    ]
});

fn build_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RedactorError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Compile patterns based on configuration
///
/// Patterns are kept in priority order: SSN, email, phone, date, then
/// custom patterns. Earlier patterns win when matches overlap.
pub fn compile_patterns(config: &RedactorConfig) -> Result<CompiledPatterns> {
    let mut pattern_strings = Vec::new();
    let mut patterns = Vec::new();

    // Helper macro to add patterns with case-insensitive matching
    macro_rules! add_patterns {
        ($enabled:expr, $category:expr, $pattern_list:expr) => {
            if $enabled {
                for (pattern, description) in $pattern_list.iter() {
                    pattern_strings.push(format!("(?i){}", pattern));
                    patterns.push(CompiledPattern {
                        category: $category,
                        regex: build_regex(pattern)?,
                        description: description.to_string(),
                    });
                }
            }
        };
    }

    add_patterns!(config.detect_ssn, Category::Ssn, &*SSN_PATTERNS);
    add_patterns!(config.detect_email, Category::Email, &*EMAIL_PATTERNS);
    add_patterns!(config.detect_phone, Category::Phone, &*PHONE_PATTERNS);
    add_patterns!(config.detect_date, Category::Date, &*DATE_PATTERNS);

    for custom in config.custom_patterns.iter().filter(|c| c.enabled) {
        pattern_strings.push(format!("(?i){}", custom.pattern));
        patterns.push(CompiledPattern {
            category: custom.category.clone(),
            regex: build_regex(&custom.pattern)?,
            description: custom.description.clone(),
        });
    }

    // Handle empty pattern set gracefully (all detectors disabled)
    let regex_set = if pattern_strings.is_empty() {
        RegexSet::empty()
    } else {
        RegexSet::new(&pattern_strings).map_err(|source| RedactorError::InvalidPattern {
            pattern: pattern_strings.join(" | "),
            source,
        })?
    };

    let whitelist = config
        .whitelist_patterns
        .iter()
        .map(|pattern| build_regex(pattern))
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledPatterns {
        regex_set,
        patterns,
        whitelist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redactor::config::CustomPattern;

    fn matching_categories(compiled: &CompiledPatterns, text: &str) -> Vec<Category> {
        compiled
            .regex_set
            .matches(text)
            .into_iter()
            .map(|idx| compiled.patterns[idx].category.clone())
            .collect()
    }

    #[test]
    fn test_compile_patterns() {
        let compiled = compile_patterns(&RedactorConfig::default()).unwrap();

        assert!(!compiled.patterns.is_empty());
        assert_eq!(compiled.patterns.len(), compiled.regex_set.len());
        assert!(compiled.whitelist.is_empty());
    }

    #[test]
    fn test_all_disabled_gives_empty_set() {
        let config = RedactorConfig {
            detect_email: false,
            detect_phone: false,
            detect_ssn: false,
            detect_date: false,
            ..Default::default()
        };
        let compiled = compile_patterns(&config).unwrap();

        assert!(compiled.patterns.is_empty());
        assert!(!compiled.regex_set.is_match("123-45-6789"));
    }

    #[test]
    fn test_ssn_pattern() {
        let compiled = compile_patterns(&RedactorConfig::default()).unwrap();
        assert!(matching_categories(&compiled, "My SSN is 123-45-6789").contains(&Category::Ssn));
    }

    #[test]
    fn test_email_pattern() {
        let compiled = compile_patterns(&RedactorConfig::default()).unwrap();
        let text = "Contact me at john.doe@example.com";
        assert!(matching_categories(&compiled, text).contains(&Category::Email));
    }

    #[test]
    fn test_date_patterns() {
        let compiled = compile_patterns(&RedactorConfig::default()).unwrap();
        for text in ["on 03/14/2024", "on 2024-03-14", "on June 1, 2024", "on june 1"] {
            assert!(
                matching_categories(&compiled, text).contains(&Category::Date),
                "no date match in {text:?}"
            );
        }
    }

    #[test]
    fn test_custom_pattern_category() {
        let config = RedactorConfig {
            custom_patterns: vec![CustomPattern {
                pattern: r"\bEMP-\d{5}\b".to_string(),
                category: Category::Other("EMPLOYEE_ID".to_string()),
                description: "Employee id".to_string(),
                enabled: true,
            }],
            ..Default::default()
        };
        let compiled = compile_patterns(&config).unwrap();

        assert!(matching_categories(&compiled, "badge emp-12345")
            .contains(&Category::Other("EMPLOYEE_ID".to_string())));
    }

    #[test]
    fn test_invalid_whitelist_pattern() {
        let config = RedactorConfig {
            whitelist_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let err = compile_patterns(&config).unwrap_err();
        assert!(matches!(err, RedactorError::InvalidPattern { .. }));
    }
}
