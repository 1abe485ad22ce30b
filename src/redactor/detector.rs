// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Entity sources: built-in patterns, external NER process, precomputed file

use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::config::{Category, RedactorConfig};
use super::entity::{EntitySource, EntitySpan};
use super::error::{RedactorError, Result};
use super::patterns::{compile_patterns, CompiledPatterns};

const NER_REMEDIATION: &str =
    "Install the entity recognizer used by --ner-command, or omit it to use the built-in patterns";

/// Converts increasing byte offsets to char offsets in one pass
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// `byte` must be a char boundary at or after the previous call's
    fn advance_to(&mut self, byte: usize) -> usize {
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// Detect entities in text with compiled patterns
///
/// Matches overlapping an earlier detection are dropped, as are empty and
/// whitelisted matches. Returned offsets are character offsets.
pub fn detect_entities(text: &str, patterns: &CompiledPatterns) -> Vec<EntitySpan> {
    let mut detections: Vec<EntitySpan> = Vec::new();
    // Accepted spans as char start -> char end, never overlapping
    let mut accepted: BTreeMap<usize, usize> = BTreeMap::new();

    // Use RegexSet to skip patterns with no match at all
    let matches = patterns.regex_set.matches(text);

    for pattern_idx in matches.iter() {
        let pattern = &patterns.patterns[pattern_idx];
        let mut cursor = CharCursor::new(text);

        for mat in pattern.regex.find_iter(text) {
            let value = mat.as_str();
            let start = cursor.advance_to(mat.start());
            let end = cursor.advance_to(mat.end());

            if value.is_empty() || patterns.whitelist.iter().any(|w| w.is_match(value)) {
                continue;
            }

            // Only the closest accepted span starting before `end` can overlap
            let overlaps = accepted
                .range(..end)
                .next_back()
                .is_some_and(|(_, &prev_end)| prev_end > start);
            if overlaps {
                continue;
            }

            accepted.insert(start, end);
            detections.push(EntitySpan::new(pattern.category.clone(), start, end, value));
        }
    }

    detections
}

fn log_detection_counts(source: &str, spans: &[EntitySpan]) {
    let mut counts: BTreeMap<&Category, usize> = BTreeMap::new();
    for span in spans {
        *counts.entry(&span.label).or_default() += 1;
    }
    for (category, count) in counts {
        tracing::info!(source, category = %category, count, "detected entities");
    }
}

/// Built-in regex entity source
///
/// Patterns are compiled on first use and kept for the lifetime of the
/// source.
pub struct PatternEntitySource {
    config: RedactorConfig,
    patterns: OnceCell<CompiledPatterns>,
}

impl PatternEntitySource {
    pub fn new(config: RedactorConfig) -> Self {
        Self {
            config,
            patterns: OnceCell::new(),
        }
    }

    /// Compiled patterns, compiling them if this is the first call
    pub fn patterns(&self) -> Result<&CompiledPatterns> {
        self.patterns.get_or_try_init(|| {
            let compiled = compile_patterns(&self.config)?;
            tracing::debug!(patterns = compiled.patterns.len(), "compiled entity patterns");
            Ok(compiled)
        })
    }
}

impl EntitySource for PatternEntitySource {
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let spans = detect_entities(text, self.patterns()?);
        if self.config.log_detections {
            log_detection_counts("patterns", &spans);
        }
        Ok(spans)
    }
}

/// Entity source backed by an external NER program
///
/// The program receives the text on stdin and must print a JSON array of
/// `{"label", "start", "end", "text"}` objects with character offsets.
#[derive(Debug, Clone)]
pub struct CommandEntitySource {
    program: String,
    args: Vec<String>,
    log_detections: bool,
}

impl CommandEntitySource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            log_detections: true,
        }
    }

    /// Build from `program arg...`; `None` when the command line is empty
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn with_log_detections(mut self, enabled: bool) -> Self {
        self.log_detections = enabled;
        self
    }
}

impl EntitySource for CommandEntitySource {
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        tracing::debug!(program = %self.program, "running external entity recognizer");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RedactorError::detection_unavailable(
                    format!("failed to start '{}': {}", self.program, e),
                    NER_REMEDIATION,
                )
            })?;

        // Write stdin on another thread while stdout is drained
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_string();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|e| {
            RedactorError::detection_unavailable(
                format!("failed to read output of '{}': {}", self.program, e),
                NER_REMEDIATION,
            )
        })?;

        if let Some(handle) = writer {
            // A child that exits without reading stdin is reported via its status
            let _ = handle.join();
        }

        if !output.status.success() {
            return Err(RedactorError::detection_unavailable(
                format!(
                    "'{}' exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                NER_REMEDIATION,
            ));
        }

        let spans: Vec<EntitySpan> = serde_json::from_slice(&output.stdout).map_err(|e| {
            RedactorError::detection_unavailable(
                format!("'{}' produced invalid entity JSON: {}", self.program, e),
                "The recognizer must print a JSON array of {label, start, end, text} objects",
            )
        })?;

        if self.log_detections {
            log_detection_counts("command", &spans);
        }
        Ok(spans)
    }
}

/// Entity source reading spans precomputed by an external NER run
#[derive(Debug, Clone)]
pub struct FileEntitySource {
    path: PathBuf,
}

impl FileEntitySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EntitySource for FileEntitySource {
    fn detect(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            RedactorError::detection_unavailable(
                format!("cannot read entities file {}: {}", self.path.display(), e),
                "Run the entity recognizer first, or omit --entities to use the built-in patterns",
            )
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            RedactorError::detection_unavailable(
                format!("invalid entities file {}: {}", self.path.display(), e),
                "The entities file must hold a JSON array of {label, start, end, text} objects",
            )
        })
    }
}
