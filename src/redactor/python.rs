// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PyO3 bindings for the redactor

use pyo3::exceptions::{PyFileNotFoundError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::config::{AllowList, Category, RedactorConfig};
use super::detector::PatternEntitySource;
use super::entity::{EntitySource, EntitySpan};
use super::error::RedactorError;
use super::mapping::{MappingEntry, PiiMapping};
use super::redaction::redact;
use super::reversal::reverse;

impl From<RedactorError> for PyErr {
    fn from(err: RedactorError) -> Self {
        match err {
            RedactorError::MappingNotFound { .. } => PyFileNotFoundError::new_err(err.to_string()),
            RedactorError::MappingMalformed { .. }
            | RedactorError::EmptyInput
            | RedactorError::InvalidPattern { .. }
            | RedactorError::InvalidConfig { .. } => PyValueError::new_err(err.to_string()),
            RedactorError::DetectionUnavailable { .. }
            | RedactorError::Serialization(_)
            | RedactorError::Io { .. } => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

/// Redactor exposed to Python
///
/// # Example (Python)
/// ```python
/// from pii_redactor import PiiRedactorRust
///
/// redactor = PiiRedactorRust({"detect_date": False})
/// result = redactor.redact("Mail me at jane@corp.io")
/// print(result["redacted_text"])  # "Mail me at [EMAIL_1]"
///
/// restored = redactor.reverse(result["redacted_text"], result["pii_mapping"])
/// ```
#[pyclass]
pub struct PiiRedactorRust {
    source: PatternEntitySource,
    allow_list: AllowList,
}

#[pymethods]
impl PiiRedactorRust {
    /// Create a redactor from an optional config dict
    ///
    /// Keys mirror the JSON config file (`allowed_categories`,
    /// `detect_email`, `custom_patterns`, ...).
    #[new]
    #[pyo3(signature = (config_dict=None))]
    pub fn new(py: Python<'_>, config_dict: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config_dict {
            Some(dict) => {
                let json: String = py.import("json")?.call_method1("dumps", (dict,))?.extract()?;
                serde_json::from_str::<RedactorConfig>(&json)
                    .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))?
            }
            None => RedactorConfig::default(),
        };

        let allow_list = config.allow_list();
        let source = PatternEntitySource::new(config);
        // Surface bad patterns at construction rather than on first use
        source.patterns()?;

        Ok(Self { source, allow_list })
    }

    /// Detect entities with the built-in patterns
    ///
    /// Returns a list of `{"label", "start", "end", "text"}` dicts.
    pub fn detect(&self, py: Python<'_>, text: &str) -> PyResult<Py<PyAny>> {
        let spans = self.source.detect(text)?;
        Ok(spans_to_py(py, &spans)?.into_any().unbind())
    }

    /// Redact text
    ///
    /// # Arguments
    /// * `text` - Text to redact
    /// * `entities` - Optional list of span dicts from an external NER;
    ///   the built-in patterns are used when omitted
    ///
    /// # Returns
    /// Dict with `redacted_text`, `pii_mapping`, `original_length`,
    /// `redacted_length` and `entity_count`
    #[pyo3(signature = (text, entities=None))]
    pub fn redact(
        &self,
        py: Python<'_>,
        text: &str,
        entities: Option<&Bound<'_, PyList>>,
    ) -> PyResult<Py<PyAny>> {
        let spans = match entities {
            Some(list) => py_list_to_spans(list)?,
            None => self.source.detect(text)?,
        };

        let result = redact(text, &spans, &self.allow_list);

        let py_dict = PyDict::new(py);
        py_dict.set_item("redacted_text", &result.redacted_text)?;
        py_dict.set_item("pii_mapping", mapping_to_py(py, &result.pii_mapping)?)?;
        py_dict.set_item("original_length", result.original_length)?;
        py_dict.set_item("redacted_length", result.redacted_length)?;
        py_dict.set_item("entity_count", result.entity_count)?;
        Ok(py_dict.into_any().unbind())
    }

    /// Restore redacted text from a mapping dict
    pub fn reverse(&self, text: &str, mapping: &Bound<'_, PyDict>) -> PyResult<String> {
        let mapping = py_dict_to_mapping(mapping)?;
        Ok(reverse(text, &mapping).into_owned())
    }
}

fn spans_to_py<'py>(py: Python<'py>, spans: &[EntitySpan]) -> PyResult<Bound<'py, PyList>> {
    let py_list = PyList::empty(py);
    for span in spans {
        let item = PyDict::new(py);
        item.set_item("label", span.label.as_str())?;
        item.set_item("start", span.start)?;
        item.set_item("end", span.end)?;
        item.set_item("text", &span.text)?;
        py_list.append(item)?;
    }
    Ok(py_list)
}

fn py_list_to_spans(list: &Bound<'_, PyList>) -> PyResult<Vec<EntitySpan>> {
    let mut spans = Vec::with_capacity(list.len());
    for item in list.iter() {
        let dict = item.downcast::<PyDict>()?;
        let label: String = required(dict, "label")?.extract()?;
        spans.push(EntitySpan::new(
            Category::from_label(&label),
            required(dict, "start")?.extract()?,
            required(dict, "end")?.extract()?,
            required(dict, "text")?.extract::<String>()?,
        ));
    }
    Ok(spans)
}

fn mapping_to_py<'py>(py: Python<'py>, mapping: &PiiMapping) -> PyResult<Bound<'py, PyDict>> {
    let py_dict = PyDict::new(py);
    for (placeholder, entry) in mapping.iter() {
        let item = PyDict::new(py);
        item.set_item("original_text", &entry.original_text)?;
        item.set_item("entity_type", &entry.entity_type)?;
        item.set_item("start_char", entry.start_char)?;
        item.set_item("end_char", entry.end_char)?;
        py_dict.set_item(placeholder.as_str(), item)?;
    }
    Ok(py_dict)
}

fn py_dict_to_mapping(dict: &Bound<'_, PyDict>) -> PyResult<PiiMapping> {
    let mut mapping = PiiMapping::new();
    for (key, value) in dict.iter() {
        let placeholder: String = key.extract()?;
        let entry = value.downcast::<PyDict>().map_err(|_| {
            PyValueError::new_err(format!("Mapping entry for {} is not a dict", placeholder))
        })?;
        mapping.insert(
            placeholder.as_str().into(),
            MappingEntry {
                original_text: required(entry, "original_text")?.extract()?,
                entity_type: required(entry, "entity_type")?.extract()?,
                start_char: required(entry, "start_char")?.extract()?,
                end_char: required(entry, "end_char")?.extract()?,
            },
        );
    }
    Ok(mapping)
}

fn required<'py>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<Bound<'py, PyAny>> {
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing '{}' field", key)))
}
