// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Reversible PII redaction
// Optional PyO3 bindings behind the `python` feature

// Allow non-local definitions for PyO3 macros
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod redactor;

pub use redactor::{
    redact, reverse, AllowList, Category, EntitySource, EntitySpan, MappingEntry, PiiMapping,
    Placeholder, RedactionResult, RedactorConfig, RedactorError, Result,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module: pii_redactor
///
/// # Examples
///
/// ```python
/// from pii_redactor import PiiRedactorRust
///
/// redactor = PiiRedactorRust()
///
/// # Redact with the built-in patterns
/// result = redactor.redact("My SSN is 123-45-6789")
/// print(result["redacted_text"])  # "My SSN is [SSN_1]"
///
/// # Or with spans from an external NER model
/// spans = [{"label": "PERSON", "start": 0, "end": 5, "text": "Alice"}]
/// result = redactor.redact("Alice called", spans)
///
/// # Restore
/// print(redactor.reverse(result["redacted_text"], result["pii_mapping"]))
/// ```
#[cfg(feature = "python")]
#[pymodule]
fn pii_redactor(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    m.add_class::<redactor::python::PiiRedactorRust>()?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Reversible PII redaction with typed placeholders")?;

    Ok(())
}
