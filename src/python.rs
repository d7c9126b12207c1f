//! Python bindings.
//!
//! Submissions processed through the extension module share one in-process
//! registry, so re-importing a submission is idempotent across calls.

use lazy_static::lazy_static;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::init_logger;
use crate::pipeline::processor::SubmissionProcessor;
use crate::storage::registry::InMemoryRegistry;
use crate::validation::schema::SchemaRegistry;

lazy_static! {
    static ref REGISTRY: InMemoryRegistry = InMemoryRegistry::new();
}

/// Import one raw submission (bzip2-compressed or plain XML).
///
/// # Arguments
/// * `raw` - Submission payload
/// * `submission_key` - Key of the submission, used in logs and registry links
///
/// # Returns
/// Dict with `accepted`, `content_hash`, `registered_devices` and, for
/// rejected submissions, `failure`.
#[pyfunction]
fn process_hwdb_submission(py: Python<'_>, raw: &[u8], submission_key: String) -> PyResult<Py<PyAny>> {
    init_logger();

    let processor = SubmissionProcessor::new(&*REGISTRY);
    let outcome = processor.process(raw, &submission_key);

    let py_result = PyDict::new(py);
    py_result.set_item("submission_key", &outcome.submission_key)?;
    py_result.set_item("run_id", &outcome.run_id)?;
    py_result.set_item("accepted", outcome.accepted)?;
    py_result.set_item("content_hash", &outcome.content_hash)?;
    py_result.set_item("registered_devices", outcome.registered_devices)?;
    if let Some(failure) = &outcome.failure {
        py_result.set_item("failure", failure)?;
    }

    Ok(py_result.into())
}

/// Parse a submission without registering anything.
///
/// Returns the parsed submission as JSON, or `None` if it was rejected.
#[pyfunction]
fn parse_hwdb_submission(raw: &[u8], submission_key: String) -> PyResult<Option<String>> {
    init_logger();

    let processor = SubmissionProcessor::new(&*REGISTRY);
    match processor.parse(raw, &submission_key) {
        Some(parsed) => serde_json::to_string(&parsed)
            .map(Some)
            .map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(None),
    }
}

/// Registry content as JSON.
#[pyfunction]
fn get_registry_snapshot() -> PyResult<String> {
    REGISTRY
        .snapshot()
        .to_json()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Schema versions this build accepts.
#[pyfunction]
fn get_supported_schemas() -> PyResult<Vec<String>> {
    Ok(SchemaRegistry::default().versions())
}

/// Python module definition
#[pymodule]
fn hwdb_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(process_hwdb_submission, m)?)?;
    m.add_function(wrap_pyfunction!(parse_hwdb_submission, m)?)?;
    m.add_function(wrap_pyfunction!(get_registry_snapshot, m)?)?;
    m.add_function(wrap_pyfunction!(get_supported_schemas, m)?)?;
    Ok(())
}
