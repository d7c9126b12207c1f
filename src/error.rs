//! Error types.
//!
//! Document and format errors reject a whole submission. Consistency errors
//! carry the offending IDs/UDIs so operators can diagnose the rejection.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors raised while reading or parsing a submission document.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("xml: {0}")]
    Xml(#[from] XmlError),
    #[error("the root node of a submission must be <system>, found <{0}>")]
    WrongRootTag(String),
    #[error("unsupported schema version: {0:?}")]
    UnsupportedVersion(Option<String>),
    #[error("submission does not validate against schema {version}: {} error(s)", .errors.len())]
    SchemaInvalid { version: String, errors: Vec<String> },
    #[error("missing element <{0}>")]
    MissingElement(String),
    #[error("missing attribute {attribute} in <{element}>")]
    MissingAttribute { element: String, attribute: String },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("submission too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

/// Errors raised by the XML element reader.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("{0}")]
    Syntax(String),
    #[error("document is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("elements nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("no root element")]
    Empty,
}

/// Parent/child structure errors of the HAL device list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("HAL device UDI {0} found more than once")]
    DuplicateUdi(String),
    #[error("unknown parent UDI {parent} in <device id=\"{id}\">")]
    UnknownParent { id: i64, parent: String },
    #[error("root device node found with unexpected UDI: <device id=\"{id}\" udi=\"{udi}\">")]
    UnexpectedRootUdi { id: i64, udi: String },
    #[error("two or more root devices found: {0}")]
    MultipleRoots(String),
    #[error("no root device found")]
    NoRoot,
    #[error("found HAL devices with circular parent/child relationship: {0:?}")]
    Circular(BTreeSet<String>),
}

/// Consistency violations of a parsed submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("duplicate IDs found: {0:?}")]
    DuplicateIds(BTreeSet<i64>),
    #[error("invalid ID references found: {0:?}")]
    InvalidIdReferences(BTreeSet<i64>),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Failures of the external device registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown {kind} key {key}")]
    UnknownKey { kind: &'static str, key: u64 },
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a submission was not imported.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("submission could not be parsed")]
    Unparseable,
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
