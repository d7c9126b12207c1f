//! HWDB Core - hardware database submission parser and device classifier
//!
//! This crate imports hardware submissions: XML documents describing one
//! computer as a HAL device list plus summary, software and question data.
//! The implementation prioritizes:
//!
//! 1. **Strictness** - documents are schema-validated before any section is read
//! 2. **Logging** - every rejection logged with the submission key and reason
//! 3. **Idempotence** - re-importing a submission leaves the registry unchanged
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Submission processing facade
//! - `xml` - Element tree reader
//! - `validation` - Versioned schema registry and validators
//! - `values` - Typed property values
//! - `parsing` - Section parsers and the parsed submission model
//! - `consistency` - ID and HAL structure checks
//! - `devices` - Device tree and bus/real-device classification
//! - `storage` - Registry records and the lookup-or-create registry
//! - `logging` - Structured logging and warning de-duplication

pub mod consistency;
pub mod devices;
pub mod error;
pub mod logging;
pub mod parsing;
pub mod pipeline;
pub mod storage;
pub mod validation;
pub mod values;
pub mod xml;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod testing;

pub use error::{ProcessingError, SubmissionError};
pub use pipeline::processor::{ProcessingOutcome, ProcessorConfig, SubmissionProcessor};
pub use storage::registry::{DeviceRegistry, InMemoryRegistry};

/// Initialize the module-level logger
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
