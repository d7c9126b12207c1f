//! Submission processing pipeline.
//!
//! Coordinates the import of one raw submission:
//! - Decompression
//! - Parsing and schema validation
//! - Consistency checks
//! - Device classification and registration

pub mod context;
pub mod decompress;
pub mod processor;

pub use context::*;
pub use decompress::*;
pub use processor::*;
