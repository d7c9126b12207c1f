//! Submission parsing.
//!
//! Turns a validated submission document into a `ParsedSubmission`:
//! - `sections` - summary, hardware and software sections
//! - `questions` - the questions section
//! - `timestamp` - timestamp attribute parsing
//! - `submission` - the orchestrating parser

pub mod model;
pub mod questions;
pub mod sections;
pub mod submission;
pub mod timestamp;

pub use model::*;
pub use submission::*;
