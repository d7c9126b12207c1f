//! Structured logging with submission context.
//!
//! Provides logging macros and utilities that include the submission key
//! and run id in every log message, plus per-submission warning
//! de-duplication.

pub mod structured;
pub mod warnings;

pub use structured::*;
pub use warnings::*;
