//! Schema validation module.
//!
//! Versioned submission schemas:
//! - Registry of supported versions, each with a validator and section parser
//! - Structural validator for version 1.0

pub mod schema;

pub use schema::*;
