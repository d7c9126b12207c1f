//! Storage module.
//!
//! Registry records and the lookup-or-create registry the processor writes
//! device data to.

pub mod models;
pub mod registry;

pub use models::*;
pub use registry::*;
