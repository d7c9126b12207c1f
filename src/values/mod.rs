//! Typed property values.
//!
//! Decodes the small dynamically-typed value language used by
//! `<property>` and `<value>` nodes.

pub mod decode;
pub mod typed_value;

pub use decode::*;
pub use typed_value::*;
