//! XML document reading.

pub mod element;

pub use element::*;
